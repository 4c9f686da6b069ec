//! Debug logging of a query run never names the subject.

use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use sdtm_cli::logging::{LogConfig, LogFormat, init_logging_with_writer};
use sdtm_cli::session::{SessionOptions, open_study, parse_request};
use tempfile::TempDir;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn debug_logs_omit_subject_identifier() {
    let logs = CapturedLogs::default();
    let config = LogConfig {
        use_env_filter: false,
        with_ansi: false,
        ..LogConfig::default()
    }
    .with_level(LevelFilter::DEBUG)
    .with_format(LogFormat::Compact);
    init_logging_with_writer(&config, logs.clone());

    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("dm.csv"),
        "USUBJID,RFSTDTC,RFENDTC\nXK-4711,2024-01-15,2024-04-30\n",
    )
    .expect("write dm");
    fs::write(
        dir.path().join("pr.csv"),
        "USUBJID,PRDECOD,PRCAT,PRINDC,PRSTDTC,PRENDTC,PRSTDY,PRENDY\n\
         XK-4711,ECG,CARDIAC,MONITORING,2024-02-20,2024-02-20,37,37\n",
    )
    .expect("write pr");

    let engine = open_study(dir.path(), &SessionOptions::default()).expect("open study");
    let request =
        parse_request(r#"{"ModuleType": 3, "Usubject": "XK-4711", "QuestionType": "study"}"#)
            .expect("request");
    let result = engine.run_request(&request).expect("query");
    assert!(result.retrieval_expression.contains("XK-4711"));

    let text = logs.text();
    assert!(text.contains("resolving query"), "debug events captured: {text}");
    assert!(text.contains("query resolved"));
    assert!(!text.contains("XK-4711"), "subject leaked into logs: {text}");
}

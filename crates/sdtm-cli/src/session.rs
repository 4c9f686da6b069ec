//! Opening a study folder as a query engine.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use sdtm_ingest::StudyStore;
use sdtm_query::{EngineConfig, QueryEngine, QueryRequest};

/// Engine settings taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions<'a> {
    pub config: Option<&'a Path>,
    pub project: Option<&'a str>,
    pub as_of: Option<NaiveDate>,
}

/// Loads the configuration, applies command-line overrides, and loads the
/// study folder under the resulting schema.
///
/// Without a project from either source the folder name is used.
pub fn open_study(
    study_folder: &Path,
    options: &SessionOptions<'_>,
) -> Result<QueryEngine<StudyStore>> {
    let mut config = match options.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(project) = options.project {
        config.project = project.to_string();
    }
    if config.project.trim().is_empty() {
        config.project = folder_project(study_folder);
    }
    if options.as_of.is_some() {
        config.as_of = options.as_of;
    }

    let store = StudyStore::load(study_folder, config.schema())
        .with_context(|| format!("load study {}", study_folder.display()))?;
    tracing::info!(
        schema = store.schema(),
        tables = %store.tables().join(","),
        "study loaded"
    );
    Ok(QueryEngine::new(store, config))
}

fn folder_project(study_folder: &Path) -> String {
    study_folder
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.split(['_', '-', ' ']).next().unwrap_or(name))
        .filter(|name| !name.is_empty())
        .unwrap_or("STUDY")
        .to_string()
}

/// Parses a JSON request body.
pub fn parse_request(body: &str) -> Result<QueryRequest> {
    if body.trim().is_empty() {
        bail!("empty request body");
    }
    serde_json::from_str(body).context("parse request JSON")
}

/// Parses `COLUMN=VALUE[,VALUE...]`.
pub fn parse_within(spec: &str) -> Result<(String, Vec<String>)> {
    let Some((column, values)) = spec.split_once('=') else {
        bail!("expected COLUMN=VALUES, got '{spec}'");
    };
    let column = column.trim();
    if column.is_empty() {
        bail!("missing column in '{spec}'");
    }
    Ok((column.to_uppercase(), sdtm_query::split_list(values)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_from_folder_name() {
        assert_eq!(folder_project(Path::new("/data/P0042_sdtm")), "P0042");
        assert_eq!(folder_project(Path::new("/")), "STUDY");
    }

    #[test]
    fn test_parse_within() {
        let (column, values) = parse_within("cmcat=ANALGESIC, ANTIBIOTIC").unwrap();
        assert_eq!(column, "CMCAT");
        assert_eq!(values, vec!["ANALGESIC", "ANTIBIOTIC"]);
        assert!(parse_within("CMCAT").is_err());
    }

    #[test]
    fn test_parse_request_rejects_blank() {
        assert!(parse_request("  ").is_err());
        let request = parse_request(
            r#"{"ModuleType": 6, "Usubject": "01-001", "QuestionType": "study_discontinuation"}"#,
        )
        .unwrap();
        assert_eq!(request.module_type, 6);
    }
}

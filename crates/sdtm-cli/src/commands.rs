use std::io::{self, Read};

use anyhow::{Context, Result};
use tracing::{debug, info_span};

use sdtm_cli::logging::redact_value;
use sdtm_cli::output::{modules_table, render_result_json, render_result_text, values_text};
use sdtm_cli::session::{SessionOptions, open_study, parse_request, parse_within};
use sdtm_query::QueryRequest;

use crate::cli::{OutputFormatArg, QueryArgs, StudyArgs, SubjectsArgs, ValuesArgs};

fn session_options(study: &StudyArgs) -> SessionOptions<'_> {
    SessionOptions {
        config: study.config.as_deref(),
        project: study.project.as_deref(),
        as_of: study.as_of,
    }
}

fn request_from_args(args: &QueryArgs) -> Result<QueryRequest> {
    if let Some(body) = &args.request {
        let body = if body == "-" {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("read request from stdin")?;
            buffer
        } else {
            body.clone()
        };
        return parse_request(&body);
    }

    Ok(QueryRequest {
        module_type: args.module.unwrap_or_default(),
        subject: args.subject.clone().unwrap_or_default(),
        question_type: args.mode.clone().unwrap_or_default(),
        anchor_start: args.start.clone(),
        anchor_end: args.end.clone(),
        days: args.days,
        category: args.category.clone(),
        indication: args.indication.clone(),
        tests: args.tests.clone(),
        test_category: args.test_category.clone(),
    })
}

pub fn run_query(args: &QueryArgs) -> Result<()> {
    let request = request_from_args(args)?;
    let span = info_span!(
        "query",
        module = request.module_type,
        mode = %request.question_type,
        subject = redact_value(&request.subject)
    );
    let _guard = span.enter();

    let engine = open_study(&args.study.study_folder, &session_options(&args.study))?;
    let result = engine.run_request(&request)?;
    debug!(rows = result.result.rows().len(), "query complete");

    match args.format {
        OutputFormatArg::Table => println!("{}", render_result_text(&result)),
        OutputFormatArg::Json => {
            println!("{}", render_result_json(&result).context("serialize result")?);
        }
    }
    Ok(())
}

pub fn run_modules() -> Result<()> {
    println!("{}", modules_table());
    Ok(())
}

pub fn run_values(args: &ValuesArgs) -> Result<()> {
    let within = args.within.as_deref().map(parse_within).transpose()?;
    let engine = open_study(&args.study.study_folder, &session_options(&args.study))?;
    let outcome = engine.candidate_values(
        &args.subject,
        &args.table,
        &args.field,
        within
            .as_ref()
            .map(|(column, values)| (column.as_str(), values.as_slice())),
    )?;
    println!("{}", values_text(&outcome));
    Ok(())
}

pub fn run_subjects(args: &SubjectsArgs) -> Result<()> {
    let engine = open_study(&args.study.study_folder, &session_options(&args.study))?;
    let tables: Vec<&str> = args.tables.iter().map(String::as_str).collect();
    let subjects = engine.access().subjects(&tables)?;
    for subject in subjects {
        println!("{subject}");
    }
    Ok(())
}

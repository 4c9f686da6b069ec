//! Placeholder value lookup and study loading.

mod common;

use std::fs;

use common::engine;
use sdtm_ingest::StudyStore;
use sdtm_query::{
    CategoryFilterOutcome, EngineConfig, NO_CATEGORIES, NO_INDICATIONS, QueryEngine,
    QueryRequest,
};
use tempfile::TempDir;

#[test]
fn categories_are_distinct_and_sorted() {
    let values = engine()
        .candidate_values("01-001", "CM", "CMCAT", None)
        .expect("values");
    assert_eq!(
        values,
        CategoryFilterOutcome::Values(vec![
            "ANALGESIC".to_string(),
            "ANTIBIOTIC".to_string(),
            "ANTIDIABETIC".to_string(),
        ])
    );
}

#[test]
fn indications_follow_chosen_categories() {
    let chosen = vec!["analgesic".to_string()];
    let values = engine()
        .candidate_values("01-001", "cm", "cmindc", Some(("CMCAT", &chosen)))
        .expect("values");
    assert_eq!(values.into_values(), vec!["HEADACHE", "PAIN"]);
}

#[test]
fn subject_without_records_gets_sentinel() {
    let engine = engine();
    let categories = engine
        .candidate_values("01-003", "CM", "CMCAT", None)
        .expect("values");
    assert_eq!(
        categories,
        CategoryFilterOutcome::Sentinel(NO_CATEGORIES.to_string())
    );

    let indications = engine
        .candidate_values("01-003", "PR", "PRINDC", None)
        .expect("values");
    assert_eq!(indications.into_values(), vec![NO_INDICATIONS]);
}

#[test]
fn unknown_table_is_a_data_access_error() {
    let err = engine()
        .candidate_values("01-001", "MH", "MHCAT", None)
        .unwrap_err();
    assert_eq!(err.kind(), sdtm_query::ErrorKind::DataAccess);
}

#[test]
fn engine_reads_a_study_folder() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("dm.csv"),
        "USUBJID,RFSTDTC,RFENDTC\n01-001,2024-01-15,2024-04-30\n",
    )
    .expect("write dm");
    fs::write(
        dir.path().join("ds.csv"),
        "USUBJID,DSSCAT,DSTERM,DSDECOD,DSSTDTC,DSSTDY\n\
         01-001,END OF STUDY,COMPLETED,COMPLETED,2024-04-30,107\n",
    )
    .expect("write ds");

    let config = EngineConfig::new("P02", "SDTM");
    let store = StudyStore::load(dir.path(), config.schema()).expect("load");
    let engine = QueryEngine::new(store, config);

    let request: QueryRequest = serde_json::from_str(
        r#"{"ModuleType": 6, "Usubject": "01-001", "QuestionType": "study_discontinuation"}"#,
    )
    .expect("request");
    let result = engine.run_request(&request).expect("query");

    assert!(result.retrieval_expression.contains("FROM P02_sdtm.DS"));
    assert_eq!(result.result.rows().len(), 1);
    assert_eq!(
        serde_json::to_value(&result.result).expect("json")[0]["Study Day of Start of Disposition Event (DSSTDY)"],
        serde_json::json!(107)
    );
}

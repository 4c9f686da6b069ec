//! Shared study fixture for query tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use polars::prelude::df;
use sdtm_ingest::StudyStore;
use sdtm_query::{EngineConfig, QueryEngine};

pub const SCHEMA: &str = "P01_sdtm";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Two subjects: 01-001 with complete records in every domain, 01-002 with
/// no reference end date and no exposure.
pub fn study_store() -> StudyStore {
    let dm = df! {
        "USUBJID" => ["01-001", "01-002"],
        "RFSTDTC" => [Some("2024-01-15"), Some("2024-02-01")],
        "RFENDTC" => [Some("2024-04-30"), None],
    }
    .expect("dm");

    let cm = df! {
        "USUBJID" => ["01-001", "01-001", "01-001", "01-001", "01-002"],
        "CMTRT" => ["Aspirin", "Amoxicillin", "Ibuprofen", "Metformin", "Paracetamol"],
        "CMDECOD" => ["ASPIRIN", "AMOXICILLIN", "IBUPROFEN", "METFORMIN", "PARACETAMOL"],
        "CMCAT" => ["ANALGESIC", "ANTIBIOTIC", "ANALGESIC", "ANTIDIABETIC", "ANALGESIC"],
        "CMINDC" => ["HEADACHE", "INFECTION", "PAIN", "DIABETES", "FEVER"],
        "CMDOSE" => [100i64, 500, 400, 850, 500],
        "CMDOSU" => ["mg", "mg", "mg", "mg", "mg"],
        "CMSTDTC" => [
            Some("2024-01-05"),
            Some("2024-01-12"),
            Some("2024-01-18T09:00"),
            Some("2023-06-01"),
            Some("2024-01-15"),
        ],
        "CMENDTC" => [
            Some("2024-01-25"),
            Some("2024-01-19"),
            None,
            Some("2023-11-30"),
            Some("2024-01-20"),
        ],
    }
    .expect("cm");

    let ae = df! {
        "USUBJID" => ["01-001", "01-001", "01-001", "01-001"],
        "AEDECOD" => ["Headache", "Headache", "Nausea", "Rash"],
        "AETOXGR" => [1i64, 2, 1, 2],
        "AESTDTC" => ["2024-03-10", "2024-03-15", "2024-03-20", "2024-02-01T10:00"],
        "AESTDY" => [56i64, 61, 66, 18],
        "AEENDY" => [57i64, 62, 68, 25],
    }
    .expect("ae");

    let pr = df! {
        "USUBJID" => ["01-001", "01-001", "01-001", "01-001", "01-002"],
        "PRDECOD" => ["CHEST X-RAY", "BIOPSY", "ECG", "MRI", "ECG"],
        "PRCAT" => ["IMAGING", "SURGICAL", "CARDIAC", "IMAGING", "CARDIAC"],
        "PRINDC" => ["SCREENING", "DIAGNOSIS", "MONITORING", "FOLLOW-UP", "MONITORING"],
        "PRSTDTC" => ["2024-01-10", "2024-01-15", "2024-02-20", "2024-05-10", "2025-01-01"],
        "PRENDTC" => ["2024-01-10", "2024-01-15", "2024-02-20", "2024-05-10", "2025-01-01"],
        "PRSTDY" => [-5i64, 1, 37, 117, 336],
        "PRENDY" => [-5i64, 1, 37, 117, 336],
    }
    .expect("pr");

    let ds = df! {
        "USUBJID" => ["01-001", "01-001"],
        "DSSCAT" => ["END OF TREATMENT", "PROTOCOL MILESTONE"],
        "DSTERM" => ["ADVERSE EVENT", "INFORMED CONSENT OBTAINED"],
        "DSDECOD" => ["ADVERSE EVENT", "INFORMED CONSENT OBTAINED"],
        "DSSTDTC" => ["2024-04-30", "2024-01-02"],
        "DSSTDY" => [107i64, -13],
    }
    .expect("ds");

    let ex = df! {
        "USUBJID" => ["01-001", "01-001", "01-001", "01-001"],
        "EXTRT" => ["DRUG A", "DRUG A", "DRUG A", "DRUG B"],
        "EXDOSE" => [10i64, 10, 5, 20],
        "EXDOSU" => ["mg", "mg", "mg", "mg"],
        "EXDOSFRQ" => ["QD", "QD", "QD", "BID"],
        "EXSTDTC" => ["2024-01-20", "2024-01-15T08:00", "2024-02-15", "2024-03-01"],
        "EXENDTC" => ["2024-02-14", "2024-01-19", "2024-04-30", "2024-03-31"],
        "EXSTDY" => [6i64, 1, 32, 47],
        "EXENDY" => [31i64, 5, 107, 77],
        "EXADJ" => [None, None, Some("Dose reduced due to AE"), Some("Dose held")],
    }
    .expect("ex");

    let lb = df! {
        "USUBJID" => ["01-001", "01-001", "01-001"],
        "LBTEST" => ["Alanine Aminotransferase", "Alanine Aminotransferase", "Hemoglobin"],
        "LBCAT" => ["CHEMISTRY", "CHEMISTRY", "HEMATOLOGY"],
        "LBSTRESC" => ["30", "42", "13.1"],
        "LBSTRESU" => ["U/L", "U/L", "g/dL"],
        "LBSTNRLO" => [7.0, 7.0, 12.004],
        "LBSTNRHI" => [55.456, 55.456, 17.5],
        "LBDTC" => ["2024-01-10", "2024-02-10T07:45", "2024-01-10"],
    }
    .expect("lb");

    let vs = df! {
        "USUBJID" => ["01-001", "01-001", "01-001"],
        "VSTEST" => ["Pulse Rate", "Pulse Rate", "Weight"],
        "VSSTRESN" => [70.0, 76.0, 80.5],
        "VSSTRESU" => ["beats/min", "beats/min", "kg"],
        "VSDTC" => ["2024-03-12", "2024-03-17", "2024-03-14"],
        "VSDY" => [58i64, 63, 60],
    }
    .expect("vs");

    StudyStore::new(SCHEMA)
        .with_frame("DM", dm)
        .with_frame("CM", cm)
        .with_frame("AE", ae)
        .with_frame("PR", pr)
        .with_frame("DS", ds)
        .with_frame("EX", ex)
        .with_frame("LB", lb)
        .with_frame("VS", vs)
}

pub fn engine() -> QueryEngine<StudyStore> {
    let mut config = EngineConfig::new("P01", "sdtm");
    config.as_of = Some(date(2024, 6, 30));
    QueryEngine::new(study_store(), config)
}

/// One subject, 02-001, whose demographics row has a blank RFSTDTC.
pub fn blank_reference_start_engine() -> QueryEngine<StudyStore> {
    let dm = df! {
        "USUBJID" => ["02-001"],
        "RFSTDTC" => [Some("")],
        "RFENDTC" => [Some("2024-04-30")],
    }
    .expect("dm");

    let cm = df! {
        "USUBJID" => ["02-001", "02-001", "02-001"],
        "CMTRT" => ["Aspirin", "Metformin", "Ibuprofen"],
        "CMDECOD" => ["ASPIRIN", "METFORMIN", "IBUPROFEN"],
        "CMCAT" => ["ANALGESIC", "ANTIDIABETIC", "ANALGESIC"],
        "CMINDC" => ["HEADACHE", "DIABETES", "PAIN"],
        "CMDOSE" => [100i64, 850, 400],
        "CMDOSU" => ["mg", "mg", "mg"],
        "CMSTDTC" => [Some("2024-01-05"), Some("2020-06-01"), Some("2025-03-01")],
        "CMENDTC" => [Some("2024-01-25"), Some("2020-11-30"), None],
    }
    .expect("cm");

    let pr = df! {
        "USUBJID" => ["02-001", "02-001"],
        "PRDECOD" => ["CHEST X-RAY", "MRI"],
        "PRCAT" => ["IMAGING", "IMAGING"],
        "PRINDC" => ["SCREENING", "FOLLOW-UP"],
        "PRSTDTC" => ["2019-01-10", "2025-05-10"],
        "PRENDTC" => ["2019-01-10", "2025-05-10"],
        "PRSTDY" => [None::<i64>, None],
        "PRENDY" => [None::<i64>, None],
    }
    .expect("pr");

    let store = StudyStore::new(SCHEMA)
        .with_frame("DM", dm)
        .with_frame("CM", cm)
        .with_frame("PR", pr);
    let mut config = EngineConfig::new("P01", "sdtm");
    config.as_of = Some(date(2024, 6, 30));
    QueryEngine::new(store, config)
}

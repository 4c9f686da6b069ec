//! Tests for domain file discovery.

use sdtm_ingest::{STUDY_DOMAINS, discover_domain_files, list_csv_files};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "USUBJID\n01-001\n").expect("write file");
}

#[test]
fn discovers_domains_and_skips_support_files() {
    let dir = TempDir::new().expect("temp dir");
    for name in [
        "AE.csv",
        "foo_AE_bar.csv",
        "DM_LC.csv",
        "LB_PREG.csv",
        "LBCC.csv",
        "LBHM.csv",
        "DS_EOT.csv",
        "EX.CSV",
        "README.csv",
        "CODELISTS.csv",
        "SUPP_QS.csv",
    ] {
        touch(dir.path(), name);
    }

    let files = list_csv_files(dir.path()).expect("list csv");
    let discovered = discover_domain_files(&files, &STUDY_DOMAINS);

    assert_eq!(discovered.get("AE").map(Vec::len), Some(2));
    assert_eq!(discovered.get("DM").map(Vec::len), Some(1));
    assert_eq!(discovered.get("LB").map(Vec::len), Some(3));
    assert_eq!(discovered.get("DS").map(Vec::len), Some(1));
    assert_eq!(discovered.get("EX").map(Vec::len), Some(1));
    assert!(!discovered.contains_key("QS"));
    assert_eq!(discovered.values().map(Vec::len).sum::<usize>(), 8);
}

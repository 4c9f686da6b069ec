//! Locating domain datasets inside a study folder.
//!
//! A study folder holds one CSV export per SDTM domain, sometimes split into
//! several files (`LB_CHEM.csv`, `LB_HEMA.csv`). Files are matched to domains
//! by name; support files such as code lists are ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Domains a standard query can read: the seven module domains plus DM for
/// the subject reference dates.
pub const STUDY_DOMAINS: [&str; 8] = ["LB", "CM", "PR", "AE", "VS", "DS", "EX", "DM"];

/// Filename fragments that mark a file as study support material.
const SUPPORT_FILE_MARKERS: [&str; 5] = ["CODELIST", "ITEMS", "README", "METADATA", "DEFINE"];

/// Lists the CSV files directly inside `dir`, sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| IngestError::DirectoryRead {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Groups CSV files by the domain their name refers to.
///
/// Files matching no domain in `domains`, and support files, are skipped.
/// Within a domain the files keep the order of `csv_files`.
pub fn discover_domain_files(
    csv_files: &[PathBuf],
    domains: &[&str],
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for path in csv_files {
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or_default()
            .trim()
            .to_uppercase();

        if is_support_file(&stem) {
            tracing::trace!(path = %path.display(), "skipping support file");
            continue;
        }

        match match_domain(&stem, domains) {
            Some(domain) => grouped.entry(domain).or_default().push(path.clone()),
            None => tracing::trace!(path = %path.display(), "no domain matched"),
        }
    }

    grouped
}

fn is_support_file(stem: &str) -> bool {
    SUPPORT_FILE_MARKERS
        .iter()
        .any(|marker| stem.contains(marker))
}

/// Matches an upper-cased file stem to a domain code.
///
/// An underscore-delimited token equal to the code wins (`STUDY_AE`,
/// `DS_EOT`). Otherwise a token starting with the code counts as a split
/// file of that domain (`LBCC`, `AE2`), preferring the longest code.
fn match_domain(stem: &str, domains: &[&str]) -> Option<String> {
    let tokens: Vec<&str> = stem.split(['_', '-', ' ']).collect();

    if let Some(domain) = domains
        .iter()
        .find(|domain| tokens.iter().any(|token| token.eq_ignore_ascii_case(domain)))
    {
        return Some(domain.to_uppercase());
    }

    let mut by_length: Vec<&str> = domains.to_vec();
    by_length.sort_by_key(|domain| std::cmp::Reverse(domain.len()));
    tokens.iter().find_map(|token| {
        by_length
            .iter()
            .find(|domain| token.starts_with(&domain.to_uppercase()))
            .map(|domain| domain.to_uppercase())
    })
}

//! Category and indication filters.
//!
//! Callers pick categories and indications from placeholder lists built per
//! subject. When a subject has no value for a field, the list shows a fixed
//! sentinel ("No categories", "ONGOING", ...) instead of being empty, and a
//! sentinel sent back as a selection means "no filter".

use std::collections::BTreeMap;

use sdtm_model::{ColumnExpr, DatasetAccess, Predicate, Retrieval};

use crate::error::Result;

pub const NO_CATEGORIES: &str = "No categories";
pub const NO_INDICATIONS: &str = "No indications";
pub const ONGOING: &str = "ONGOING";

/// Sentinel values keyed by source field (`CMCAT`, `AEENDTC`, ...).
///
/// Fields are matched case-insensitively. Fields without an entry have no
/// sentinel: an empty selection stays an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    sentinels: BTreeMap<String, String>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::from_map(default_fallbacks())
    }
}

impl FallbackPolicy {
    /// A policy with no sentinels.
    pub fn empty() -> Self {
        Self {
            sentinels: BTreeMap::new(),
        }
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        let sentinels = map
            .into_iter()
            .map(|(field, sentinel)| (field.trim().to_uppercase(), sentinel))
            .collect();
        Self { sentinels }
    }

    /// Registers `sentinel` for `field`, replacing any previous entry.
    #[must_use]
    pub fn with(mut self, field: &str, sentinel: impl Into<String>) -> Self {
        self.sentinels
            .insert(field.trim().to_uppercase(), sentinel.into());
        self
    }

    pub fn sentinel_for(&self, field: &str) -> Option<&str> {
        self.sentinels
            .get(&field.trim().to_uppercase())
            .map(String::as_str)
    }
}

/// The built-in sentinel map.
pub fn default_fallbacks() -> BTreeMap<String, String> {
    [
        ("AEENDTC", ONGOING),
        ("CMCAT", NO_CATEGORIES),
        ("PRCAT", NO_CATEGORIES),
        ("CMINDC", NO_INDICATIONS),
        ("PRINDC", NO_INDICATIONS),
    ]
    .into_iter()
    .map(|(field, sentinel)| (field.to_string(), sentinel.to_string()))
    .collect()
}

/// A resolved selection for one source field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilterOutcome {
    /// Values to include. Empty means no filter.
    Values(Vec<String>),
    /// The field's placeholder. Never used as a predicate.
    Sentinel(String),
}

impl CategoryFilterOutcome {
    /// `column IN (...)`, or `None` when the outcome does not filter.
    pub fn predicate(&self, column: &str) -> Option<Predicate> {
        match self {
            CategoryFilterOutcome::Values(values) if !values.is_empty() => {
                Some(Predicate::in_list(column, values.clone()))
            }
            _ => None,
        }
    }

    /// The values as a placeholder list: the sentinel alone, or the values.
    pub fn into_values(self) -> Vec<String> {
        match self {
            CategoryFilterOutcome::Values(values) => values,
            CategoryFilterOutcome::Sentinel(sentinel) => vec![sentinel],
        }
    }
}

/// Splits a comma-joined selection into trimmed, non-empty values.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct CategoricalFilterResolver<'a> {
    policy: &'a FallbackPolicy,
}

impl<'a> CategoricalFilterResolver<'a> {
    pub fn new(policy: &'a FallbackPolicy) -> Self {
        Self { policy }
    }

    /// Resolves the caller's selection for `source_field`.
    ///
    /// Values are trimmed and blanks dropped. A selection that is empty, or
    /// whose first value is the field's sentinel, resolves to the sentinel
    /// when the field has one.
    pub fn resolve(&self, raw_values: &[String], source_field: &str) -> CategoryFilterOutcome {
        let values: Vec<String> = raw_values
            .iter()
            .map(|value| value.as_str().trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        let sentinel = self.policy.sentinel_for(source_field);

        let unfiltered = match (values.first(), sentinel) {
            (None, _) => true,
            (Some(first), Some(sentinel)) => first.eq_ignore_ascii_case(sentinel),
            (Some(_), None) => false,
        };
        match (unfiltered, sentinel) {
            (true, Some(sentinel)) => CategoryFilterOutcome::Sentinel(sentinel.to_string()),
            (true, None) => CategoryFilterOutcome::Values(Vec::new()),
            (false, _) => CategoryFilterOutcome::Values(values),
        }
    }

    /// Distinct non-blank values of `source_field` recorded for `subject`,
    /// optionally restricted to rows whose `category.0` is one of
    /// `category.1`. An empty result becomes the field's sentinel.
    pub fn candidate_values<A: DatasetAccess + ?Sized>(
        &self,
        access: &A,
        target: &CandidateSource<'_>,
    ) -> Result<CategoryFilterOutcome> {
        let field = target.field.trim().to_uppercase();
        let retrieval = Retrieval::new(target.schema, target.table.trim().to_uppercase(), target.subject)
            .select(ColumnExpr::column(field.as_str()), None)
            .distinct()
            .filter(Predicate::not_blank(&field))
            .filter_opt(
                target
                    .category
                    .filter(|(_, values)| !values.is_empty())
                    .map(|(column, values)| Predicate::in_list(column, values.to_vec())),
            )
            .order_by(ColumnExpr::column(field.as_str()));

        let rows = access.execute_read_only(&retrieval)?;
        let values: Vec<String> = rows
            .column_values(&field)
            .into_iter()
            .map(|cell| cell.as_text().trim().to_string())
            .collect();
        tracing::debug!(field = %field, count = values.len(), "placeholder values");

        Ok(match self.policy.sentinel_for(&field) {
            Some(sentinel) if values.is_empty() => {
                CategoryFilterOutcome::Sentinel(sentinel.to_string())
            }
            _ => CategoryFilterOutcome::Values(values),
        })
    }
}

/// Where placeholder values are read from.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSource<'a> {
    pub schema: &'a str,
    pub subject: &'a str,
    pub table: &'a str,
    pub field: &'a str,
    /// Optional restriction: category column and accepted values.
    pub category: Option<(&'a str, &'a [String])>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_values_are_trimmed_and_filter() {
        let policy = FallbackPolicy::default();
        let outcome = CategoricalFilterResolver::new(&policy)
            .resolve(&strings(&[" ANALGESIC ", "", "ANTIBIOTIC"]), "CMCAT");
        assert_eq!(
            outcome,
            CategoryFilterOutcome::Values(strings(&["ANALGESIC", "ANTIBIOTIC"]))
        );
        assert_eq!(
            outcome.predicate("CMCAT"),
            Some(Predicate::in_list("CMCAT", strings(&["ANALGESIC", "ANTIBIOTIC"])))
        );
    }

    #[test]
    fn test_empty_selection_uses_field_sentinel() {
        let policy = FallbackPolicy::default();
        let resolver = CategoricalFilterResolver::new(&policy);
        assert_eq!(
            resolver.resolve(&[], "CMCAT"),
            CategoryFilterOutcome::Sentinel(NO_CATEGORIES.to_string())
        );
        assert_eq!(
            resolver.resolve(&[], "prindc"),
            CategoryFilterOutcome::Sentinel(NO_INDICATIONS.to_string())
        );
        assert_eq!(
            resolver.resolve(&[], "LBCAT"),
            CategoryFilterOutcome::Values(Vec::new())
        );
    }

    #[test]
    fn test_sentinel_selection_does_not_filter() {
        let policy = FallbackPolicy::default();
        let outcome = CategoricalFilterResolver::new(&policy)
            .resolve(&strings(&["No categories"]), "PRCAT");
        assert_eq!(outcome, CategoryFilterOutcome::Sentinel(NO_CATEGORIES.to_string()));
        assert_eq!(outcome.predicate("PRCAT"), None);
    }

    #[test]
    fn test_policy_can_register_new_fields() {
        let policy = FallbackPolicy::empty().with("mhcat", "No history");
        assert_eq!(policy.sentinel_for("MHCAT"), Some("No history"));
        assert_eq!(policy.sentinel_for("CMCAT"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("ALT, AST,,"), strings(&["ALT", "AST"]));
        assert!(split_list("  ").is_empty());
    }
}

//! Canonical query input.

use chrono::NaiveDate;
use sdtm_model::ModuleQuery;

use crate::window::AnchorDates;

/// End of the anchor window as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEnd {
    Date(NaiveDate),
    /// The anchor event has not ended; resolved against the reference date.
    Ongoing,
}

/// One standard query, built per request and consumed once.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    pub query: ModuleQuery,
    pub subject: String,
    pub anchor_start: Option<NaiveDate>,
    pub anchor_end: Option<AnchorEnd>,
    pub offset_days: Option<i64>,
    /// CMCAT/PRCAT selection.
    pub categories: Vec<String>,
    /// CMINDC/PRINDC selection.
    pub indications: Vec<String>,
    /// LBTEST/VSTEST selection.
    pub tests: Vec<String>,
    /// LBCAT.
    pub test_category: Option<String>,
}

impl QuerySpecification {
    pub fn new(query: ModuleQuery, subject: impl Into<String>) -> Self {
        Self {
            query,
            subject: subject.into(),
            anchor_start: None,
            anchor_end: None,
            offset_days: None,
            categories: Vec::new(),
            indications: Vec::new(),
            tests: Vec::new(),
            test_category: None,
        }
    }

    #[must_use]
    pub fn with_anchor_start(mut self, date: NaiveDate) -> Self {
        self.anchor_start = Some(date);
        self
    }

    #[must_use]
    pub fn with_anchor_end(mut self, end: AnchorEnd) -> Self {
        self.anchor_end = Some(end);
        self
    }

    #[must_use]
    pub fn with_offset_days(mut self, days: i64) -> Self {
        self.offset_days = Some(days);
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_indications<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indications = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tests<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tests = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_test_category(mut self, category: impl Into<String>) -> Self {
        self.test_category = Some(category.into());
        self
    }

    /// Anchor values for window resolution, with an ongoing end replaced by
    /// `reference_date`.
    pub fn anchors(&self, reference_date: NaiveDate) -> AnchorDates {
        AnchorDates {
            start: self.anchor_start,
            end: self.anchor_end.map(|end| match end {
                AnchorEnd::Date(date) => date,
                AnchorEnd::Ongoing => reference_date,
            }),
            offset_days: self.offset_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdtm_model::TemporalMode;

    #[test]
    fn test_ongoing_end_uses_reference_date() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let spec = QuerySpecification::new(ModuleQuery::AdverseEvents(TemporalMode::During), "01-001")
            .with_anchor_start(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .with_anchor_end(AnchorEnd::Ongoing);
        assert_eq!(spec.anchors(as_of).end, Some(as_of));
    }
}

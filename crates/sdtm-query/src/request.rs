//! The request body sent by the template front end.
//!
//! Keys follow the placeholder names of the question templates
//! (`ModuleType`, `Usubject`, `AESTDTC`, `CMCAT`, ...). Values are loosely
//! typed: dates may carry a time or trailing text and lists are comma-joined.

use serde::{Deserialize, Deserializer, Serialize};
use sdtm_model::extract_date;

use crate::category::{ONGOING, split_list};
use crate::error::{QueryError, Result};
use crate::router::ModuleRouter;
use crate::specification::{AnchorEnd, QuerySpecification};
use crate::window::{ANCHOR_END, ANCHOR_START};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(rename = "ModuleType")]
    pub module_type: i64,
    #[serde(rename = "Usubject")]
    pub subject: String,
    #[serde(rename = "QuestionType")]
    pub question_type: String,
    #[serde(rename = "AESTDTC", default, skip_serializing_if = "Option::is_none")]
    pub anchor_start: Option<String>,
    #[serde(rename = "AEENDTC", default, skip_serializing_if = "Option::is_none")]
    pub anchor_end: Option<String>,
    #[serde(
        rename = "Days",
        default,
        deserialize_with = "lenient_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub days: Option<i64>,
    #[serde(
        rename = "CMCAT",
        alias = "PRCAT",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(
        rename = "CMINDC",
        alias = "PRINDC",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub indication: Option<String>,
    #[serde(
        rename = "LBTEST",
        alias = "VSTEST",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tests: Option<String>,
    #[serde(rename = "LBCAT", default, skip_serializing_if = "Option::is_none")]
    pub test_category: Option<String>,
}

/// Accepts `Days` as a number, a numeric string, blank, or null.
fn lenient_days<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Days {
        Number(i64),
        Text(String),
    }

    match Option::<Days>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Days::Number(days)) => Ok(Some(days)),
        Some(Days::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Days::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid Days value '{text}'"))),
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_anchor(parameter: &'static str, value: &str) -> Result<chrono::NaiveDate> {
    extract_date(value).ok_or_else(|| QueryError::InvalidParameter {
        parameter,
        value: value.to_string(),
    })
}

impl TryFrom<&QueryRequest> for QuerySpecification {
    type Error = QueryError;

    fn try_from(request: &QueryRequest) -> Result<Self> {
        let router = ModuleRouter;
        let module = router.route(request.module_type)?;
        let query = router.select_mode(module, &request.question_type)?;

        let mut spec = QuerySpecification::new(query, request.subject.trim());
        if let Some(start) = non_blank(request.anchor_start.as_ref()) {
            spec.anchor_start = Some(parse_anchor(ANCHOR_START, start)?);
        }
        if let Some(end) = non_blank(request.anchor_end.as_ref()) {
            spec.anchor_end = Some(if end.eq_ignore_ascii_case(ONGOING) {
                AnchorEnd::Ongoing
            } else {
                AnchorEnd::Date(parse_anchor(ANCHOR_END, end)?)
            });
        }
        spec.offset_days = request.days;
        spec.categories = request.category.as_deref().map(split_list).unwrap_or_default();
        spec.indications = request
            .indication
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        spec.tests = request.tests.as_deref().map(split_list).unwrap_or_default();
        spec.test_category = non_blank(request.test_category.as_ref()).map(str::to_string);
        Ok(spec)
    }
}

impl TryFrom<QueryRequest> for QuerySpecification {
    type Error = QueryError;

    fn try_from(request: QueryRequest) -> Result<Self> {
        QuerySpecification::try_from(&request)
    }
}

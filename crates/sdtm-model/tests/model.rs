//! Tests for sdtm-model types.

use chrono::NaiveDate;
use sdtm_model::{
    CellValue, ColumnExpr, DataAccessError, DatasetAccess, ModuleQuery, Predicate, QueryModule,
    RankRule, Ranking, Retrieval, RowSet, TemporalMode,
};

struct FixedRows(RowSet);

impl DatasetAccess for FixedRows {
    fn execute_read_only(&self, retrieval: &Retrieval) -> Result<RowSet, DataAccessError> {
        if retrieval.table != "AE" {
            return Err(DataAccessError::TableNotFound {
                schema: retrieval.schema.clone(),
                table: retrieval.table.clone(),
            });
        }
        Ok(self.0.clone())
    }
}

#[test]
fn access_is_usable_through_references() {
    let backend = FixedRows(RowSet {
        columns: vec!["AEDECOD".to_string()],
        rows: vec![vec![CellValue::text("Headache")]],
    });
    let by_ref: &dyn DatasetAccess = &backend;
    let retrieval = Retrieval::new("P01_sdtm", "AE", "01-001").select_column("AEDECOD");
    let rows = by_ref.execute_read_only(&retrieval).expect("rows");
    assert_eq!(rows.len(), 1);

    let missing = Retrieval::new("P01_sdtm", "LB", "01-001");
    let err = by_ref.execute_read_only(&missing).unwrap_err();
    assert_eq!(err.to_string(), "dataset P01_sdtm.LB not found");
}

#[test]
fn module_query_display_names_domain_and_mode() {
    let query = ModuleQuery::parse(QueryModule::AdverseEvents, "At_Time").expect("mode");
    assert_eq!(query, ModuleQuery::AdverseEvents(TemporalMode::AtTime));
    assert_eq!(query.to_string(), "AE/at_time");
}

#[test]
fn nearest_ranking_renders_exact_match_first() {
    let anchor = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let retrieval = Retrieval::new("P01_sdtm", "VS", "01-001")
        .select(ColumnExpr::column("VSTEST"), Some("Vital Signs Test Name"))
        .filter(Predicate::has_date("VSDTC"))
        .rank_by(Ranking {
            partition: "VSTEST".to_string(),
            date_column: "VSDTC".to_string(),
            target: anchor,
            rule: RankRule::Nearest,
        });
    let sql = retrieval.to_string();
    assert!(sql.contains(
        "ORDER BY CASE WHEN TRY_CAST(LEFT(VSDTC, 10) AS DATE) = '2024-02-01' THEN 0 ELSE 1 END"
    ));
    assert!(sql.contains("ABS(DATEDIFF(day, TRY_CAST(LEFT(VSDTC, 10) AS DATE), '2024-02-01'))"));
    assert!(sql.ends_with("ranked WHERE rn = 1"));
}

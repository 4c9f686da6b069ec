//! Read-only retrieval plans.
//!
//! A [`Retrieval`] describes one subject-scoped read against a single SDTM
//! dataset: the projection, the row predicates, an optional per-partition
//! ranking, grouping, and ordering. It has no mutating form, so any
//! [`DatasetAccess`](crate::DatasetAccess) executing it is read-only by
//! construction.
//!
//! The `Display` implementation renders the plan as the equivalent SQL
//! statement. That text is the audit expression handed back to callers next to
//! the result rows.
//!
//! Evaluation order is: subject and row predicates, then ranking (one winner per
//! partition), then grouping and projection, then `DISTINCT`, then ordering.

use std::fmt::{self, Write as _};

use chrono::NaiveDate;

use crate::datetime::format_date;

/// Subject identifier column present in every SDTM dataset.
pub const SUBJECT_COLUMN: &str = "USUBJID";

/// A value expression over the columns of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    Column(String),
    /// Numeric value rounded half away from zero to `digits` decimals;
    /// values that are not numbers become null.
    Round { column: String, digits: u32 },
    /// Text concatenation with a separator; nulls concatenate as empty text.
    Concat { columns: Vec<String>, separator: String },
    /// Smallest value over the group.
    Min(String),
    /// Largest value over the group.
    Max(String),
}

impl ColumnExpr {
    pub fn column(name: impl Into<String>) -> Self {
        ColumnExpr::Column(name.into())
    }

    pub fn round(name: impl Into<String>, digits: u32) -> Self {
        ColumnExpr::Round {
            column: name.into(),
            digits,
        }
    }

    pub fn concat(columns: &[&str], separator: impl Into<String>) -> Self {
        ColumnExpr::Concat {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            separator: separator.into(),
        }
    }

    pub fn min(name: impl Into<String>) -> Self {
        ColumnExpr::Min(name.into())
    }

    pub fn max(name: impl Into<String>) -> Self {
        ColumnExpr::Max(name.into())
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, ColumnExpr::Min(_) | ColumnExpr::Max(_))
    }

    /// Source columns the expression reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ColumnExpr::Column(name)
            | ColumnExpr::Round { column: name, .. }
            | ColumnExpr::Min(name)
            | ColumnExpr::Max(name) => vec![name.as_str()],
            ColumnExpr::Concat { columns, .. } => columns.iter().map(String::as_str).collect(),
        }
    }

    /// Name used for the output column when no label is given.
    pub fn default_label(&self) -> String {
        match self {
            ColumnExpr::Column(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnExpr::Column(name) => write!(f, "{name}"),
            ColumnExpr::Round { column, digits } => write!(f, "ROUND({column}, {digits})"),
            ColumnExpr::Concat { columns, separator } => {
                let sep = format!(", {}, ", quote(separator));
                write!(f, "CONCAT({})", columns.join(&sep))
            }
            ColumnExpr::Min(name) => write!(f, "MIN({name})"),
            ColumnExpr::Max(name) => write!(f, "MAX({name})"),
        }
    }
}

/// One projected output column.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: ColumnExpr,
    pub label: Option<String>,
}

impl SelectItem {
    /// Output column name: the label, or the expression itself.
    pub fn output_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.expr.default_label())
    }
}

/// Row predicate. Date predicates compare the date part of a timing value;
/// rows whose value is not a complete date never satisfy them.
///
/// Text comparisons are trimmed and ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals {
        column: String,
        value: String,
    },
    InList {
        column: String,
        values: Vec<String>,
    },
    /// Closed interval `[low, high]`.
    DateBetween {
        column: String,
        low: NaiveDate,
        high: NaiveDate,
    },
    DateOnOrBefore {
        column: String,
        bound: NaiveDate,
    },
    DateBefore {
        column: String,
        bound: NaiveDate,
    },
    /// The value is a complete date.
    HasDate {
        column: String,
    },
    Blank {
        column: String,
    },
    NotBlank {
        column: String,
    },
    /// Case-insensitive substring match against any of `terms`.
    ContainsAny {
        column: String,
        terms: Vec<String>,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(column: &str, value: impl Into<String>) -> Self {
        Predicate::Equals {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn in_list(column: &str, values: Vec<String>) -> Self {
        Predicate::InList {
            column: column.to_string(),
            values,
        }
    }

    pub fn date_between(column: &str, low: NaiveDate, high: NaiveDate) -> Self {
        Predicate::DateBetween {
            column: column.to_string(),
            low,
            high,
        }
    }

    pub fn date_on_or_before(column: &str, bound: NaiveDate) -> Self {
        Predicate::DateOnOrBefore {
            column: column.to_string(),
            bound,
        }
    }

    pub fn date_before(column: &str, bound: NaiveDate) -> Self {
        Predicate::DateBefore {
            column: column.to_string(),
            bound,
        }
    }

    pub fn has_date(column: &str) -> Self {
        Predicate::HasDate {
            column: column.to_string(),
        }
    }

    pub fn blank(column: &str) -> Self {
        Predicate::Blank {
            column: column.to_string(),
        }
    }

    pub fn not_blank(column: &str) -> Self {
        Predicate::NotBlank {
            column: column.to_string(),
        }
    }

    pub fn contains_any(column: &str, terms: &[&str]) -> Self {
        Predicate::ContainsAny {
            column: column.to_string(),
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// Source columns the predicate reads.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Predicate::Equals { column, .. }
            | Predicate::InList { column, .. }
            | Predicate::DateBetween { column, .. }
            | Predicate::DateOnOrBefore { column, .. }
            | Predicate::DateBefore { column, .. }
            | Predicate::HasDate { column }
            | Predicate::Blank { column }
            | Predicate::NotBlank { column }
            | Predicate::ContainsAny { column, .. } => vec![column.as_str()],
            Predicate::All(parts) | Predicate::Any(parts) => {
                parts.iter().flat_map(Predicate::columns).collect()
            }
        }
    }
}

fn date_part(column: &str) -> String {
    format!("TRY_CAST(LEFT({column}, 10) AS DATE)")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals { column, value } => write!(f, "{column} = {}", quote(value)),
            Predicate::InList { column, values } => {
                let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
                write!(f, "{column} IN ({})", list.join(", "))
            }
            Predicate::DateBetween { column, low, high } => write!(
                f,
                "{} BETWEEN {} AND {}",
                date_part(column),
                quote_date(*low),
                quote_date(*high)
            ),
            Predicate::DateOnOrBefore { column, bound } => {
                write!(f, "{} <= {}", date_part(column), quote_date(*bound))
            }
            Predicate::DateBefore { column, bound } => {
                write!(f, "{} < {}", date_part(column), quote_date(*bound))
            }
            Predicate::HasDate { column } => write!(f, "{} IS NOT NULL", date_part(column)),
            Predicate::Blank { column } => write!(f, "NULLIF({column}, '') IS NULL"),
            Predicate::NotBlank { column } => write!(f, "NULLIF({column}, '') IS NOT NULL"),
            Predicate::ContainsAny { column, terms } => {
                let parts: Vec<String> = terms
                    .iter()
                    .map(|term| format!("{column} LIKE {}", quote(&format!("%{term}%"))))
                    .collect();
                write!(f, "({})", parts.join(" OR "))
            }
            Predicate::All(parts) => write!(f, "({})", join_predicates(parts, " AND ")),
            Predicate::Any(parts) => write!(f, "({})", join_predicates(parts, " OR ")),
        }
    }
}

fn join_predicates(parts: &[Predicate], separator: &str) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// How the winner of each partition is chosen.
///
/// Rows that tie on every key of the rule are resolved by dataset order:
/// the row read first wins. The rendered `ORDER BY` lists only the rule's
/// own keys, since dataset order has no column to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankRule {
    /// A record dated exactly on the target wins; otherwise the smallest
    /// absolute day distance. Equal distances prefer the earlier date, then
    /// dataset order.
    Nearest,
    /// The latest timing value (full text, so time of day breaks same-day
    /// ties), then dataset order.
    MostRecent,
}

/// Keep one row per distinct `partition` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub partition: String,
    pub date_column: String,
    pub target: NaiveDate,
    pub rule: RankRule,
}

impl Ranking {
    /// Keys of the `ROW_NUMBER()` ordering; dataset order follows implicitly.
    fn window_order(&self) -> String {
        let date = &self.date_column;
        match self.rule {
            RankRule::Nearest => {
                let target = quote_date(self.target);
                format!(
                    "CASE WHEN {part} = {target} THEN 0 ELSE 1 END, \
                     ABS(DATEDIFF(day, {part}, {target})), {part}",
                    part = date_part(date)
                )
            }
            RankRule::MostRecent => format!("{date} DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub expr: ColumnExpr,
    pub descending: bool,
}

/// A subject-scoped, read-only read against one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub schema: String,
    pub table: String,
    pub subject: String,
    pub select: Vec<SelectItem>,
    pub distinct: bool,
    pub filters: Vec<Predicate>,
    pub ranking: Option<Ranking>,
    pub group_by: Option<String>,
    pub order_by: Vec<OrderKey>,
}

impl Retrieval {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            subject: subject.into(),
            select: Vec::new(),
            distinct: false,
            filters: Vec::new(),
            ranking: None,
            group_by: None,
            order_by: Vec::new(),
        }
    }

    /// Adds an output column.
    #[must_use]
    pub fn select(mut self, expr: ColumnExpr, label: Option<&str>) -> Self {
        self.select.push(SelectItem {
            expr,
            label: label.map(str::to_string),
        });
        self
    }

    /// Adds a plain source column under its own name.
    #[must_use]
    pub fn select_column(self, name: &str) -> Self {
        self.select(ColumnExpr::column(name), None)
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    #[must_use]
    pub fn filter_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    #[must_use]
    pub fn rank_by(mut self, ranking: Ranking) -> Self {
        self.ranking = Some(ranking);
        self
    }

    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    #[must_use]
    pub fn order_by(mut self, expr: ColumnExpr) -> Self {
        self.order_by.push(OrderKey {
            expr,
            descending: false,
        });
        self
    }

    #[must_use]
    pub fn order_by_desc(mut self, expr: ColumnExpr) -> Self {
        self.order_by.push(OrderKey {
            expr,
            descending: true,
        });
        self
    }

    /// True when the projection aggregates (with or without `GROUP BY`).
    pub fn is_aggregate(&self) -> bool {
        self.group_by.is_some() || self.select.iter().any(|item| item.expr.is_aggregate())
    }

    /// Output column names, in projection order.
    pub fn output_columns(&self) -> Vec<String> {
        self.select.iter().map(SelectItem::output_name).collect()
    }

    /// Every source column the plan reads, deduplicated, in first-use order.
    pub fn source_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = vec![SUBJECT_COLUMN.to_string()];
        let mut push = |name: &str| {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name.to_string());
            }
        };
        for item in &self.select {
            item.expr.columns().into_iter().for_each(&mut push);
        }
        for predicate in &self.filters {
            predicate.columns().into_iter().for_each(&mut push);
        }
        if let Some(ranking) = &self.ranking {
            push(&ranking.partition);
            push(&ranking.date_column);
        }
        if let Some(group) = &self.group_by {
            push(group);
        }
        for key in &self.order_by {
            key.expr.columns().into_iter().for_each(&mut push);
        }
        names
    }

    fn where_clause(&self) -> String {
        let mut clause = format!(
            "FROM {}.{} WHERE {SUBJECT_COLUMN} = {}",
            self.schema,
            self.table,
            quote(&self.subject)
        );
        for predicate in &self.filters {
            let _ = write!(clause, " AND {predicate}");
        }
        clause
    }

    fn projection(&self, labelled: bool) -> String {
        self.select
            .iter()
            .map(|item| match (&item.label, labelled) {
                (Some(label), true) => format!("{} AS {}", item.expr, quote(label)),
                _ => item.expr.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.distinct {
            "SELECT DISTINCT"
        } else {
            "SELECT"
        };
        match &self.ranking {
            Some(ranking) => {
                let mut inner_columns: Vec<String> = Vec::new();
                for item in &self.select {
                    for column in item.expr.columns() {
                        if !inner_columns.iter().any(|c| c == column) {
                            inner_columns.push(column.to_string());
                        }
                    }
                }
                write!(
                    f,
                    "{keyword} {} FROM (SELECT {}, ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {}) AS rn {}) ranked WHERE rn = 1",
                    self.projection(true),
                    inner_columns.join(", "),
                    ranking.partition,
                    ranking.window_order(),
                    self.where_clause()
                )?;
            }
            None => {
                write!(
                    f,
                    "{keyword} {} {}",
                    self.projection(true),
                    self.where_clause()
                )?;
            }
        }
        if let Some(group) = &self.group_by {
            write!(f, " GROUP BY {group}")?;
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|key| {
                    if key.descending {
                        format!("{} DESC", key.expr)
                    } else {
                        key.expr.to_string()
                    }
                })
                .collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }
        Ok(())
    }
}

/// Quotes a SQL string literal, doubling embedded quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_date(date: NaiveDate) -> String {
    quote(&format_date(date))
}

//! Module handlers.
//!
//! Each handler owns one SDTM domain: its table, projection with display
//! labels, partition key, and the modes it declares. It turns a
//! [`QuerySpecification`] into a [`Retrieval`] using the window, category, and
//! anchor resolvers; execution is left to the
//! [`ResultFormatter`](crate::ResultFormatter).

mod adverse_events;
mod disposition;
mod dosing_exposure;
mod laboratory;
mod medications;
mod procedures;
mod vital_signs;

pub use adverse_events::AdverseEventsHandler;
pub use disposition::DispositionHandler;
pub use dosing_exposure::DosingExposureHandler;
pub use laboratory::LaboratoryHandler;
pub use medications::MedicationsHandler;
pub use procedures::ProceduresHandler;
pub use vital_signs::VitalSignsHandler;

use chrono::NaiveDate;
use sdtm_model::{ColumnExpr, DatasetAccess, QueryModule, Retrieval, TemporalMode};

use crate::anchor::AnchorDateProvider;
use crate::category::{CategoricalFilterResolver, FallbackPolicy};
use crate::error::Result;
use crate::specification::QuerySpecification;
use crate::window::{TemporalWindowResolver, WindowMode};

/// A projected field before labelling.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    Plain(&'static str),
    Rounded(&'static str, u32),
    Joined(&'static [&'static str], &'static str),
    First(&'static str),
    Last(&'static str),
}

/// One output column of a handler's projection.
#[derive(Debug, Clone, Copy)]
pub struct OutputColumn {
    pub field: Field,
    pub label: &'static str,
}

impl OutputColumn {
    pub const fn plain(column: &'static str, label: &'static str) -> Self {
        Self {
            field: Field::Plain(column),
            label,
        }
    }

    pub fn expr(&self) -> ColumnExpr {
        match self.field {
            Field::Plain(column) => ColumnExpr::column(column),
            Field::Rounded(column, digits) => ColumnExpr::round(column, digits),
            Field::Joined(columns, separator) => ColumnExpr::concat(columns, separator),
            Field::First(column) => ColumnExpr::min(column),
            Field::Last(column) => ColumnExpr::max(column),
        }
    }
}

/// Everything a handler may consult besides the specification.
pub struct HandlerContext<'a> {
    pub access: &'a dyn DatasetAccess,
    pub schema: &'a str,
    pub fallbacks: &'a FallbackPolicy,
    /// Date an ongoing anchor end resolves to.
    pub reference_date: NaiveDate,
}

impl<'a> HandlerContext<'a> {
    pub fn anchors(&self) -> AnchorDateProvider<'a, dyn DatasetAccess + 'a> {
        AnchorDateProvider::new(self.access, self.schema)
    }

    pub fn categories(&self) -> CategoricalFilterResolver<'a> {
        CategoricalFilterResolver::new(self.fallbacks)
    }

    pub fn windows(&self) -> TemporalWindowResolver {
        TemporalWindowResolver
    }
}

/// The capability set shared by the seven handlers.
pub trait ModuleHandler {
    /// The module's own mode enum.
    type Mode: Copy;

    fn module(&self) -> QueryModule;

    /// Wire names of the declared modes.
    fn supported_modes(&self) -> &'static [&'static str] {
        self.module().mode_names()
    }

    /// SDTM dataset the handler reads.
    fn table(&self) -> &'static str {
        self.module().domain_code()
    }

    fn projection(&self) -> &'static [OutputColumn];

    /// Column within which proximity ranking picks one record, if any.
    fn partition_key(&self) -> Option<&'static str>;

    /// Assembles the read for `mode`.
    fn build(
        &self,
        mode: Self::Mode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval>;

    /// Subject-scoped read of [`table`](Self::table) with the projection
    /// applied.
    fn base_retrieval(&self, spec: &QuerySpecification, ctx: &HandlerContext<'_>) -> Retrieval {
        self.projection().iter().fold(
            Retrieval::new(ctx.schema, self.table(), spec.subject.as_str()),
            |retrieval, column| retrieval.select(column.expr(), Some(column.label)),
        )
    }
}

/// Applies one of the shared findings/events modes to `base`.
///
/// `study` reads every record; the anchor modes resolve a window on
/// `date_column`, ranking within the handler's partition key. Results are
/// ordered by date, then partition key.
pub(crate) fn temporal_retrieval<H: ModuleHandler + ?Sized>(
    handler: &H,
    base: Retrieval,
    mode: TemporalMode,
    spec: &QuerySpecification,
    ctx: &HandlerContext<'_>,
    date_column: &str,
) -> Result<Retrieval> {
    let partition = handler.partition_key().unwrap_or(date_column);
    let window_mode = match mode {
        TemporalMode::Study => None,
        TemporalMode::AtTime => Some(WindowMode::AtTime),
        TemporalMode::Prior => Some(WindowMode::Prior),
        TemporalMode::During => Some(WindowMode::During),
        TemporalMode::WithinDays => Some(WindowMode::WithinDays),
    };

    let retrieval = match window_mode {
        Some(window_mode) => {
            let window = ctx
                .windows()
                .resolve(&spec.anchors(ctx.reference_date), window_mode)?;
            window.apply(base, date_column, partition)
        }
        None => base,
    };

    Ok(retrieval
        .order_by(ColumnExpr::column(date_column))
        .order_by(ColumnExpr::column(partition)))
}

/// Resolves a `during`/`within_days` window into a start-date filter.
pub(crate) fn interval_retrieval(
    base: Retrieval,
    mode: WindowMode,
    spec: &QuerySpecification,
    ctx: &HandlerContext<'_>,
    date_column: &str,
) -> Result<Retrieval> {
    let window = ctx
        .windows()
        .resolve(&spec.anchors(ctx.reference_date), mode)?;
    Ok(window.apply(base, date_column, date_column))
}

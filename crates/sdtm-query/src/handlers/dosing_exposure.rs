use sdtm_model::{ColumnExpr, ExposureMode, Predicate, QueryModule, Retrieval};

use super::{Field, HandlerContext, ModuleHandler, OutputColumn};
use crate::error::Result;
use crate::specification::QuerySpecification;

const SUMMARY: &[OutputColumn] = &[
    OutputColumn::plain("EXTRT", "Treatment (EXTRT)"),
    OutputColumn {
        field: Field::First("EXSTDTC"),
        label: "First Dose Start Date (EXSTDTC)",
    },
    OutputColumn {
        field: Field::First("EXSTDY"),
        label: "First Dose Study Day (EXSTDY)",
    },
    OutputColumn {
        field: Field::Last("EXENDTC"),
        label: "Last Dose End Date (EXENDTC)",
    },
    OutputColumn {
        field: Field::Last("EXENDY"),
        label: "Last Dose Study Day (EXENDY)",
    },
];

const ADJUSTMENTS: &[OutputColumn] = &[
    OutputColumn::plain("EXTRT", "Name of Treatment (EXTRT)"),
    OutputColumn {
        field: Field::Joined(&["EXDOSE", "EXDOSU"], " "),
        label: "Dose (EXDOSE)/Dose Units (EXDOSU)",
    },
    OutputColumn::plain("EXDOSFRQ", "Dosing Frequency per Interval (EXDOSFRQ)"),
    OutputColumn::plain("EXSTDTC", "Start Date/Time of Treatment (EXSTDTC)"),
    OutputColumn::plain("EXSTDY", "Study Day of Start of Treatment (EXSTDY)"),
    OutputColumn::plain("EXADJ", "Reason for Dose Adjustment (EXADJ)"),
];

/// Exposure records (EX): per-treatment summary, or dose adjustments
/// matched on the reason text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DosingExposureHandler;

impl DosingExposureHandler {
    fn columns(mode: ExposureMode) -> &'static [OutputColumn] {
        match mode {
            ExposureMode::Summary => SUMMARY,
            ExposureMode::Modification | ExposureMode::Interruption => ADJUSTMENTS,
        }
    }
}

impl ModuleHandler for DosingExposureHandler {
    type Mode = ExposureMode;

    fn module(&self) -> QueryModule {
        QueryModule::DosingExposure
    }

    /// The adjustment listing; the summary lookup uses its own aggregate
    /// projection.
    fn projection(&self) -> &'static [OutputColumn] {
        ADJUSTMENTS
    }

    fn partition_key(&self) -> Option<&'static str> {
        None
    }

    fn build(
        &self,
        mode: ExposureMode,
        spec: &QuerySpecification,
        ctx: &HandlerContext<'_>,
    ) -> Result<Retrieval> {
        let retrieval = Self::columns(mode).iter().fold(
            Retrieval::new(ctx.schema, self.table(), spec.subject.as_str()),
            |retrieval, column| retrieval.select(column.expr(), Some(column.label)),
        );

        Ok(match mode {
            ExposureMode::Summary => retrieval
                .group_by("EXTRT")
                .order_by(ColumnExpr::min("EXSTDTC")),
            ExposureMode::Modification | ExposureMode::Interruption => retrieval
                .filter(Predicate::contains_any("EXADJ", mode.adjustment_terms()))
                .order_by(ColumnExpr::column("EXSTDTC")),
        })
    }
}

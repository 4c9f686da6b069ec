//! Query modules and their relationship modes.
//!
//! Each standard-query module targets one SDTM domain. A module declares the
//! relationship modes it understands through its own mode enum, and
//! [`ModuleQuery`] pairs a module with one of its modes so that an
//! unsupported combination cannot be represented once parsing succeeds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven clinical domains a standard query can target.
///
/// Module ids are the numeric identifiers used by the template catalog
/// (1 = Laboratory ... 7 = Dosing and Exposure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueryModule {
    Laboratory,
    Medications,
    Procedures,
    AdverseEvents,
    VitalSigns,
    Disposition,
    DosingExposure,
}

impl QueryModule {
    /// All modules in catalog order.
    pub const ALL: [QueryModule; 7] = [
        QueryModule::Laboratory,
        QueryModule::Medications,
        QueryModule::Procedures,
        QueryModule::AdverseEvents,
        QueryModule::VitalSigns,
        QueryModule::Disposition,
        QueryModule::DosingExposure,
    ];

    /// Looks up a module by its catalog id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(QueryModule::Laboratory),
            2 => Some(QueryModule::Medications),
            3 => Some(QueryModule::Procedures),
            4 => Some(QueryModule::AdverseEvents),
            5 => Some(QueryModule::VitalSigns),
            6 => Some(QueryModule::Disposition),
            7 => Some(QueryModule::DosingExposure),
            _ => None,
        }
    }

    /// Catalog id of the module.
    pub fn id(&self) -> u8 {
        match self {
            QueryModule::Laboratory => 1,
            QueryModule::Medications => 2,
            QueryModule::Procedures => 3,
            QueryModule::AdverseEvents => 4,
            QueryModule::VitalSigns => 5,
            QueryModule::Disposition => 6,
            QueryModule::DosingExposure => 7,
        }
    }

    /// SDTM dataset the module reads from.
    pub fn domain_code(&self) -> &'static str {
        match self {
            QueryModule::Laboratory => "LB",
            QueryModule::Medications => "CM",
            QueryModule::Procedures => "PR",
            QueryModule::AdverseEvents => "AE",
            QueryModule::VitalSigns => "VS",
            QueryModule::Disposition => "DS",
            QueryModule::DosingExposure => "EX",
        }
    }

    /// Display name as shown in the template catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryModule::Laboratory => "Laboratory",
            QueryModule::Medications => "Medications",
            QueryModule::Procedures => "Procedures",
            QueryModule::AdverseEvents => "Adverse Events",
            QueryModule::VitalSigns => "Vital Signs",
            QueryModule::Disposition => "Disposition and Outcome",
            QueryModule::DosingExposure => "Dosing and Exposure",
        }
    }

    /// Wire names of the relationship modes this module accepts.
    pub fn mode_names(&self) -> &'static [&'static str] {
        match self {
            QueryModule::Laboratory | QueryModule::AdverseEvents | QueryModule::VitalSigns => {
                TemporalMode::NAMES
            }
            QueryModule::Medications => MedicationMode::NAMES,
            QueryModule::Procedures => ProcedureMode::NAMES,
            QueryModule::Disposition => DispositionMode::NAMES,
            QueryModule::DosingExposure => ExposureMode::NAMES,
        }
    }
}

impl fmt::Display for QueryModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryModule {
    type Err = String;

    /// Accepts the catalog id, the domain code, or the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| format!("Unknown query module id: {id}"));
        }
        let normalized = trimmed.to_uppercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "LB" | "LAB" | "LABORATORY" => Ok(QueryModule::Laboratory),
            "CM" | "MEDICATIONS" => Ok(QueryModule::Medications),
            "PR" | "PROCEDURES" => Ok(QueryModule::Procedures),
            "AE" | "ADVERSE EVENTS" => Ok(QueryModule::AdverseEvents),
            "VS" | "VITAL SIGNS" => Ok(QueryModule::VitalSigns),
            "DS" | "DISPOSITION" | "DISPOSITION AND OUTCOME" => Ok(QueryModule::Disposition),
            "EX" | "DOSING" | "DOSING AND EXPOSURE" => Ok(QueryModule::DosingExposure),
            _ => Err(format!("Unknown query module: {s}")),
        }
    }
}

/// Relationship modes shared by the findings/events modules
/// (Laboratory, Adverse Events, Vital Signs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalMode {
    /// Every record for the subject.
    Study,
    /// Nearest record to the anchor date, per partition key.
    AtTime,
    /// Most recent record on or before the anchor date, per partition key.
    Prior,
    /// Records inside the anchor start/end window.
    During,
    /// Records within a signed day offset of the anchor start.
    WithinDays,
}

impl TemporalMode {
    const NAMES: &'static [&'static str] = &["study", "at_time", "prior", "during", "within_days"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalMode::Study => "study",
            TemporalMode::AtTime => "at_time",
            TemporalMode::Prior => "prior",
            TemporalMode::During => "during",
            TemporalMode::WithinDays => "within_days",
        }
    }

    /// Parses a wire mode name. `graph` is the trend-view alias of `study`.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_mode(value).as_str() {
            "study" | "graph" => Some(TemporalMode::Study),
            "at_time" => Some(TemporalMode::AtTime),
            "prior" => Some(TemporalMode::Prior),
            "during" => Some(TemporalMode::During),
            "within_days" => Some(TemporalMode::WithinDays),
            _ => None,
        }
    }
}

/// Relationship modes of the Medications module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MedicationMode {
    /// From 30 days before the reference start through the reference end.
    PriorDuring,
    During,
    WithinDays,
}

impl MedicationMode {
    const NAMES: &'static [&'static str] = &["prior_during", "during", "within_days"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MedicationMode::PriorDuring => "prior_during",
            MedicationMode::During => "during",
            MedicationMode::WithinDays => "within_days",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_mode(value).as_str() {
            "prior_during" => Some(MedicationMode::PriorDuring),
            "during" => Some(MedicationMode::During),
            "within_days" => Some(MedicationMode::WithinDays),
            _ => None,
        }
    }
}

/// Relationship modes of the Procedures module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureMode {
    /// Between the subject's reference start and end dates.
    Study,
    /// Strictly before the subject's first dose.
    PriorFirst,
    During,
    WithinDays,
}

impl ProcedureMode {
    const NAMES: &'static [&'static str] = &["study", "prior_first", "during", "within_days"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureMode::Study => "study",
            ProcedureMode::PriorFirst => "prior_first",
            ProcedureMode::During => "during",
            ProcedureMode::WithinDays => "within_days",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_mode(value).as_str() {
            "study" => Some(ProcedureMode::Study),
            "prior_first" => Some(ProcedureMode::PriorFirst),
            "during" => Some(ProcedureMode::During),
            "within_days" => Some(ProcedureMode::WithinDays),
            _ => None,
        }
    }
}

/// Fixed lookups of the Disposition module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispositionMode {
    TreatmentDiscontinuation,
    StudyDiscontinuation,
}

impl DispositionMode {
    const NAMES: &'static [&'static str] = &["treatment_discontinuation", "study_discontinuation"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionMode::TreatmentDiscontinuation => "treatment_discontinuation",
            DispositionMode::StudyDiscontinuation => "study_discontinuation",
        }
    }

    /// DSSCAT value selecting the disposition records of this lookup.
    pub fn category_code(&self) -> &'static str {
        match self {
            DispositionMode::TreatmentDiscontinuation => "END OF TREATMENT",
            DispositionMode::StudyDiscontinuation => "END OF STUDY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_mode(value).as_str() {
            "treatment_discontinuation" => Some(DispositionMode::TreatmentDiscontinuation),
            "study_discontinuation" => Some(DispositionMode::StudyDiscontinuation),
            _ => None,
        }
    }
}

/// Fixed lookups of the Dosing and Exposure module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureMode {
    /// First/last dose per treatment.
    Summary,
    /// Dose changes (increased, reduced, withdrawn).
    Modification,
    /// Doses delayed, held, interrupted or missed.
    Interruption,
}

impl ExposureMode {
    const NAMES: &'static [&'static str] = &["summary", "modification", "interruption"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureMode::Summary => "summary",
            ExposureMode::Modification => "modification",
            ExposureMode::Interruption => "interruption",
        }
    }

    /// Reason-for-adjustment terms matched against EXADJ. The two sets are disjoint.
    pub fn adjustment_terms(&self) -> &'static [&'static str] {
        match self {
            ExposureMode::Summary => &[],
            ExposureMode::Modification => &["Increased", "Withdrawn", "Reduced"],
            ExposureMode::Interruption => &["Delayed", "Held", "Interrupted", "Missed"],
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_mode(value).as_str() {
            "summary" => Some(ExposureMode::Summary),
            "modification" => Some(ExposureMode::Modification),
            "interruption" => Some(ExposureMode::Interruption),
            _ => None,
        }
    }
}

/// A module paired with one of the modes it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleQuery {
    Laboratory(TemporalMode),
    Medications(MedicationMode),
    Procedures(ProcedureMode),
    AdverseEvents(TemporalMode),
    VitalSigns(TemporalMode),
    Disposition(DispositionMode),
    DosingExposure(ExposureMode),
}

impl ModuleQuery {
    /// Pairs `module` with the mode named `mode`, or `None` when the module
    /// does not declare that mode.
    pub fn parse(module: QueryModule, mode: &str) -> Option<Self> {
        match module {
            QueryModule::Laboratory => TemporalMode::parse(mode).map(ModuleQuery::Laboratory),
            QueryModule::Medications => MedicationMode::parse(mode).map(ModuleQuery::Medications),
            QueryModule::Procedures => ProcedureMode::parse(mode).map(ModuleQuery::Procedures),
            QueryModule::AdverseEvents => TemporalMode::parse(mode).map(ModuleQuery::AdverseEvents),
            QueryModule::VitalSigns => TemporalMode::parse(mode).map(ModuleQuery::VitalSigns),
            QueryModule::Disposition => DispositionMode::parse(mode).map(ModuleQuery::Disposition),
            QueryModule::DosingExposure => {
                ExposureMode::parse(mode).map(ModuleQuery::DosingExposure)
            }
        }
    }

    pub fn module(&self) -> QueryModule {
        match self {
            ModuleQuery::Laboratory(_) => QueryModule::Laboratory,
            ModuleQuery::Medications(_) => QueryModule::Medications,
            ModuleQuery::Procedures(_) => QueryModule::Procedures,
            ModuleQuery::AdverseEvents(_) => QueryModule::AdverseEvents,
            ModuleQuery::VitalSigns(_) => QueryModule::VitalSigns,
            ModuleQuery::Disposition(_) => QueryModule::Disposition,
            ModuleQuery::DosingExposure(_) => QueryModule::DosingExposure,
        }
    }

    /// Wire name of the selected mode.
    pub fn mode_name(&self) -> &'static str {
        match self {
            ModuleQuery::Laboratory(mode)
            | ModuleQuery::AdverseEvents(mode)
            | ModuleQuery::VitalSigns(mode) => mode.as_str(),
            ModuleQuery::Medications(mode) => mode.as_str(),
            ModuleQuery::Procedures(mode) => mode.as_str(),
            ModuleQuery::Disposition(mode) => mode.as_str(),
            ModuleQuery::DosingExposure(mode) => mode.as_str(),
        }
    }
}

impl fmt::Display for ModuleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module().domain_code(), self.mode_name())
    }
}

fn normalize_mode(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

pub mod db;

use chrono::{DateTime, Utc};

use crate::report::{
    CanonicalSimulationReport, CharacterKey, Difficulty, ReportKey, StoredReportId,
};

pub use db::ReportDb;

/// The record a replacement removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Superseded {
    pub id: StoredReportId,
    /// `None` when the stored timestamp could not be read back.
    pub generated_at: Option<DateTime<Utc>>,
}

/// Storage boundary consumed by the merge engine. Implementations must make
/// `replace_report` atomic: at no point may a reader observe zero or two
/// current reports for one key.
pub trait ReportStore {
    fn replace_report(
        &self,
        report: &CanonicalSimulationReport,
    ) -> anyhow::Result<Option<Superseded>>;

    fn find_by_key(&self, key: &ReportKey) -> anyhow::Result<Option<CanonicalSimulationReport>>;

    fn find_by_id(&self, id: &str) -> anyhow::Result<Option<CanonicalSimulationReport>>;

    /// Current reports for the given characters, optionally on one difficulty.
    fn find_many(
        &self,
        characters: &[CharacterKey],
        difficulty: Option<Difficulty>,
    ) -> anyhow::Result<Vec<CanonicalSimulationReport>>;
}

use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::error::SimError;
use crate::ingest;
use crate::loot::{self, ItemId, LootCandidate};
use crate::reference::{ClassSpecTable, ItemTrackTable};
use crate::report::fetch::ReportFetcher;
use crate::report::parse;
use crate::report::{CanonicalSimulationReport, Character, CharacterKey, Difficulty};
use crate::store::{ReportDb, ReportStore};

pub type SharedService = Arc<GuildSim>;

/// Entry points the handler layer calls.
pub struct GuildSim {
    fetcher: ReportFetcher,
    db: ReportDb,
    tracks: &'static ItemTrackTable,
    specs: &'static ClassSpecTable,
}

impl GuildSim {
    pub fn new(
        fetcher: ReportFetcher,
        db: ReportDb,
        tracks: &'static ItemTrackTable,
        specs: &'static ClassSpecTable,
    ) -> Self {
        GuildSim {
            fetcher,
            db,
            tracks,
            specs,
        }
    }

    /// Wire up the service with the bundled reference tables.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let tracks = ItemTrackTable::bundled()?;
        let specs = ClassSpecTable::bundled()?;
        info!(
            "Loaded reference tables: {} item-track codes, {} specializations",
            tracks.len(),
            specs.len()
        );

        let fetcher = ReportFetcher::new(&config.report_base_url, config.fetch_timeout)?;
        let db = ReportDb::new(&config.data_dir)?;
        Ok(Self::new(fetcher, db, tracks, specs))
    }

    pub fn db(&self) -> &ReportDb {
        &self.db
    }

    /// Fetch, parse, and store a report; returns the stored entity.
    pub async fn ingest_report_from_reference(
        &self,
        reference: &str,
    ) -> Result<CanonicalSimulationReport, SimError> {
        let raw = self.fetcher.fetch(reference).await?;
        let parsed = parse::parse(&raw, self.tracks)?;
        let id = ingest::ingest(&self.db, self.specs, parsed)?;

        self.db.find_by_id(&id)?.ok_or_else(|| {
            SimError::Storage(anyhow::anyhow!("report {} vanished after being stored", id))
        })
    }

    pub fn report(&self, id: &str) -> Result<Option<CanonicalSimulationReport>, SimError> {
        Ok(self.db.find_by_id(id)?)
    }

    /// Current reports for every rostered character, all difficulties.
    pub fn latest_reports_for_roster(&self) -> Result<Vec<CanonicalSimulationReport>, SimError> {
        self.reports_for_roster(None)
    }

    pub fn project_upgrade_candidates(
        &self,
        item: ItemId,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<LootCandidate>, SimError> {
        let roster = self.db.list_roster()?;
        let reports = self.reports_for_roster(difficulty)?;
        Ok(loot::project(item, &reports, &roster))
    }

    pub fn roster(&self) -> Result<Vec<Character>, SimError> {
        Ok(self.db.list_roster()?)
    }

    pub fn add_to_roster(&self, character: &Character) -> Result<bool, SimError> {
        if character.name.is_empty() || character.realm.is_empty() {
            return Err(SimError::validation("character", "name and realm are required"));
        }
        Ok(self.db.add_character(character)?)
    }

    pub fn remove_from_roster(&self, key: &CharacterKey) -> Result<bool, SimError> {
        Ok(self.db.remove_character(key)?)
    }

    fn reports_for_roster(
        &self,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<CanonicalSimulationReport>, SimError> {
        let keys: Vec<CharacterKey> = self.db.list_roster()?.iter().map(Character::key).collect();
        Ok(self.db.find_many(&keys, difficulty)?)
    }
}

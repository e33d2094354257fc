use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::reference::ClassSpecTable;
use crate::report::{CanonicalSimulationReport, ParsedReport, StoredReportId};
use crate::store::ReportStore;

/// Normalize a parsed report and store it as the current report for its
/// (character, realm, difficulty) key, replacing any previous one whole.
pub fn ingest<S: ReportStore + ?Sized>(
    store: &S,
    specs: &ClassSpecTable,
    parsed: ParsedReport,
) -> Result<StoredReportId, SimError> {
    let report = normalize(specs, parsed)?;

    let superseded = store.replace_report(&report)?;
    if let Some(previous) = superseded {
        if let Some(previous_at) = previous.generated_at.filter(|at| *at > report.generated_at) {
            warn!(
                "Report {} for {} ({}) was generated at {}, before the report {} it replaced ({})",
                report.id,
                report.character,
                report.raid_difficulty,
                report.generated_at,
                previous.id,
                previous_at
            );
        }
    }

    Ok(report.id)
}

/// Build the stored entity: resolve the specialization (fail-closed), keep
/// only positive gains, and derive the content id.
pub fn normalize(
    specs: &ClassSpecTable,
    parsed: ParsedReport,
) -> Result<CanonicalSimulationReport, SimError> {
    let specialization = specs.resolve(parsed.spec_id)?;

    let total = parsed.upgrades.len();
    let upgrades: Vec<_> = parsed
        .upgrades
        .into_iter()
        .filter(|u| u.dps_gain > 0.0)
        .collect();
    if upgrades.len() < total {
        debug!(
            "Discarded {} non-positive upgrade rows for {}",
            total - upgrades.len(),
            parsed.character
        );
    }

    let raw_tabular_sha256 = hex::encode(Sha256::digest(parsed.raw_tabular.as_bytes()));

    let mut report = CanonicalSimulationReport {
        id: String::new(),
        character: parsed.character,
        specialization,
        spec_id: parsed.spec_id,
        raid_difficulty: parsed.difficulty,
        fight_style: parsed.fight_style,
        duration_secs: parsed.duration_secs,
        target_count: parsed.target_count,
        generated_at: parsed.generated_at,
        source_url: parsed.source_url,
        raw_tabular: parsed.raw_tabular,
        raw_tabular_sha256,
        equipped_items: parsed.equipped_items,
        upgrades,
    };
    report.id = report_id(&report);

    info!(
        "Normalized report for {} ({} {}, {}): {} upgrades, {} equipped",
        report.character,
        report.specialization.specialization,
        report.specialization.class,
        report.raid_difficulty,
        report.upgrades.len(),
        report.equipped_items.len()
    );
    Ok(report)
}

/// Same key, generation time, source and payload -> same id.
fn report_id(report: &CanonicalSimulationReport) -> StoredReportId {
    let key = report.key();
    let generated_at = report.generated_at.to_rfc3339();
    let parts: [&str; 6] = [
        &key.character.name,
        &key.character.realm,
        key.difficulty.as_str(),
        &generated_at,
        &report.source_url,
        &report.raw_tabular_sha256,
    ];
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let mut id = hex::encode(hasher.finalize());
    id.truncate(32);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ItemTrackTable, Specialization, TrackTier, UpgradeDescriptor, WowClass};
    use crate::report::parse::parse;
    use crate::report::{Difficulty, RawReport, ReportKey};
    use crate::store::ReportDb;
    use bytes::Bytes;
    use serde_json::json;

    const HEADER: &str = "character,realm,slot,item_id,item_level,bonus_ids,dps,dps_gain,kind";

    fn tracks() -> ItemTrackTable {
        ItemTrackTable::from_entries([(
            42,
            UpgradeDescriptor {
                tier: TrackTier::Myth,
                level: 2,
                max_level: 8,
                item_level: 623,
            },
        )])
    }

    fn specs() -> &'static ClassSpecTable {
        ClassSpecTable::bundled().unwrap()
    }

    fn parsed(spec_id: u32, date: &str, rows: &[&str]) -> ParsedReport {
        let structured = json!({
            "character": {"name": "Thrall", "realm": "Draenor"},
            "difficulty": "Mythic",
            "specId": spec_id,
            "fightStyle": "Patchwerk",
            "duration": 300,
            "targets": 1,
            "date": date
        });
        let tabular = format!("{}\n{}\n", HEADER, rows.join("\n"));
        let raw = RawReport {
            source_url: "https://reports.example/r/abc/".to_string(),
            tabular: Bytes::from(tabular),
            structured: Bytes::from(structured.to_string()),
        };
        parse(&raw, &tracks()).unwrap()
    }

    fn thrall_mythic() -> ReportKey {
        ReportKey {
            character: crate::report::Character::new("Thrall", "Draenor").key(),
            difficulty: Difficulty::Mythic,
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let db = ReportDb::open_in_memory().unwrap();
        let p = parsed(
            253,
            "2024-01-01T00:00:00Z",
            &["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"],
        );
        let id = ingest(&db, specs(), p).unwrap();

        let stored = db.find_by_id(&id).unwrap().unwrap();
        assert_eq!(stored.raid_difficulty, Difficulty::Mythic);
        assert_eq!(stored.specialization.class, WowClass::Hunter);
        assert_eq!(stored.specialization.specialization, Specialization::BeastMastery);
        assert_eq!(stored.upgrades.len(), 1);
        assert_eq!(stored.upgrades[0].item_id, 100);
        assert_eq!(stored.upgrades[0].dps_gain, 1200.0);
        assert_eq!(stored.upgrades[0].upgrade.item_level, 623);
    }

    #[test]
    fn test_non_positive_gains_dropped_raw_kept() {
        let db = ReportDb::open_in_memory().unwrap();
        let p = parsed(
            253,
            "2024-01-01T00:00:00Z",
            &[
                "Thrall,Draenor,trinket1,100,,42,50000,1200,candidate",
                "Thrall,Draenor,trinket2,101,,42,48000,-800,candidate",
                "Thrall,Draenor,neck,102,,42,48800,0,candidate",
            ],
        );
        let raw = p.raw_tabular.clone();
        let id = ingest(&db, specs(), p).unwrap();

        let stored = db.find_by_id(&id).unwrap().unwrap();
        assert!(stored.upgrades.iter().all(|u| u.dps_gain > 0.0));
        assert_eq!(stored.upgrades.len(), 1);
        assert_eq!(stored.raw_tabular, raw);
        assert!(stored.raw_tabular.contains("-800"));
        assert_eq!(stored.raw_tabular_sha256.len(), 64);
    }

    #[test]
    fn test_ingest_twice_is_idempotent() {
        let db = ReportDb::open_in_memory().unwrap();
        let rows = ["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"];
        let first_id = ingest(&db, specs(), parsed(253, "2024-01-01T00:00:00Z", &rows)).unwrap();
        let first = db.find_by_key(&thrall_mythic()).unwrap().unwrap();

        let second_id = ingest(&db, specs(), parsed(253, "2024-01-01T00:00:00Z", &rows)).unwrap();
        let second = db.find_by_key(&thrall_mythic()).unwrap().unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(first, second);
        assert_eq!(db.report_count().unwrap(), 1);
    }

    #[test]
    fn test_newer_report_supersedes() {
        let db = ReportDb::open_in_memory().unwrap();
        let a = ingest(
            &db,
            specs(),
            parsed(
                253,
                "2024-01-01T00:00:00Z",
                &["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"],
            ),
        )
        .unwrap();
        let b = ingest(
            &db,
            specs(),
            parsed(
                254,
                "2024-01-08T00:00:00Z",
                &["Thrall,Draenor,trinket1,200,,42,51000,300,candidate"],
            ),
        )
        .unwrap();
        assert_ne!(a, b);

        assert_eq!(db.report_count().unwrap(), 1);
        assert!(db.find_by_id(&a).unwrap().is_none());
        let current = db.find_by_key(&thrall_mythic()).unwrap().unwrap();
        assert_eq!(current.id, b);
        assert_eq!(current.specialization.specialization, Specialization::Marksmanship);
        assert_eq!(current.upgrades[0].item_id, 200);
    }

    #[test]
    fn test_older_report_still_replaces() {
        let db = ReportDb::open_in_memory().unwrap();
        let row = ["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"];
        ingest(&db, specs(), parsed(253, "2024-02-01T00:00:00Z", &row)).unwrap();
        let older = ingest(&db, specs(), parsed(253, "2024-01-01T00:00:00Z", &row)).unwrap();
        assert_eq!(db.find_by_key(&thrall_mythic()).unwrap().unwrap().id, older);
    }

    #[test]
    fn test_unknown_spec_aborts_without_writing() {
        let db = ReportDb::open_in_memory().unwrap();
        let p = parsed(
            999_999,
            "2024-01-01T00:00:00Z",
            &["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"],
        );
        match ingest(&db, specs(), p) {
            Err(SimError::UnknownSpecId { id }) => assert_eq!(id, 999_999),
            other => panic!("expected UnknownSpecId, got {:?}", other),
        }
        assert_eq!(db.report_count().unwrap(), 0);
    }

    #[test]
    fn test_unknown_spec_keeps_previous_report() {
        let db = ReportDb::open_in_memory().unwrap();
        let row = ["Thrall,Draenor,trinket1,100,,42,50000,1200,candidate"];
        let kept = ingest(&db, specs(), parsed(253, "2024-01-01T00:00:00Z", &row)).unwrap();
        assert!(ingest(&db, specs(), parsed(1, "2024-02-01T00:00:00Z", &row)).is_err());
        assert_eq!(db.find_by_key(&thrall_mythic()).unwrap().unwrap().id, kept);
    }
}

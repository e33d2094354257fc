use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

use super::{ReportStore, Superseded};
use crate::config::DB_FILE_NAME;
use crate::reference::{ClassSpecPair, UpgradeDescriptor};
use crate::report::{
    CanonicalSimulationReport, Character, CharacterKey, Difficulty, ItemSnapshot, ReportKey,
    UpgradeCandidate,
};

pub struct ReportDb {
    conn: Mutex<Connection>,
}

impl ReportDb {
    pub fn new(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
        )?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sim_reports (
                id TEXT PRIMARY KEY,
                character_name TEXT NOT NULL,
                character_key TEXT NOT NULL,
                realm TEXT NOT NULL,
                realm_slug TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                class TEXT NOT NULL,
                spec TEXT NOT NULL,
                spec_id INTEGER NOT NULL,
                fight_style TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                target_count INTEGER NOT NULL,
                generated_at TEXT NOT NULL,
                source_url TEXT NOT NULL,
                raw_tabular TEXT NOT NULL,
                raw_tabular_sha256 TEXT NOT NULL,
                ingested_at TEXT NOT NULL,
                UNIQUE (character_key, realm_slug, difficulty)
            );

            CREATE TABLE IF NOT EXISTS sim_report_equipped (
                report_id TEXT NOT NULL REFERENCES sim_reports(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                slot TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                item_level INTEGER,
                bonus_ids TEXT NOT NULL,
                track_tier TEXT,
                track_level INTEGER,
                track_max_level INTEGER,
                track_item_level INTEGER,
                PRIMARY KEY (report_id, position)
            );

            CREATE TABLE IF NOT EXISTS sim_report_upgrades (
                report_id TEXT NOT NULL REFERENCES sim_reports(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                slot TEXT NOT NULL,
                bonus_ids TEXT NOT NULL,
                track_tier TEXT NOT NULL,
                track_level INTEGER NOT NULL,
                track_max_level INTEGER NOT NULL,
                track_item_level INTEGER NOT NULL,
                difficulty TEXT,
                dps REAL NOT NULL,
                dps_gain REAL NOT NULL,
                PRIMARY KEY (report_id, position)
            );

            CREATE TABLE IF NOT EXISTS roster (
                character_key TEXT NOT NULL,
                realm_slug TEXT NOT NULL,
                name TEXT NOT NULL,
                realm TEXT NOT NULL,
                added_at TEXT NOT NULL,
                PRIMARY KEY (character_key, realm_slug)
            );

            CREATE INDEX IF NOT EXISTS idx_up_item ON sim_report_upgrades(item_id);
        ",
        )?;
        Ok(())
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Returns false when the character was already rostered.
    pub fn add_character(&self, character: &Character) -> anyhow::Result<bool> {
        let key = character.key();
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO roster (character_key, realm_slug, name, realm, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.name,
                key.realm,
                character.name,
                character.realm,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_character(&self, key: &CharacterKey) -> anyhow::Result<bool> {
        let conn = self.conn();
        let removed = conn.execute(
            "DELETE FROM roster WHERE character_key = ?1 AND realm_slug = ?2",
            params![key.name, key.realm],
        )?;
        Ok(removed > 0)
    }

    pub fn list_roster(&self) -> anyhow::Result<Vec<Character>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT name, realm FROM roster ORDER BY character_key, realm_slug")?;
        let rows = stmt.query_map([], |row| {
            Ok(Character {
                name: row.get(0)?,
                realm: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn report_count(&self) -> anyhow::Result<i64> {
        let conn = self.conn();
        Ok(conn.query_row("SELECT COUNT(*) FROM sim_reports", [], |row| row.get(0))?)
    }
}

impl ReportStore for ReportDb {
    fn replace_report(
        &self,
        report: &CanonicalSimulationReport,
    ) -> anyhow::Result<Option<Superseded>> {
        let key = report.key();
        let mut conn = self.conn();
        // IMMEDIATE takes the write lock up front, so concurrent replacements
        // of one key (from any process) serialize instead of interleaving.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = tx
            .query_row(
                "SELECT id, generated_at FROM sim_reports
                 WHERE character_key = ?1 AND realm_slug = ?2 AND difficulty = ?3",
                params![key.character.name, key.character.realm, key.difficulty.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        if let Some((old_id, _)) = &previous {
            tx.execute("DELETE FROM sim_reports WHERE id = ?1", [old_id])?;
        }
        insert_report(&tx, report)?;

        // An unreadable timestamp on the old row must not fail the write.
        let superseded = previous.map(|(id, generated_at)| {
            let generated_at = match parse_timestamp(&generated_at) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(
                        "Superseded report {} has unreadable generated_at '{}': {}",
                        id, generated_at, e
                    );
                    None
                }
            };
            Superseded { id, generated_at }
        });
        tx.commit()?;

        info!(
            "Stored report {} for {} ({}){}",
            report.id,
            report.character,
            report.raid_difficulty,
            superseded
                .as_ref()
                .map(|s| format!(", superseding {}", s.id))
                .unwrap_or_default()
        );
        Ok(superseded)
    }

    fn find_by_key(&self, key: &ReportKey) -> anyhow::Result<Option<CanonicalSimulationReport>> {
        let conn = self.conn();
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM sim_reports
                 WHERE character_key = ?1 AND realm_slug = ?2 AND difficulty = ?3",
                params![key.character.name, key.character.realm, key.difficulty.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => load_report(&conn, &id),
            None => Ok(None),
        }
    }

    fn find_by_id(&self, id: &str) -> anyhow::Result<Option<CanonicalSimulationReport>> {
        let conn = self.conn();
        load_report(&conn, id)
    }

    fn find_many(
        &self,
        characters: &[CharacterKey],
        difficulty: Option<Difficulty>,
    ) -> anyhow::Result<Vec<CanonicalSimulationReport>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id FROM sim_reports
             WHERE character_key = ?1 AND realm_slug = ?2 AND (?3 IS NULL OR difficulty = ?3)",
        )?;

        let mut reports = Vec::new();
        for key in characters {
            let ids = stmt
                .query_map(
                    params![key.name, key.realm, difficulty.map(|d| d.as_str())],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<Result<Vec<_>, _>>()?;
            for id in ids {
                if let Some(report) = load_report(&conn, &id)? {
                    reports.push(report);
                }
            }
        }
        reports.sort_by(|a, b| {
            a.character
                .key()
                .cmp(&b.character.key())
                .then(a.raid_difficulty.cmp(&b.raid_difficulty))
        });
        Ok(reports)
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn insert_report(conn: &Connection, report: &CanonicalSimulationReport) -> anyhow::Result<()> {
    let key = report.key();
    conn.execute(
        "INSERT INTO sim_reports (
            id, character_name, character_key, realm, realm_slug, difficulty, class, spec,
            spec_id, fight_style, duration_secs, target_count, generated_at, source_url,
            raw_tabular, raw_tabular_sha256, ingested_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            report.id,
            report.character.name,
            key.character.name,
            report.character.realm,
            key.character.realm,
            report.raid_difficulty.as_str(),
            report.specialization.class.as_str(),
            report.specialization.specialization.as_str(),
            report.spec_id,
            report.fight_style.as_str(),
            report.duration_secs,
            report.target_count,
            report.generated_at.to_rfc3339(),
            report.source_url,
            report.raw_tabular,
            report.raw_tabular_sha256,
            Utc::now().to_rfc3339(),
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO sim_report_equipped (
            report_id, position, slot, item_id, item_level, bonus_ids,
            track_tier, track_level, track_max_level, track_item_level
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for (pos, item) in report.equipped_items.iter().enumerate() {
        stmt.execute(params![
            report.id,
            pos as i64,
            item.slot,
            item.item_id,
            item.item_level,
            serde_json::to_string(&item.bonus_ids)?,
            item.track.map(|t| t.tier.as_str()),
            item.track.map(|t| t.level),
            item.track.map(|t| t.max_level),
            item.track.map(|t| t.item_level),
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO sim_report_upgrades (
            report_id, position, item_id, slot, bonus_ids, track_tier, track_level,
            track_max_level, track_item_level, difficulty, dps, dps_gain
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for (pos, up) in report.upgrades.iter().enumerate() {
        stmt.execute(params![
            report.id,
            pos as i64,
            up.item_id,
            up.slot,
            serde_json::to_string(&up.bonus_ids)?,
            up.upgrade.tier.as_str(),
            up.upgrade.level,
            up.upgrade.max_level,
            up.upgrade.item_level,
            up.difficulty.map(|d| d.as_str()),
            up.dps,
            up.dps_gain,
        ])?;
    }
    Ok(())
}

struct ReportRow {
    id: String,
    character_name: String,
    realm: String,
    difficulty: String,
    class: String,
    spec: String,
    spec_id: u32,
    fight_style: String,
    duration_secs: u32,
    target_count: u32,
    generated_at: String,
    source_url: String,
    raw_tabular: String,
    raw_tabular_sha256: String,
}

struct TrackColumns {
    tier: Option<String>,
    level: Option<u8>,
    max_level: Option<u8>,
    item_level: Option<u32>,
}

impl TrackColumns {
    fn into_descriptor(self) -> anyhow::Result<Option<UpgradeDescriptor>> {
        match (self.tier, self.level, self.max_level, self.item_level) {
            (Some(tier), Some(level), Some(max_level), Some(item_level)) => {
                Ok(Some(UpgradeDescriptor {
                    tier: tier.parse().map_err(anyhow::Error::msg)?,
                    level,
                    max_level,
                    item_level,
                }))
            }
            (None, _, _, _) => Ok(None),
            _ => anyhow::bail!("incomplete upgrade track columns"),
        }
    }
}

fn load_report(conn: &Connection, id: &str) -> anyhow::Result<Option<CanonicalSimulationReport>> {
    let row = conn
        .query_row(
            "SELECT id, character_name, realm, difficulty, class, spec, spec_id, fight_style,
                    duration_secs, target_count, generated_at, source_url, raw_tabular,
                    raw_tabular_sha256
             FROM sim_reports WHERE id = ?1",
            [id],
            |row| {
                Ok(ReportRow {
                    id: row.get(0)?,
                    character_name: row.get(1)?,
                    realm: row.get(2)?,
                    difficulty: row.get(3)?,
                    class: row.get(4)?,
                    spec: row.get(5)?,
                    spec_id: row.get(6)?,
                    fight_style: row.get(7)?,
                    duration_secs: row.get(8)?,
                    target_count: row.get(9)?,
                    generated_at: row.get(10)?,
                    source_url: row.get(11)?,
                    raw_tabular: row.get(12)?,
                    raw_tabular_sha256: row.get(13)?,
                })
            },
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT slot, item_id, item_level, bonus_ids,
                track_tier, track_level, track_max_level, track_item_level
         FROM sim_report_equipped WHERE report_id = ?1 ORDER BY position",
    )?;
    let equipped_rows = stmt
        .query_map([id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, u32>(1)?,
                r.get::<_, Option<u32>>(2)?,
                r.get::<_, String>(3)?,
                TrackColumns {
                    tier: r.get(4)?,
                    level: r.get(5)?,
                    max_level: r.get(6)?,
                    item_level: r.get(7)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let mut equipped_items = Vec::with_capacity(equipped_rows.len());
    for (slot, item_id, item_level, bonus_ids, track) in equipped_rows {
        equipped_items.push(ItemSnapshot {
            slot,
            item_id,
            item_level,
            bonus_ids: serde_json::from_str(&bonus_ids)?,
            track: track.into_descriptor()?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT item_id, slot, bonus_ids, track_tier, track_level, track_max_level,
                track_item_level, difficulty, dps, dps_gain
         FROM sim_report_upgrades WHERE report_id = ?1 ORDER BY position",
    )?;
    let upgrade_rows = stmt
        .query_map([id], |r| {
            Ok((
                r.get::<_, u32>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                TrackColumns {
                    tier: r.get(3)?,
                    level: r.get(4)?,
                    max_level: r.get(5)?,
                    item_level: r.get(6)?,
                },
                r.get::<_, Option<String>>(7)?,
                r.get::<_, f64>(8)?,
                r.get::<_, f64>(9)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let mut upgrades = Vec::with_capacity(upgrade_rows.len());
    for (item_id, slot, bonus_ids, track, difficulty, dps, dps_gain) in upgrade_rows {
        let upgrade = track
            .into_descriptor()?
            .ok_or_else(|| anyhow::anyhow!("upgrade row without a track in report {}", id))?;
        upgrades.push(UpgradeCandidate {
            item_id,
            slot,
            bonus_ids: serde_json::from_str(&bonus_ids)?,
            upgrade,
            difficulty: difficulty
                .map(|d| d.parse::<Difficulty>())
                .transpose()
                .map_err(anyhow::Error::msg)?,
            dps,
            dps_gain,
        });
    }

    Ok(Some(CanonicalSimulationReport {
        id: row.id,
        character: Character {
            name: row.character_name,
            realm: row.realm,
        },
        specialization: ClassSpecPair {
            class: row.class.parse().map_err(anyhow::Error::msg)?,
            specialization: row.spec.parse().map_err(anyhow::Error::msg)?,
        },
        spec_id: row.spec_id,
        raid_difficulty: row.difficulty.parse().map_err(anyhow::Error::msg)?,
        fight_style: row.fight_style.parse().map_err(anyhow::Error::msg)?,
        duration_secs: row.duration_secs,
        target_count: row.target_count,
        generated_at: parse_timestamp(&row.generated_at)?,
        source_url: row.source_url,
        raw_tabular: row.raw_tabular,
        raw_tabular_sha256: row.raw_tabular_sha256,
        equipped_items,
        upgrades,
    }))
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Specialization, TrackTier, WowClass};
    use crate::report::FightStyle;

    fn report(id: &str, name: &str, difficulty: Difficulty, gain: f64) -> CanonicalSimulationReport {
        let myth = UpgradeDescriptor {
            tier: TrackTier::Myth,
            level: 2,
            max_level: 8,
            item_level: 623,
        };
        CanonicalSimulationReport {
            id: id.to_string(),
            character: Character::new(name, "Area 52"),
            specialization: ClassSpecPair {
                class: WowClass::Hunter,
                specialization: Specialization::BeastMastery,
            },
            spec_id: 253,
            raid_difficulty: difficulty,
            fight_style: FightStyle::Patchwerk,
            duration_secs: 300,
            target_count: 1,
            generated_at: parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
            source_url: "https://reports.example/r/abc/".to_string(),
            raw_tabular: "raw".to_string(),
            raw_tabular_sha256: "digest".to_string(),
            equipped_items: vec![
                ItemSnapshot {
                    slot: "head".to_string(),
                    item_id: 1,
                    item_level: Some(619),
                    bonus_ids: vec![10335, 6652],
                    track: Some(myth),
                },
                ItemSnapshot {
                    slot: "neck".to_string(),
                    item_id: 2,
                    item_level: None,
                    bonus_ids: vec![],
                    track: None,
                },
            ],
            upgrades: vec![UpgradeCandidate {
                item_id: 100,
                slot: "trinket1".to_string(),
                bonus_ids: vec![42],
                upgrade: myth,
                difficulty: Some(Difficulty::Mythic),
                dps: 50_000.5,
                dps_gain: gain,
            }],
        }
    }

    fn child_rows(db: &ReportDb, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_replace_then_read_back_is_identical() {
        let db = ReportDb::open_in_memory().unwrap();
        let r = report("a1", "Thrall", Difficulty::Mythic, 1200.25);
        assert!(db.replace_report(&r).unwrap().is_none());

        assert_eq!(db.find_by_id("a1").unwrap(), Some(r.clone()));
        assert_eq!(db.find_by_key(&r.key()).unwrap(), Some(r));
    }

    #[test]
    fn test_replace_supersedes_same_key() {
        let db = ReportDb::open_in_memory().unwrap();
        db.replace_report(&report("a1", "Thrall", Difficulty::Mythic, 100.0))
            .unwrap();
        let superseded = db
            .replace_report(&report("b2", "thrall", Difficulty::Mythic, 900.0))
            .unwrap()
            .unwrap();
        assert_eq!(superseded.id, "a1");

        assert_eq!(db.report_count().unwrap(), 1);
        assert!(db.find_by_id("a1").unwrap().is_none());
        assert_eq!(child_rows(&db, "sim_report_upgrades"), 1);
        assert_eq!(child_rows(&db, "sim_report_equipped"), 2);
    }

    #[test]
    fn test_unreadable_superseded_timestamp_does_not_fail_replace() {
        let db = ReportDb::open_in_memory().unwrap();
        db.replace_report(&report("a1", "Thrall", Difficulty::Mythic, 100.0))
            .unwrap();
        db.conn()
            .execute("UPDATE sim_reports SET generated_at = 'last tuesday' WHERE id = 'a1'", [])
            .unwrap();

        let superseded = db
            .replace_report(&report("b2", "Thrall", Difficulty::Mythic, 900.0))
            .unwrap()
            .unwrap();
        assert_eq!(superseded.id, "a1");
        assert!(superseded.generated_at.is_none());
        assert_eq!(db.report_count().unwrap(), 1);
        assert!(db.find_by_id("b2").unwrap().is_some());
    }

    #[test]
    fn test_concurrent_replacements_across_connections_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let first = ReportDb::new(dir.path()).unwrap();
        let second = ReportDb::new(dir.path()).unwrap();

        let a = report("a1", "Thrall", Difficulty::Mythic, 100.0);
        let mut b = report("b2", "thrall", Difficulty::Mythic, 900.0);
        b.equipped_items.truncate(1);
        let mut extra = b.upgrades[0].clone();
        extra.item_id = 101;
        extra.slot = "trinket2".to_string();
        b.upgrades.push(extra);

        first.replace_report(&a).unwrap();
        let key = a.key();

        std::thread::scope(|scope| {
            for (i, db) in [&first, &second, &first, &second].into_iter().enumerate() {
                let (a, b) = (&a, &b);
                scope.spawn(move || {
                    for round in 0..25 {
                        let next = if (i + round) % 2 == 0 { a } else { b };
                        db.replace_report(next).unwrap();
                    }
                });
            }
            let second = &second;
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(second.report_count().unwrap(), 1);
                }
            });
        });

        assert_eq!(first.report_count().unwrap(), 1);
        let stored = second.find_by_key(&key).unwrap().unwrap();
        let expected = if stored.id == "a1" { &a } else { &b };
        assert_eq!(&stored, expected);
        assert_eq!(
            child_rows(&first, "sim_report_upgrades") as usize,
            expected.upgrades.len()
        );
        assert_eq!(
            child_rows(&first, "sim_report_equipped") as usize,
            expected.equipped_items.len()
        );
    }

    #[test]
    fn test_difficulties_are_separate_keys() {
        let db = ReportDb::open_in_memory().unwrap();
        db.replace_report(&report("m", "Thrall", Difficulty::Mythic, 1.0))
            .unwrap();
        db.replace_report(&report("h", "Thrall", Difficulty::Heroic, 1.0))
            .unwrap();
        assert_eq!(db.report_count().unwrap(), 2);

        let key = Character::new("Thrall", "Area 52").key();
        let all = db.find_many(&[key.clone()], None).unwrap();
        let difficulties: Vec<Difficulty> = all.iter().map(|r| r.raid_difficulty).collect();
        assert_eq!(difficulties, vec![Difficulty::Heroic, Difficulty::Mythic]);

        let mythic = db.find_many(&[key], Some(Difficulty::Mythic)).unwrap();
        assert_eq!(mythic.len(), 1);
        assert_eq!(mythic[0].id, "m");
    }

    #[test]
    fn test_roster_add_list_remove() {
        let db = ReportDb::open_in_memory().unwrap();
        assert!(db.add_character(&Character::new("Thrall", "Area 52")).unwrap());
        assert!(!db.add_character(&Character::new("thrall", "area-52")).unwrap());
        assert!(db.add_character(&Character::new("Jaina", "Draenor")).unwrap());

        let names: Vec<String> = db.list_roster().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Jaina", "Thrall"]);

        assert!(db
            .remove_character(&Character::new("THRALL", "Area 52").key())
            .unwrap());
        assert_eq!(db.list_roster().unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_db_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = ReportDb::new(dir.path()).unwrap();
            db.replace_report(&report("a1", "Thrall", Difficulty::Mythic, 5.0))
                .unwrap();
        }
        let db = ReportDb::new(dir.path()).unwrap();
        assert!(db.find_by_id("a1").unwrap().is_some());
        assert!(dir.path().join(DB_FILE_NAME).exists());
    }
}

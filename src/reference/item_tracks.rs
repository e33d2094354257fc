//! Item-track resolution: bonus ids (item modifier codes) to upgrade tiers.
//!
//! The table maps a single modifier code to the upgrade track it encodes. An
//! item instance carries many codes, but at most one of them is a track code,
//! so resolution is a hash lookup per code in input order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

use super::{bundled_text, table_lines, ITEM_TRACKS_FILE};
use crate::error::SimError;
use crate::report::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackTier {
    Explorer,
    Adventurer,
    Veteran,
    Champion,
    Hero,
    Myth,
}

impl TrackTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackTier::Explorer => "Explorer",
            TrackTier::Adventurer => "Adventurer",
            TrackTier::Veteran => "Veteran",
            TrackTier::Champion => "Champion",
            TrackTier::Hero => "Hero",
            TrackTier::Myth => "Myth",
        }
    }

    /// Raid difficulty that drops this track. Only the three raid tracks map.
    pub fn difficulty(&self) -> Option<Difficulty> {
        match self {
            TrackTier::Champion => Some(Difficulty::Normal),
            TrackTier::Hero => Some(Difficulty::Heroic),
            TrackTier::Myth => Some(Difficulty::Mythic),
            _ => None,
        }
    }
}

impl fmt::Display for TrackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explorer" => Ok(TrackTier::Explorer),
            "adventurer" => Ok(TrackTier::Adventurer),
            "veteran" => Ok(TrackTier::Veteran),
            "champion" => Ok(TrackTier::Champion),
            "hero" => Ok(TrackTier::Hero),
            "myth" => Ok(TrackTier::Myth),
            other => Err(format!("unknown upgrade track '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDescriptor {
    pub tier: TrackTier,
    pub level: u8,
    pub max_level: u8,
    pub item_level: u32,
}

impl UpgradeDescriptor {
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.tier.difficulty()
    }
}

impl fmt::Display for UpgradeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} (ilvl {})",
            self.tier, self.level, self.max_level, self.item_level
        )
    }
}

/// Read-only modifier-code -> upgrade descriptor map.
#[derive(Debug, Clone, Default)]
pub struct ItemTrackTable {
    by_code: HashMap<u32, UpgradeDescriptor>,
}

static BUNDLED: OnceLock<Result<ItemTrackTable, String>> = OnceLock::new();

impl ItemTrackTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, UpgradeDescriptor)>) -> Self {
        ItemTrackTable {
            by_code: entries.into_iter().collect(),
        }
    }

    /// Parse `bonus_id,track,level,max_level,item_level` rows.
    pub fn from_csv(text: &str) -> Result<Self, SimError> {
        let mut by_code = HashMap::new();
        for (line_no, line) in table_lines(text) {
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            if cols.len() != 5 {
                return Err(SimError::ReferenceTable(format!(
                    "{} line {}: expected 5 columns, got {}",
                    ITEM_TRACKS_FILE,
                    line_no,
                    cols.len()
                )));
            }
            let bad = |what: &str| {
                SimError::ReferenceTable(format!(
                    "{} line {}: invalid {}",
                    ITEM_TRACKS_FILE, line_no, what
                ))
            };
            let code: u32 = cols[0].parse().map_err(|_| bad("bonus_id"))?;
            let tier: TrackTier = cols[1].parse().map_err(|_| bad("track"))?;
            let level: u8 = cols[2].parse().map_err(|_| bad("level"))?;
            let max_level: u8 = cols[3].parse().map_err(|_| bad("max_level"))?;
            let item_level: u32 = cols[4].parse().map_err(|_| bad("item_level"))?;
            if level == 0 || level > max_level {
                return Err(bad("level (must be within 1..=max_level)"));
            }

            let descriptor = UpgradeDescriptor {
                tier,
                level,
                max_level,
                item_level,
            };
            if by_code.insert(code, descriptor).is_some() {
                return Err(SimError::ReferenceTable(format!(
                    "{} line {}: duplicate bonus_id {}",
                    ITEM_TRACKS_FILE, line_no, code
                )));
            }
        }
        Ok(ItemTrackTable { by_code })
    }

    /// The table shipped in `data/`, parsed once per process.
    pub fn bundled() -> Result<&'static ItemTrackTable, SimError> {
        BUNDLED
            .get_or_init(|| {
                bundled_text(ITEM_TRACKS_FILE)
                    .and_then(|text| ItemTrackTable::from_csv(&text))
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| SimError::ReferenceTable(e.clone()))
    }

    /// First code (in input order) that names a track wins. No match is
    /// normal for untracked items and only logged.
    pub fn resolve(&self, codes: &[u32]) -> Option<UpgradeDescriptor> {
        let found = codes.iter().find_map(|code| self.by_code.get(code).copied());
        if found.is_none() {
            debug!("No upgrade track for modifier codes {:?}", codes);
        }
        found
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn myth_2_of_8() -> UpgradeDescriptor {
        UpgradeDescriptor {
            tier: TrackTier::Myth,
            level: 2,
            max_level: 8,
            item_level: 623,
        }
    }

    fn table() -> ItemTrackTable {
        ItemTrackTable::from_entries([(42, myth_2_of_8())])
    }

    #[test]
    fn test_resolve_empty_is_absent() {
        assert_eq!(table().resolve(&[]), None);
    }

    #[test]
    fn test_resolve_unknown_code_is_absent() {
        assert_eq!(table().resolve(&[7]), None);
    }

    #[test]
    fn test_resolve_known_code_any_position() {
        let t = table();
        assert_eq!(t.resolve(&[42, 7]), Some(myth_2_of_8()));
        assert_eq!(t.resolve(&[7, 42]), Some(myth_2_of_8()));
    }

    #[test]
    fn test_resolve_first_track_code_wins() {
        let hero = UpgradeDescriptor {
            tier: TrackTier::Hero,
            level: 1,
            max_level: 6,
            item_level: 610,
        };
        let t = ItemTrackTable::from_entries([(42, myth_2_of_8()), (43, hero)]);
        assert_eq!(t.resolve(&[43, 42]), Some(hero));
    }

    #[test]
    fn test_difficulty_inference() {
        assert_eq!(TrackTier::Champion.difficulty(), Some(Difficulty::Normal));
        assert_eq!(TrackTier::Hero.difficulty(), Some(Difficulty::Heroic));
        assert_eq!(TrackTier::Myth.difficulty(), Some(Difficulty::Mythic));
        assert_eq!(TrackTier::Veteran.difficulty(), None);
        assert_eq!(TrackTier::Explorer.difficulty(), None);
    }

    #[test]
    fn test_from_csv_rejects_duplicates() {
        let csv = "bonus_id,track,level,max_level,item_level\n1,Myth,1,6,623\n1,Hero,1,6,610\n";
        let err = ItemTrackTable::from_csv(csv).unwrap_err();
        assert!(err.to_string().contains("duplicate bonus_id 1"));
    }

    #[test]
    fn test_from_csv_rejects_level_above_max() {
        let csv = "bonus_id,track,level,max_level,item_level\n1,Myth,7,6,623\n";
        assert!(ItemTrackTable::from_csv(csv).is_err());
    }

    #[test]
    fn test_bundled_table_loads_once() {
        let a = ItemTrackTable::bundled().unwrap();
        let b = ItemTrackTable::bundled().unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(!a.is_empty());
    }

    #[test]
    fn test_bundled_raid_tracks_infer_difficulty() {
        let t = ItemTrackTable::bundled().unwrap();
        let myth = t.resolve(&[10335]).unwrap();
        assert_eq!(myth.tier, TrackTier::Myth);
        assert_eq!(myth.level, 1);
        assert_eq!(myth.difficulty(), Some(Difficulty::Mythic));
    }
}

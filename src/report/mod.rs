pub mod fetch;
pub mod parse;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::reference::{ClassSpecPair, UpgradeDescriptor};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Normal,
    Heroic,
    Mythic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Normal => "Normal",
            Difficulty::Heroic => "Heroic",
            Difficulty::Mythic => "Mythic",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// Accepts `mythic`, `Mythic` and the simulator's `raid-mythic` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_prefix("raid-").unwrap_or(&lower) {
            "normal" => Ok(Difficulty::Normal),
            "heroic" => Ok(Difficulty::Heroic),
            "mythic" => Ok(Difficulty::Mythic),
            _ => Err(format!("unknown raid difficulty '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightStyle {
    Patchwerk,
    CastingPatchwerk,
    LightMovement,
    HeavyMovement,
    HecticAddCleave,
    CleaveAdd,
    DungeonSlice,
    DungeonRoute,
}

const FIGHT_STYLES: &[(FightStyle, &str)] = &[
    (FightStyle::Patchwerk, "Patchwerk"),
    (FightStyle::CastingPatchwerk, "CastingPatchwerk"),
    (FightStyle::LightMovement, "LightMovement"),
    (FightStyle::HeavyMovement, "HeavyMovement"),
    (FightStyle::HecticAddCleave, "HecticAddCleave"),
    (FightStyle::CleaveAdd, "CleaveAdd"),
    (FightStyle::DungeonSlice, "DungeonSlice"),
    (FightStyle::DungeonRoute, "DungeonRoute"),
];

impl FightStyle {
    pub fn as_str(&self) -> &'static str {
        FIGHT_STYLES
            .iter()
            .find(|(style, _)| style == self)
            .map(|(_, name)| *name)
            .unwrap_or("Patchwerk")
    }
}

impl fmt::Display for FightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FightStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        FIGHT_STYLES
            .iter()
            .find(|(_, name)| name.to_ascii_lowercase() == wanted)
            .map(|(style, _)| *style)
            .ok_or_else(|| format!("unknown fight style '{}'", s))
    }
}

// ============================================================================
// Identity
// ============================================================================

/// A character as named by a report or the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub realm: String,
}

/// Normalized identity: case-folded name, slugged realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterKey {
    pub name: String,
    pub realm: String,
}

/// Identifies the current report for a character on one raid difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub character: CharacterKey,
    pub difficulty: Difficulty,
}

impl Character {
    pub fn new(name: impl Into<String>, realm: impl Into<String>) -> Self {
        Character {
            name: name.into().trim().to_string(),
            realm: realm.into().trim().to_string(),
        }
    }

    pub fn key(&self) -> CharacterKey {
        CharacterKey {
            name: name_key(&self.name),
            realm: realm_slug(&self.realm),
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.realm)
    }
}

pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// "Area 52" -> "area-52", "Kel'Thuzad" -> "kelthuzad".
pub fn realm_slug(realm: &str) -> String {
    realm
        .trim()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

// ============================================================================
// Raw and parsed artifacts
// ============================================================================

/// The two fetched artifacts of one report, unparsed.
#[derive(Debug, Clone)]
pub struct RawReport {
    /// Canonical report URL (trailing slash, no artifact suffix).
    pub source_url: String,
    pub tabular: Bytes,
    pub structured: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Gear the character is wearing in the simulated baseline.
    Equipped,
    /// A hypothetical item simulated as a replacement.
    Candidate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTabularRow {
    pub slot: String,
    pub item_id: u32,
    pub item_level: Option<u32>,
    pub bonus_ids: Vec<u32>,
    pub dps: f64,
    pub dps_gain: f64,
    pub kind: RowKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTabularRecord {
    pub character: Character,
    pub rows: Vec<ParsedTabularRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStructuredRecord {
    pub character: Character,
    pub difficulty: Difficulty,
    pub fight_style: FightStyle,
    pub duration_secs: u32,
    pub target_count: u32,
    pub generated_at: DateTime<Utc>,
    pub spec_id: u32,
    pub equipped: Vec<ItemSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub slot: String,
    pub item_id: u32,
    pub item_level: Option<u32>,
    pub bonus_ids: Vec<u32>,
    pub track: Option<UpgradeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCandidate {
    pub item_id: u32,
    pub slot: String,
    pub bonus_ids: Vec<u32>,
    pub upgrade: UpgradeDescriptor,
    /// Raid difficulty implied by the upgrade track, if it is a raid track.
    pub difficulty: Option<Difficulty>,
    pub dps: f64,
    pub dps_gain: f64,
}

/// Output of the parser: both artifacts joined and validated, specialization
/// still a raw id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub character: Character,
    pub spec_id: u32,
    pub difficulty: Difficulty,
    pub fight_style: FightStyle,
    pub duration_secs: u32,
    pub target_count: u32,
    pub generated_at: DateTime<Utc>,
    pub source_url: String,
    pub raw_tabular: String,
    pub equipped_items: Vec<ItemSnapshot>,
    pub upgrades: Vec<UpgradeCandidate>,
}

// ============================================================================
// Stored entity
// ============================================================================

pub type StoredReportId = String;

/// The persisted report. Replaced whole when a newer report for the same
/// key arrives; never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSimulationReport {
    pub id: StoredReportId,
    pub character: Character,
    pub specialization: ClassSpecPair,
    pub spec_id: u32,
    pub raid_difficulty: Difficulty,
    pub fight_style: FightStyle,
    pub duration_secs: u32,
    pub target_count: u32,
    pub generated_at: DateTime<Utc>,
    pub source_url: String,
    pub raw_tabular: String,
    pub raw_tabular_sha256: String,
    pub equipped_items: Vec<ItemSnapshot>,
    /// Only strictly positive gains.
    pub upgrades: Vec<UpgradeCandidate>,
}

impl CanonicalSimulationReport {
    pub fn key(&self) -> ReportKey {
        ReportKey {
            character: self.character.key(),
            difficulty: self.raid_difficulty,
        }
    }
}

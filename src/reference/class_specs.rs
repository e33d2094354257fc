use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::{bundled_text, table_lines, CLASS_SPECS_FILE};
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WowClass {
    DeathKnight,
    DemonHunter,
    Druid,
    Evoker,
    Hunter,
    Mage,
    Monk,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
}

const CLASSES: &[(WowClass, &str)] = &[
    (WowClass::DeathKnight, "DeathKnight"),
    (WowClass::DemonHunter, "DemonHunter"),
    (WowClass::Druid, "Druid"),
    (WowClass::Evoker, "Evoker"),
    (WowClass::Hunter, "Hunter"),
    (WowClass::Mage, "Mage"),
    (WowClass::Monk, "Monk"),
    (WowClass::Paladin, "Paladin"),
    (WowClass::Priest, "Priest"),
    (WowClass::Rogue, "Rogue"),
    (WowClass::Shaman, "Shaman"),
    (WowClass::Warlock, "Warlock"),
    (WowClass::Warrior, "Warrior"),
];

/// Specialization names. Several are shared between classes (Frost, Holy,
/// Protection, Restoration); the class disambiguates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialization {
    Blood,
    Frost,
    Unholy,
    Havoc,
    Vengeance,
    Balance,
    Feral,
    Guardian,
    Restoration,
    Devastation,
    Preservation,
    Augmentation,
    BeastMastery,
    Marksmanship,
    Survival,
    Arcane,
    Fire,
    Brewmaster,
    Mistweaver,
    Windwalker,
    Holy,
    Protection,
    Retribution,
    Discipline,
    Shadow,
    Assassination,
    Outlaw,
    Subtlety,
    Elemental,
    Enhancement,
    Affliction,
    Demonology,
    Destruction,
    Arms,
    Fury,
}

const SPECIALIZATIONS: &[(Specialization, &str)] = &[
    (Specialization::Blood, "Blood"),
    (Specialization::Frost, "Frost"),
    (Specialization::Unholy, "Unholy"),
    (Specialization::Havoc, "Havoc"),
    (Specialization::Vengeance, "Vengeance"),
    (Specialization::Balance, "Balance"),
    (Specialization::Feral, "Feral"),
    (Specialization::Guardian, "Guardian"),
    (Specialization::Restoration, "Restoration"),
    (Specialization::Devastation, "Devastation"),
    (Specialization::Preservation, "Preservation"),
    (Specialization::Augmentation, "Augmentation"),
    (Specialization::BeastMastery, "BeastMastery"),
    (Specialization::Marksmanship, "Marksmanship"),
    (Specialization::Survival, "Survival"),
    (Specialization::Arcane, "Arcane"),
    (Specialization::Fire, "Fire"),
    (Specialization::Brewmaster, "Brewmaster"),
    (Specialization::Mistweaver, "Mistweaver"),
    (Specialization::Windwalker, "Windwalker"),
    (Specialization::Holy, "Holy"),
    (Specialization::Protection, "Protection"),
    (Specialization::Retribution, "Retribution"),
    (Specialization::Discipline, "Discipline"),
    (Specialization::Shadow, "Shadow"),
    (Specialization::Assassination, "Assassination"),
    (Specialization::Outlaw, "Outlaw"),
    (Specialization::Subtlety, "Subtlety"),
    (Specialization::Elemental, "Elemental"),
    (Specialization::Enhancement, "Enhancement"),
    (Specialization::Affliction, "Affliction"),
    (Specialization::Demonology, "Demonology"),
    (Specialization::Destruction, "Destruction"),
    (Specialization::Arms, "Arms"),
    (Specialization::Fury, "Fury"),
];

fn name_of<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

fn parse_from<T: Copy>(table: &[(T, &'static str)], s: &str, kind: &str) -> Result<T, String> {
    let wanted: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    table
        .iter()
        .find(|(_, name)| name.to_ascii_lowercase() == wanted)
        .map(|(v, _)| *v)
        .ok_or_else(|| format!("unknown {} '{}'", kind, s))
}

impl WowClass {
    pub fn as_str(&self) -> &'static str {
        name_of(CLASSES, *self)
    }
}

impl Specialization {
    pub fn as_str(&self) -> &'static str {
        name_of(SPECIALIZATIONS, *self)
    }
}

impl fmt::Display for WowClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WowClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_from(CLASSES, s, "class")
    }
}

impl FromStr for Specialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_from(SPECIALIZATIONS, s, "specialization")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassSpecPair {
    pub class: WowClass,
    pub specialization: Specialization,
}

/// Closed specialization-id table, versioned with the game client.
#[derive(Debug, Clone, Default)]
pub struct ClassSpecTable {
    by_id: HashMap<u32, ClassSpecPair>,
}

static BUNDLED: OnceLock<Result<ClassSpecTable, String>> = OnceLock::new();

impl ClassSpecTable {
    /// Parse `spec_id,class,spec` rows.
    pub fn from_csv(text: &str) -> Result<Self, SimError> {
        let mut by_id = HashMap::new();
        for (line_no, line) in table_lines(text) {
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            let bad = |what: String| {
                SimError::ReferenceTable(format!("{} line {}: {}", CLASS_SPECS_FILE, line_no, what))
            };
            if cols.len() != 3 {
                return Err(bad(format!("expected 3 columns, got {}", cols.len())));
            }
            let id: u32 = cols[0]
                .parse()
                .map_err(|_| bad(format!("invalid spec_id '{}'", cols[0])))?;
            let pair = ClassSpecPair {
                class: cols[1].parse().map_err(bad)?,
                specialization: cols[2].parse().map_err(bad)?,
            };
            if by_id.insert(id, pair).is_some() {
                return Err(bad(format!("duplicate spec_id {}", id)));
            }
        }
        Ok(ClassSpecTable { by_id })
    }

    /// The table shipped in `data/`, parsed once per process.
    pub fn bundled() -> Result<&'static ClassSpecTable, SimError> {
        BUNDLED
            .get_or_init(|| {
                bundled_text(CLASS_SPECS_FILE)
                    .and_then(|text| ClassSpecTable::from_csv(&text))
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| SimError::ReferenceTable(e.clone()))
    }

    /// Exact-key lookup. An unknown id means the table is stale.
    pub fn resolve(&self, spec_id: u32) -> Result<ClassSpecPair, SimError> {
        self.by_id
            .get(&spec_id)
            .copied()
            .ok_or(SimError::UnknownSpecId { id: spec_id })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

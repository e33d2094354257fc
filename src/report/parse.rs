//! Parsing and validation of the two report artifacts.
//!
//! The structured artifact (JSON) carries the simulation parameters and the
//! character's identity; the tabular artifact (CSV) carries one row per
//! equipped item or simulated candidate. Each is parsed into its own typed
//! record, then the two are joined on character identity.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::{debug, info};

use super::{
    Character, Difficulty, FightStyle, ItemSnapshot, ParsedReport, ParsedStructuredRecord,
    ParsedTabularRecord, ParsedTabularRow, RawReport, RowKind, UpgradeCandidate,
};
use crate::error::SimError;
use crate::reference::ItemTrackTable;

/// Epoch values above this are milliseconds, not seconds (year 5138 in secs).
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const COL_CHARACTER: &str = "character";
const COL_REALM: &str = "realm";
const COL_SLOT: &str = "slot";
const COL_ITEM_ID: &str = "item_id";
const COL_ITEM_LEVEL: &str = "item_level";
const COL_BONUS_IDS: &str = "bonus_ids";
const COL_DPS: &str = "dps";
const COL_DPS_GAIN: &str = "dps_gain";
const COL_KIND: &str = "kind";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_CHARACTER,
    COL_REALM,
    COL_SLOT,
    COL_ITEM_ID,
    COL_BONUS_IDS,
    COL_DPS,
    COL_DPS_GAIN,
    COL_KIND,
];

/// Parse and join both artifacts. Nothing partial is returned: any invalid
/// field fails the whole report.
pub fn parse(raw: &RawReport, tracks: &ItemTrackTable) -> Result<ParsedReport, SimError> {
    let structured = parse_structured(&raw.structured, tracks)?;

    let raw_tabular = std::str::from_utf8(&raw.tabular)
        .map_err(|e| SimError::validation("tabular", format!("not valid UTF-8: {}", e)))?
        .to_string();
    let tabular = parse_tabular(&raw_tabular)?;

    combine(structured, tabular, raw_tabular, &raw.source_url, tracks)
}

// ============================================================================
// Structured artifact
// ============================================================================

/// Wire shape of the structured artifact. Fields are optional and each leaf
/// has a catch-all variant, so decoding only fails on malformed JSON; missing
/// or mistyped fields are reported by name during validation below.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredArtifact {
    character: Option<CharacterField>,
    difficulty: Option<Text>,
    fight_style: Option<Text>,
    duration: Option<DurationField>,
    targets: Option<Int>,
    date: Option<DateField>,
    spec_id: Option<Int>,
    equipped: Option<EquippedField>,
}

#[derive(Debug, Deserialize)]
struct CharacterBlock {
    name: Option<Text>,
    realm: Option<Text>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CharacterField {
    Block(CharacterBlock),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotItem {
    slot: Option<Text>,
    item_id: Option<Int>,
    item_level: Option<Int>,
    bonus_ids: Option<BonusIdsField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotField {
    Item(SnapshotItem),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EquippedField {
    Items(Vec<SnapshotField>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BonusIdsField {
    Ids(Vec<u32>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    Value(String),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Int {
    Value(u64),
    Other(IgnoredAny),
}

impl Int {
    fn as_u32(&self) -> Option<u32> {
        match self {
            Int::Value(n) => u32::try_from(*n).ok(),
            Int::Other(_) => None,
        }
    }
}

/// Seconds as a number, or a string such as "300", "300s" or "5m".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationField {
    Seconds(f64),
    Text(String),
    Other(IgnoredAny),
}

/// RFC 3339 string, or unix epoch in seconds or milliseconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateField {
    Rfc3339(String),
    Epoch(i64),
    EpochFloat(f64),
    Other(IgnoredAny),
}

pub fn parse_structured(
    payload: &[u8],
    tracks: &ItemTrackTable,
) -> Result<ParsedStructuredRecord, SimError> {
    let artifact: StructuredArtifact = serde_json::from_slice(payload).map_err(|e| {
        SimError::validation("structured", format!("not a JSON report object: {}", e))
    })?;

    let character = match required(artifact.character, "character")? {
        CharacterField::Block(block) => Character::new(
            non_empty_text(block.name, "character.name")?,
            non_empty_text(block.realm, "character.realm")?,
        ),
        CharacterField::Other(_) => {
            return Err(SimError::validation("character", "expected an object"))
        }
    };

    let difficulty: Difficulty = non_empty_text(artifact.difficulty, "difficulty")?
        .parse()
        .map_err(|e: String| SimError::validation("difficulty", e))?;

    let fight_style: FightStyle = non_empty_text(artifact.fight_style, "fightStyle")?
        .parse()
        .map_err(|e: String| SimError::validation("fightStyle", e))?;

    let duration_secs = normalize_duration(&required(artifact.duration, "duration")?)
        .map_err(|e| SimError::validation("duration", e))?;

    let target_count = required(artifact.targets, "targets")?
        .as_u32()
        .filter(|n| *n >= 1)
        .ok_or_else(|| SimError::validation("targets", "expected an integer >= 1"))?;

    let generated_at = normalize_timestamp(&required(artifact.date, "date")?)
        .map_err(|e| SimError::validation("date", e))?;

    let spec_id = required(artifact.spec_id, "specId")?
        .as_u32()
        .ok_or_else(|| SimError::validation("specId", "expected a non-negative integer"))?;

    let equipped = match artifact.equipped {
        None => Vec::new(),
        Some(EquippedField::Items(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| snapshot_item(i, item, tracks))
            .collect::<Result<Vec<_>, _>>()?,
        Some(EquippedField::Other(_)) => {
            return Err(SimError::validation("equipped", "expected an array"))
        }
    };

    Ok(ParsedStructuredRecord {
        character,
        difficulty,
        fight_style,
        duration_secs,
        target_count,
        generated_at,
        spec_id,
        equipped,
    })
}

fn snapshot_item(
    index: usize,
    item: SnapshotField,
    tracks: &ItemTrackTable,
) -> Result<ItemSnapshot, SimError> {
    let field = |name: &str| format!("equipped[{}].{}", index, name);
    let item = match item {
        SnapshotField::Item(item) => item,
        SnapshotField::Other(_) => {
            return Err(SimError::validation(
                format!("equipped[{}]", index),
                "expected an object",
            ))
        }
    };

    let slot = non_empty_text(item.slot, &field("slot"))?.to_ascii_lowercase();
    let item_id = required(item.item_id, &field("itemId"))?
        .as_u32()
        .ok_or_else(|| SimError::validation(field("itemId"), "expected a non-negative integer"))?;
    let item_level = match item.item_level {
        None => None,
        Some(level) => Some(
            level
                .as_u32()
                .ok_or_else(|| SimError::validation(field("itemLevel"), "expected an integer"))?,
        ),
    };
    let bonus_ids = match item.bonus_ids {
        None => Vec::new(),
        Some(BonusIdsField::Ids(ids)) => ids,
        Some(BonusIdsField::Other(_)) => {
            return Err(SimError::validation(
                field("bonusIds"),
                "expected an array of integers",
            ))
        }
    };

    let track = tracks.resolve(&bonus_ids);
    Ok(ItemSnapshot {
        slot,
        item_id,
        item_level,
        bonus_ids,
        track,
    })
}

/// Absent and `null` are both "missing".
fn required<T>(value: Option<T>, field: &str) -> Result<T, SimError> {
    value.ok_or_else(|| SimError::validation(field, "missing"))
}

fn non_empty_text(value: Option<Text>, field: &str) -> Result<String, SimError> {
    match required(value, field)? {
        Text::Value(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Text::Value(_) => Err(SimError::validation(field, "empty")),
        Text::Other(_) => Err(SimError::validation(field, "expected a string")),
    }
}

fn normalize_duration(value: &DurationField) -> Result<u32, String> {
    let secs = match value {
        DurationField::Seconds(n) => *n,
        DurationField::Text(s) => {
            let s = s.trim().to_ascii_lowercase();
            let (digits, scale) = if let Some(m) = s.strip_suffix('m') {
                (m, 60.0)
            } else if let Some(sec) = s.strip_suffix('s') {
                (sec, 1.0)
            } else {
                (s.as_str(), 1.0)
            };
            digits
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("cannot read '{}' as a duration", s))?
                * scale
        }
        DurationField::Other(_) => {
            return Err("expected seconds as a number or string".to_string())
        }
    };

    if !secs.is_finite() || secs <= 0.0 || secs > u32::MAX as f64 {
        return Err(format!("duration {} out of range", secs));
    }
    Ok(secs.round().max(1.0) as u32)
}

fn normalize_timestamp(value: &DateField) -> Result<DateTime<Utc>, String> {
    let epoch = match value {
        DateField::Rfc3339(s) => {
            return DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("'{}' is not an RFC 3339 timestamp: {}", s, e))
        }
        DateField::Epoch(n) => Some(*n),
        DateField::EpochFloat(f) => Some(*f).filter(|f| f.is_finite()).map(|f| f as i64),
        DateField::Other(_) => {
            return Err("expected an RFC 3339 string or epoch number".to_string())
        }
    };

    let epoch = epoch
        .filter(|e| *e >= 0)
        .ok_or("expected a non-negative epoch")?;
    let dt = if epoch > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    };
    dt.ok_or_else(|| format!("epoch {} out of range", epoch))
}

// ============================================================================
// Tabular artifact
// ============================================================================

pub fn parse_tabular(text: &str) -> Result<ParsedTabularRecord, SimError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| SimError::validation("tabular", "empty payload"))?;
    let header = split_csv_fields(header_line)
        .map_err(|e| SimError::validation("tabular header", e))?;
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (i, name) in header.iter().enumerate() {
        let name = name.trim().to_ascii_lowercase();
        if columns.insert(name.clone(), i).is_some() {
            return Err(SimError::validation(name, "duplicate column"));
        }
    }
    for col in REQUIRED_COLUMNS {
        if !columns.contains_key(*col) {
            return Err(SimError::validation(*col, "missing column"));
        }
    }
    let mut character: Option<Character> = None;
    let mut rows = Vec::new();

    for (line_no, line) in lines {
        let fields =
            split_csv_fields(line).map_err(|e| SimError::validation(format!("line {}", line_no), e))?;
        let row = CsvRow {
            fields: &fields,
            columns: &columns,
            line_no,
        };

        let row_character = Character::new(row.cell(COL_CHARACTER)?, row.cell(COL_REALM)?);
        if row_character.name.is_empty() || row_character.realm.is_empty() {
            return Err(row.invalid(COL_CHARACTER, "character and realm are required"));
        }
        if let Some(first) = &character {
            if first.key() != row_character.key() {
                return Err(row.invalid(
                    COL_CHARACTER,
                    format!("row names {} but earlier rows name {}", row_character, first),
                ));
            }
        } else {
            character = Some(row_character);
        }

        let slot = row.cell(COL_SLOT)?.to_ascii_lowercase();
        let item_id: u32 = row
            .cell(COL_ITEM_ID)?
            .parse()
            .map_err(|_| row.invalid(COL_ITEM_ID, "expected a non-negative integer"))?;
        let item_level = match row.optional(COL_ITEM_LEVEL) {
            None => None,
            Some(s) => Some(
                s.parse::<u32>()
                    .map_err(|_| row.invalid(COL_ITEM_LEVEL, format!("'{}' is not an integer", s)))?,
            ),
        };
        let bonus_ids =
            parse_bonus_ids(row.cell(COL_BONUS_IDS)?).map_err(|e| row.invalid(COL_BONUS_IDS, e))?;
        let dps = parse_finite(row.cell(COL_DPS)?).map_err(|e| row.invalid(COL_DPS, e))?;
        let dps_gain =
            parse_finite(row.cell(COL_DPS_GAIN)?).map_err(|e| row.invalid(COL_DPS_GAIN, e))?;
        let kind = match row.cell(COL_KIND)?.to_ascii_lowercase().as_str() {
            "equipped" => RowKind::Equipped,
            "candidate" => RowKind::Candidate,
            other => return Err(row.invalid(COL_KIND, format!("unknown row kind '{}'", other))),
        };

        rows.push(ParsedTabularRow {
            slot,
            item_id,
            item_level,
            bonus_ids,
            dps,
            dps_gain,
            kind,
        });
    }

    let character = character.ok_or_else(|| SimError::validation("rows", "no data rows"))?;
    debug!("Parsed {} tabular rows for {}", rows.len(), character);
    Ok(ParsedTabularRecord { character, rows })
}

/// One data line of the tabular artifact, addressed by column name.
struct CsvRow<'a> {
    fields: &'a [String],
    columns: &'a HashMap<String, usize>,
    line_no: usize,
}

impl<'a> CsvRow<'a> {
    fn optional(&self, name: &str) -> Option<&'a str> {
        self.columns
            .get(name)
            .and_then(|i| self.fields.get(*i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn cell(&self, name: &str) -> Result<&'a str, SimError> {
        self.columns
            .get(name)
            .and_then(|i| self.fields.get(*i))
            .map(|s| s.trim())
            .ok_or_else(|| self.invalid(name, "missing value"))
    }

    fn invalid(&self, name: &str, reason: impl Into<String>) -> SimError {
        SimError::validation(format!("line {}: {}", self.line_no, name), reason)
    }
}

/// `/`-separated modifier codes; an empty cell is an empty set.
fn parse_bonus_ids(cell: &str) -> Result<Vec<u32>, String> {
    cell.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|_| format!("'{}' is not a bonus id", s)))
        .collect()
}

fn parse_finite(cell: &str) -> Result<f64, String> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{}' is not a number", cell))
}

/// Split one CSV line. Quoted fields may contain commas and `""` escapes.
fn split_csv_fields(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

// ============================================================================
// Join
// ============================================================================

fn combine(
    structured: ParsedStructuredRecord,
    tabular: ParsedTabularRecord,
    raw_tabular: String,
    source_url: &str,
    tracks: &ItemTrackTable,
) -> Result<ParsedReport, SimError> {
    if structured.character.key() != tabular.character.key() {
        return Err(SimError::ReportMismatch {
            tabular: tabular.character.to_string(),
            structured: structured.character.to_string(),
        });
    }

    let mut equipped_items = Vec::new();
    let mut upgrades = Vec::new();

    for row in tabular.rows {
        let track = tracks.resolve(&row.bonus_ids);
        match row.kind {
            RowKind::Equipped => equipped_items.push(ItemSnapshot {
                slot: row.slot,
                item_id: row.item_id,
                item_level: row.item_level,
                bonus_ids: row.bonus_ids,
                track,
            }),
            RowKind::Candidate => match track {
                Some(upgrade) => upgrades.push(UpgradeCandidate {
                    item_id: row.item_id,
                    slot: row.slot,
                    bonus_ids: row.bonus_ids,
                    difficulty: upgrade.difficulty(),
                    upgrade,
                    dps: row.dps,
                    dps_gain: row.dps_gain,
                }),
                None => info!(
                    "No upgrade track for candidate item {} ({}), bonus ids {:?}; not reported",
                    row.item_id, row.slot, row.bonus_ids
                ),
            },
        }
    }

    let worn_slots: HashSet<String> = equipped_items.iter().map(|i| i.slot.clone()).collect();
    equipped_items.extend(
        structured
            .equipped
            .into_iter()
            .filter(|item| !worn_slots.contains(&item.slot)),
    );

    Ok(ParsedReport {
        character: tabular.character,
        spec_id: structured.spec_id,
        difficulty: structured.difficulty,
        fight_style: structured.fight_style,
        duration_secs: structured.duration_secs,
        target_count: structured.target_count,
        generated_at: structured.generated_at,
        source_url: source_url.to_string(),
        raw_tabular,
        equipped_items,
        upgrades,
    })
}

pub mod class_specs;
pub mod item_tracks;

use rust_embed::RustEmbed;

use crate::error::SimError;

pub use class_specs::{ClassSpecPair, ClassSpecTable, Specialization, WowClass};
pub use item_tracks::{ItemTrackTable, TrackTier, UpgradeDescriptor};

/// Static datasets bundled with the binary.
#[derive(RustEmbed)]
#[folder = "data/"]
struct ReferenceAssets;

pub const ITEM_TRACKS_FILE: &str = "item_tracks.csv";
pub const CLASS_SPECS_FILE: &str = "class_specs.csv";

fn bundled_text(name: &str) -> Result<String, SimError> {
    let file = ReferenceAssets::get(name)
        .ok_or_else(|| SimError::ReferenceTable(format!("bundled table {} is missing", name)))?;
    String::from_utf8(file.data.into_owned())
        .map_err(|e| SimError::ReferenceTable(format!("{} is not UTF-8: {}", name, e)))
}

/// Iterate the data lines of a bundled CSV table: skips the header, blank
/// lines and `#` comments. Yields (1-based line number, trimmed line).
fn table_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .skip(1)
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

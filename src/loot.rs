//! Ranks rostered characters by how much a given item drop would help them.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::reference::UpgradeDescriptor;
use crate::report::{CanonicalSimulationReport, Character, CharacterKey, Difficulty};

pub type ItemId = u32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LootCandidate {
    pub character: Character,
    pub dps_gain: f64,
    pub upgrade: UpgradeDescriptor,
    pub raid_difficulty: Difficulty,
    pub report_id: String,
}

/// Characters in `roster` whose reports list `item` as an upgrade, best gain
/// first, ties broken by character name ignoring case. Characters without a
/// matching entry are left out. A character with several matching entries
/// (two ring slots, several difficulties) is listed once, with the best one.
pub fn project(
    item: ItemId,
    reports: &[CanonicalSimulationReport],
    roster: &[Character],
) -> Vec<LootCandidate> {
    let rostered: HashSet<CharacterKey> = roster.iter().map(Character::key).collect();
    let mut best: HashMap<CharacterKey, LootCandidate> = HashMap::new();

    for report in reports {
        let key = report.character.key();
        if !rostered.contains(&key) {
            continue;
        }
        let Some(entry) = report
            .upgrades
            .iter()
            .filter(|u| u.item_id == item)
            .max_by(|a, b| a.dps_gain.total_cmp(&b.dps_gain))
        else {
            continue;
        };

        let candidate = LootCandidate {
            character: report.character.clone(),
            dps_gain: entry.dps_gain,
            upgrade: entry.upgrade,
            raid_difficulty: report.raid_difficulty,
            report_id: report.id.clone(),
        };
        match best.get(&key) {
            Some(current) if current.dps_gain >= candidate.dps_gain => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }

    let mut ranked: Vec<LootCandidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        let (a_key, b_key) = (a.character.key(), b.character.key());
        b.dps_gain
            .total_cmp(&a.dps_gain)
            .then_with(|| a_key.name.cmp(&b_key.name))
            .then_with(|| a.character.name.cmp(&b.character.name))
            .then_with(|| a_key.realm.cmp(&b_key.realm))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ClassSpecPair, Specialization, TrackTier, WowClass};
    use crate::report::{FightStyle, UpgradeCandidate};
    use chrono::{TimeZone, Utc};

    fn myth() -> UpgradeDescriptor {
        UpgradeDescriptor {
            tier: TrackTier::Myth,
            level: 1,
            max_level: 6,
            item_level: 623,
        }
    }

    fn report(name: &str, difficulty: Difficulty, gains: &[(ItemId, f64)]) -> CanonicalSimulationReport {
        CanonicalSimulationReport {
            id: format!("{}-{}", name, difficulty),
            character: Character::new(name, "Draenor"),
            specialization: ClassSpecPair {
                class: WowClass::Mage,
                specialization: Specialization::Fire,
            },
            spec_id: 63,
            raid_difficulty: difficulty,
            fight_style: FightStyle::Patchwerk,
            duration_secs: 300,
            target_count: 1,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            source_url: String::new(),
            raw_tabular: String::new(),
            raw_tabular_sha256: String::new(),
            equipped_items: vec![],
            upgrades: gains
                .iter()
                .map(|(item_id, gain)| UpgradeCandidate {
                    item_id: *item_id,
                    slot: "trinket1".to_string(),
                    bonus_ids: vec![],
                    upgrade: myth(),
                    difficulty: Some(Difficulty::Mythic),
                    dps: 0.0,
                    dps_gain: *gain,
                })
                .collect(),
        }
    }

    fn roster(names: &[&str]) -> Vec<Character> {
        names.iter().map(|n| Character::new(*n, "Draenor")).collect()
    }

    fn names(ranked: &[LootCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.character.name.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_gain_descending() {
        let reports = vec![
            report("Anduin", Difficulty::Mythic, &[(100, 300.0)]),
            report("Baine", Difficulty::Mythic, &[(100, 900.0)]),
            report("Cairne", Difficulty::Mythic, &[(100, 600.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["Anduin", "Baine", "Cairne"]));
        assert_eq!(names(&ranked), vec!["Baine", "Cairne", "Anduin"]);
    }

    #[test]
    fn test_equal_gains_ordered_by_name() {
        let reports = vec![
            report("Zul", Difficulty::Mythic, &[(100, 500.0)]),
            report("Alleria", Difficulty::Mythic, &[(100, 500.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["Zul", "Alleria"]));
        assert_eq!(names(&ranked), vec!["Alleria", "Zul"]);
        let reversed: Vec<_> = reports.into_iter().rev().collect();
        assert_eq!(names(&project(100, &reversed, &roster(&["Alleria", "Zul"]))), vec!["Alleria", "Zul"]);
    }

    #[test]
    fn test_equal_gains_ordered_ignoring_case() {
        let reports = vec![
            report("Zul", Difficulty::Mythic, &[(100, 500.0)]),
            report("alleria", Difficulty::Mythic, &[(100, 500.0)]),
            report("Baine", Difficulty::Mythic, &[(100, 500.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["Zul", "alleria", "Baine"]));
        assert_eq!(names(&ranked), vec!["alleria", "Baine", "Zul"]);
    }

    #[test]
    fn test_no_matching_entry_excluded() {
        let reports = vec![
            report("Anduin", Difficulty::Mythic, &[(100, 300.0)]),
            report("Baine", Difficulty::Mythic, &[(200, 900.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["Anduin", "Baine"]));
        assert_eq!(names(&ranked), vec!["Anduin"]);
    }

    #[test]
    fn test_off_roster_excluded() {
        let reports = vec![
            report("Anduin", Difficulty::Mythic, &[(100, 300.0)]),
            report("Garrosh", Difficulty::Mythic, &[(100, 5000.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["anduin"]));
        assert_eq!(names(&ranked), vec!["Anduin"]);
    }

    #[test]
    fn test_character_listed_once_with_best_entry() {
        let reports = vec![
            report("Anduin", Difficulty::Heroic, &[(100, 200.0), (100, 250.0)]),
            report("Anduin", Difficulty::Mythic, &[(100, 400.0)]),
        ];
        let ranked = project(100, &reports, &roster(&["Anduin"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].dps_gain, 400.0);
        assert_eq!(ranked[0].raid_difficulty, Difficulty::Mythic);

        let heroic = project(100, &reports[..1], &roster(&["Anduin"]));
        assert_eq!(heroic[0].dps_gain, 250.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(project(100, &[], &roster(&["Anduin"])).is_empty());
        let reports = vec![report("Anduin", Difficulty::Mythic, &[(100, 1.0)])];
        assert!(project(100, &reports, &[]).is_empty());
    }
}

//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Guild view pipeline
//!
//! Turns a roster and a set of controls into ordered, labelled groups. The
//! pipeline runs in fixed stages:
//!
//! 1. drop records that cannot be displayed
//! 2. split living characters from the dead
//! 3. narrow both partitions to the current selection
//! 4. sort (stable)
//! 5. group in order of first appearance
//!
//! The dead partition becomes the memorial and runs through sort and group
//! with its own controls. [`build_view`] is pure, so it is safe to rerun on
//! every change of input.

use kandoran_common::{CharacterRecord, CharacterStatus, compare_names};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Label of the single group produced by [`GroupBy::None`]
pub const ALL_CHARACTERS: &str = "All Characters";

/// Label for records without a value for the grouping field
pub const UNKNOWN_GROUP: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    None,
    Class,
    #[default]
    Level,
    Status,
}

impl GroupBy {
    /// Sort field that suits this grouping
    pub fn default_sort(self) -> SortBy {
        match self {
            GroupBy::None => SortBy::Alphabet,
            GroupBy::Level => SortBy::Exp,
            GroupBy::Class => SortBy::Level,
            GroupBy::Status => SortBy::Alphabet,
        }
    }

    fn label(self, record: &CharacterRecord) -> String {
        match self {
            GroupBy::None => ALL_CHARACTERS.to_string(),
            GroupBy::Class => record.class_name().unwrap_or(UNKNOWN_GROUP).to_string(),
            GroupBy::Level => format!("Level {}", record.level()),
            GroupBy::Status => record
                .status()
                .map(CharacterStatus::as_str)
                .unwrap_or(UNKNOWN_GROUP)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Alphabet,
    /// Keyed on experience, not on the level field
    #[default]
    Level,
    Exp,
    Status,
}

impl SortBy {
    /// Numeric fields list the highest values first
    pub fn descending_by_default(self) -> bool {
        matches!(self, SortBy::Level | SortBy::Exp)
    }

    fn compare(self, a: &CharacterRecord, b: &CharacterRecord) -> Ordering {
        match self {
            SortBy::Alphabet => compare_names(a.name(), b.name()),
            SortBy::Level | SortBy::Exp => a.exp().cmp(&b.exp()),
            SortBy::Status => status_rank(a).cmp(&status_rank(b)),
        }
    }
}

fn status_rank(record: &CharacterRecord) -> u8 {
    record.status().map_or(3, CharacterStatus::rank)
}

/// Explicitly selected characters or players, never both
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "values")]
pub enum SearchSelection {
    #[default]
    Empty,
    /// Selection keys of characters
    Characters(Vec<String>),
    /// Player names
    Players(Vec<String>),
}

impl SearchSelection {
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Selected keys or names in selection order
    pub fn values(&self) -> &[String] {
        match self {
            SearchSelection::Empty => &[],
            SearchSelection::Characters(keys) => keys,
            SearchSelection::Players(names) => names,
        }
    }

    /// Add or remove a character, replacing any player selection
    pub fn toggle_character(&mut self, key: &str) {
        let mut keys = match std::mem::take(self) {
            SearchSelection::Characters(keys) => keys,
            _ => Vec::new(),
        };
        toggle(&mut keys, key);
        if !keys.is_empty() {
            *self = SearchSelection::Characters(keys);
        }
    }

    /// Add or remove a player, replacing any character selection
    pub fn toggle_player(&mut self, name: &str) {
        let mut names = match std::mem::take(self) {
            SearchSelection::Players(names) => names,
            _ => Vec::new(),
        };
        toggle(&mut names, name);
        if !names.is_empty() {
            *self = SearchSelection::Players(names);
        }
    }

    pub fn clear(&mut self) {
        *self = SearchSelection::Empty;
    }

    /// Whether the record is part of the selection; an empty selection matches nothing
    pub fn matches(&self, record: &CharacterRecord) -> bool {
        match self {
            SearchSelection::Empty => false,
            SearchSelection::Characters(keys) => record
                .selection_key()
                .is_some_and(|key| keys.iter().any(|selected| selected == key)),
            SearchSelection::Players(names) => record
                .player()
                .is_some_and(|player| names.iter().any(|selected| selected == player)),
        }
    }
}

fn toggle(values: &mut Vec<String>, value: &str) {
    match values.iter().position(|existing| existing == value) {
        Some(index) => {
            values.remove(index);
        }
        None => values.push(value.to_string()),
    }
}

/// Grouping and ordering of one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionControls {
    pub group_by: GroupBy,
    pub sort_by: SortBy,
    /// Flips the default direction of `sort_by`
    pub sort_ascending: bool,
}

impl Default for PartitionControls {
    fn default() -> Self {
        Self {
            group_by: GroupBy::None,
            sort_by: SortBy::Level,
            sort_ascending: false,
        }
    }
}

/// Everything the guild view depends on besides the roster itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterControls {
    pub group_by: GroupBy,
    pub sort_by: SortBy,
    /// Flips the default direction of `sort_by`
    pub sort_ascending: bool,
    pub show_inactive: bool,
    pub selection: SearchSelection,
    /// Controls of the memorial partition
    pub memorial: PartitionControls,
}

impl Default for RosterControls {
    fn default() -> Self {
        Self {
            group_by: GroupBy::default(),
            sort_by: SortBy::default(),
            sort_ascending: false,
            show_inactive: true,
            selection: SearchSelection::Empty,
            memorial: PartitionControls::default(),
        }
    }
}

impl RosterControls {
    /// Controls of the live partition
    pub fn live(&self) -> PartitionControls {
        PartitionControls {
            group_by: self.group_by,
            sort_by: self.sort_by,
            sort_ascending: self.sort_ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterGroup {
    pub label: String,
    pub characters: Vec<CharacterRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterView {
    pub groups: Vec<RosterGroup>,
    pub memorial: Vec<RosterGroup>,
}

impl RosterView {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.memorial.is_empty()
    }

    /// Number of characters in the live groups
    pub fn character_count(&self) -> usize {
        self.groups.iter().map(|group| group.characters.len()).sum()
    }
}

/// Build the guild view for `records`
pub fn build_view(records: &[CharacterRecord], controls: &RosterControls) -> RosterView {
    let selecting = !controls.selection.is_empty();
    let mut live = Vec::new();
    let mut dead = Vec::new();

    for record in records.iter().filter(|record| record.is_displayable()) {
        let Some(status) = record.status() else {
            continue;
        };

        if selecting {
            // An explicit selection bypasses the inactive filter.
            if controls.selection.matches(record) {
                if status.is_dead() {
                    dead.push(record);
                } else {
                    live.push(record);
                }
            }
            continue;
        }

        match status {
            CharacterStatus::Active => live.push(record),
            CharacterStatus::Inactive if controls.show_inactive => live.push(record),
            CharacterStatus::Dead => dead.push(record),
            _ => {}
        }
    }

    RosterView {
        groups: arrange(live, &controls.live()),
        memorial: arrange(dead, &controls.memorial),
    }
}

fn arrange(mut records: Vec<&CharacterRecord>, controls: &PartitionControls) -> Vec<RosterGroup> {
    let descending = controls.sort_by.descending_by_default() != controls.sort_ascending;
    records.sort_by(|a, b| {
        let ordering = controls.sort_by.compare(a, b);
        if descending { ordering.reverse() } else { ordering }
    });

    let mut groups: Vec<RosterGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let label = controls.group_by.label(record);
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            groups.push(RosterGroup {
                label,
                characters: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].characters.push(record.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord::new("Kasim", 9, "Rogue", "Active").with_exp(159),
            CharacterRecord::new("Janosch", 8, "Paladin", "Inactive").with_exp(141),
            CharacterRecord::new("Lumaer", 4, "Fighter", "Dead").with_exp(35),
        ]
    }

    fn names(group: &RosterGroup) -> Vec<&str> {
        group.characters.iter().map(CharacterRecord::name).collect()
    }

    fn labels(groups: &[RosterGroup]) -> Vec<&str> {
        groups.iter().map(|group| group.label.as_str()).collect()
    }

    fn flat(groups: &[RosterGroup]) -> Vec<&CharacterRecord> {
        groups.iter().flat_map(|group| group.characters.iter()).collect()
    }

    #[test]
    fn test_scenario_class_grouping() {
        let controls = RosterControls {
            group_by: GroupBy::Class,
            sort_by: SortBy::Exp,
            sort_ascending: false,
            show_inactive: true,
            ..Default::default()
        };

        let view = build_view(&scenario(), &controls);
        assert_eq!(labels(&view.groups), vec!["Rogue", "Paladin"]);
        assert_eq!(names(&view.groups[0]), vec!["Kasim"]);
        assert_eq!(names(&view.groups[1]), vec!["Janosch"]);
        assert_eq!(view.memorial.len(), 1);
        assert_eq!(names(&view.memorial[0]), vec!["Lumaer"]);
    }

    #[test]
    fn test_record_without_status_is_never_shown() {
        let mut records = scenario();
        let mut missing = CharacterRecord::new("Ghost", 5, "Wizard", "Active").with_exp(500);
        missing.status = None;
        records.push(missing);
        let mut blank = CharacterRecord::new("Blank", 5, "Wizard", "").with_exp(500);
        blank.id = Some("blank".to_string());
        records.push(blank);

        for group_by in [GroupBy::None, GroupBy::Class, GroupBy::Level, GroupBy::Status] {
            for show_inactive in [true, false] {
                let controls = RosterControls {
                    group_by,
                    show_inactive,
                    ..Default::default()
                };
                let view = build_view(&records, &controls);
                assert!(
                    flat(&view.groups)
                        .iter()
                        .chain(flat(&view.memorial).iter())
                        .all(|record| record.name() != "Ghost" && record.name() != "Blank")
                );
            }
        }

        let selected = RosterControls {
            selection: SearchSelection::Characters(vec!["Ghost".to_string()]),
            ..Default::default()
        };
        assert!(build_view(&records, &selected).is_empty());
    }

    #[test]
    fn test_groups_follow_first_appearance() {
        let records = vec![
            CharacterRecord::new("Alpha", 5, "B", "Active").with_exp(40),
            CharacterRecord::new("Bravo", 5, "A", "Active").with_exp(30),
            CharacterRecord::new("Charlie", 5, "B", "Active").with_exp(20),
            CharacterRecord::new("Delta", 5, "C", "Active").with_exp(10),
        ];
        let controls = RosterControls {
            group_by: GroupBy::Class,
            sort_by: SortBy::Exp,
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        assert_eq!(labels(&view.groups), vec!["B", "A", "C"]);
        assert_eq!(names(&view.groups[0]), vec!["Alpha", "Charlie"]);
        assert_eq!(names(&view.groups[1]), vec!["Bravo"]);
        assert_eq!(names(&view.groups[2]), vec!["Delta"]);
    }

    #[test]
    fn test_exp_sort_direction() {
        let records = vec![
            CharacterRecord::new("A", 3, "Bard", "Active").with_exp(20),
            CharacterRecord::new("B", 7, "Bard", "Active").with_exp(90),
            CharacterRecord::new("C", 5, "Bard", "Inactive").with_exp(55),
            CharacterRecord::new("D", 5, "Bard", "Active").with_exp(55),
        ];
        let mut controls = RosterControls {
            group_by: GroupBy::None,
            sort_by: SortBy::Exp,
            sort_ascending: false,
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        let exp: Vec<u64> = flat(&view.groups).iter().map(|r| r.exp()).collect();
        assert_eq!(exp, vec![90, 55, 55, 20]);
        // Equal keys keep their input order.
        assert_eq!(names(&view.groups[0]), vec!["B", "C", "D", "A"]);

        controls.sort_ascending = true;
        let view = build_view(&records, &controls);
        let exp: Vec<u64> = flat(&view.groups).iter().map(|r| r.exp()).collect();
        assert_eq!(exp, vec![20, 55, 55, 90]);
        assert_eq!(names(&view.groups[0]), vec!["A", "C", "D", "B"]);
    }

    #[test]
    fn test_level_sort_is_keyed_on_exp() {
        let records = vec![
            CharacterRecord::new("Veteran", 10, "Monk", "Active").with_exp(100),
            CharacterRecord::new("Grinder", 6, "Monk", "Active").with_exp(400),
        ];
        let controls = RosterControls {
            group_by: GroupBy::None,
            sort_by: SortBy::Level,
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        assert_eq!(names(&view.groups[0]), vec!["Grinder", "Veteran"]);
    }

    #[test]
    fn test_alphabet_sort_defaults_ascending() {
        let records = vec![
            CharacterRecord::new("Özil", 1, "Bard", "Active"),
            CharacterRecord::new("anna", 1, "Bard", "Active"),
            CharacterRecord::new("Bernd", 1, "Bard", "Active"),
            CharacterRecord::new("Anna", 1, "Bard", "Active"),
        ];
        let mut controls = RosterControls {
            group_by: GroupBy::None,
            sort_by: SortBy::Alphabet,
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        assert_eq!(names(&view.groups[0]), vec!["anna", "Anna", "Bernd", "Özil"]);

        controls.sort_ascending = true;
        let view = build_view(&records, &controls);
        assert_eq!(names(&view.groups[0]), vec!["Özil", "Bernd", "Anna", "anna"]);
    }

    #[test]
    fn test_status_partition() {
        let records = scenario();
        for show_inactive in [true, false] {
            let controls = RosterControls {
                show_inactive,
                ..Default::default()
            };
            let view = build_view(&records, &controls);
            let live = flat(&view.groups);
            assert!(live.iter().all(|r| r.name() != "Lumaer"));
            assert_eq!(live.iter().any(|r| r.name() == "Janosch"), show_inactive);
            assert_eq!(names(&view.memorial[0]), vec!["Lumaer"]);
        }
    }

    #[test]
    fn test_unknown_status_is_excluded_from_both_partitions() {
        let records = vec![
            CharacterRecord::new("Kasim", 9, "Rogue", "Active"),
            CharacterRecord::new("Wanderer", 3, "Ranger", "Retired"),
        ];
        let view = build_view(&records, &RosterControls::default());
        assert_eq!(view.character_count(), 1);
        assert!(view.memorial.is_empty());
    }

    #[test]
    fn test_status_sort_and_grouping() {
        let records = vec![
            CharacterRecord::new("A", 2, "Bard", "Inactive"),
            CharacterRecord::new("B", 2, "Bard", "Active"),
            CharacterRecord::new("C", 2, "Bard", "Inactive"),
        ];
        let controls = RosterControls {
            group_by: GroupBy::Status,
            sort_by: SortBy::Status,
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        assert_eq!(labels(&view.groups), vec!["Active", "Inactive"]);
        assert_eq!(names(&view.groups[1]), vec!["A", "C"]);
    }

    #[test]
    fn test_level_groups_are_labelled() {
        let view = build_view(&scenario(), &RosterControls::default());
        assert_eq!(labels(&view.groups), vec!["Level 9", "Level 8"]);
    }

    #[test]
    fn test_character_selection_includes_inactive_and_dead() {
        let records = vec![
            CharacterRecord::new("Kasim", 9, "Rogue", "Active").with_id("k1"),
            CharacterRecord::new("Janosch", 8, "Paladin", "Inactive").with_id("j1"),
            CharacterRecord::new("Lumaer", 4, "Fighter", "Dead").with_id("l1"),
        ];
        let controls = RosterControls {
            show_inactive: false,
            selection: SearchSelection::Characters(vec!["j1".to_string(), "l1".to_string()]),
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        let live: Vec<&str> = flat(&view.groups).iter().map(|r| r.name()).collect();
        assert_eq!(live, vec!["Janosch"]);
        assert_eq!(names(&view.memorial[0]), vec!["Lumaer"]);
    }

    #[test]
    fn test_player_selection_narrows_to_player() {
        let records = vec![
            CharacterRecord::new("Kasim", 9, "Rogue", "Active").with_player("Rob"),
            CharacterRecord::new("Janosch", 8, "Paladin", "Inactive").with_player("Rob"),
            CharacterRecord::new("Mira", 6, "Cleric", "Active").with_player("Kim"),
        ];
        let controls = RosterControls {
            selection: SearchSelection::Players(vec!["Rob".to_string()]),
            ..Default::default()
        };

        let view = build_view(&records, &controls);
        let mut live: Vec<&str> = flat(&view.groups).iter().map(|r| r.name()).collect();
        live.sort();
        assert_eq!(live, vec!["Janosch", "Kasim"]);
    }

    #[test]
    fn test_memorial_uses_its_own_controls() {
        let records = vec![
            CharacterRecord::new("Zed", 4, "Fighter", "Dead").with_exp(35),
            CharacterRecord::new("Ash", 7, "Wizard", "Dead").with_exp(90),
            CharacterRecord::new("Kasim", 9, "Rogue", "Active").with_exp(159),
        ];
        let mut controls = RosterControls::default();

        let view = build_view(&records, &controls);
        assert_eq!(labels(&view.memorial), vec![ALL_CHARACTERS]);
        assert_eq!(names(&view.memorial[0]), vec!["Ash", "Zed"]);

        controls.memorial = PartitionControls {
            group_by: GroupBy::Class,
            sort_by: SortBy::Alphabet,
            sort_ascending: true,
        };
        let view = build_view(&records, &controls);
        assert_eq!(labels(&view.memorial), vec!["Fighter", "Wizard"]);
        assert_eq!(labels(&view.groups), vec!["Level 9"]);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let view = build_view(&[], &RosterControls::default());
        assert!(view.groups.is_empty());
        assert!(view.memorial.is_empty());
        assert!(view.is_empty());
    }

    #[test]
    fn test_selection_toggles_and_switches_kind() {
        let mut selection = SearchSelection::default();
        selection.toggle_character("x");
        selection.toggle_character("y");
        assert_eq!(
            selection,
            SearchSelection::Characters(vec!["x".to_string(), "y".to_string()])
        );

        selection.toggle_player("P");
        assert_eq!(selection, SearchSelection::Players(vec!["P".to_string()]));

        selection.toggle_player("P");
        assert_eq!(selection, SearchSelection::Empty);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_controls_deserialize_lowercase() {
        let controls: PartitionControls = serde_json::from_str(
            r#"{"group_by":"none","sort_by":"alphabet","sort_ascending":true}"#,
        )
        .unwrap();
        assert_eq!(controls.group_by, GroupBy::None);
        assert_eq!(controls.sort_by, SortBy::Alphabet);
    }
}

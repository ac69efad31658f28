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

//! Character and player search
//!
//! Option lists for the search boxes and the [`GuildController`], which owns
//! the view controls and applies the side effects that go with changing them.

use crate::pipeline::{GroupBy, RosterControls, SearchSelection, SortBy};
use kandoran_common::{CharacterRecord, PlayerAggregate, compare_names, player_aggregates};
use serde::Serialize;
use std::collections::HashSet;

/// One entry of the character search box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterOption {
    pub label: String,
    pub value: String,
}

fn matches_query(text: &str, needle: &str) -> bool {
    needle.is_empty() || text.to_lowercase().contains(needle)
}

/// Displayable characters whose name contains `query`, ordered by name
pub fn character_options(records: &[CharacterRecord], query: &str) -> Vec<CharacterOption> {
    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    let mut options: Vec<CharacterOption> = records
        .iter()
        .filter(|record| record.is_displayable())
        .filter(|record| matches_query(record.name(), &needle))
        .filter_map(|record| {
            let value = record.selection_key()?;
            Some(CharacterOption {
                label: record.name().to_string(),
                value: value.to_string(),
            })
        })
        .filter(|option| seen.insert(option.value.clone()))
        .collect();

    options.sort_by(|a, b| compare_names(&a.label, &b.label));
    options
}

/// Players of displayable characters whose name contains `query`
pub fn player_options(records: &[CharacterRecord], query: &str) -> Vec<PlayerAggregate> {
    let needle = query.trim().to_lowercase();
    player_aggregates(records.iter().filter(|record| record.is_displayable()))
        .into_iter()
        .filter(|player| matches_query(&player.name, &needle))
        .collect()
}

/// Find the player a free-text value refers to
///
/// Tries an exact match, then a case-insensitive one, then containment in
/// either direction.
pub fn resolve_player<'a>(options: &'a [PlayerAggregate], value: &str) -> Option<&'a PlayerAggregate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(exact) = options.iter().find(|player| player.name == value) {
        return Some(exact);
    }

    let lowered = value.to_lowercase();
    if let Some(folded) = options
        .iter()
        .find(|player| player.name.to_lowercase() == lowered)
    {
        return Some(folded);
    }

    options.iter().find(|player| {
        let name = player.name.to_lowercase();
        name.contains(&lowered) || lowered.contains(&name)
    })
}

/// Owner of the guild view controls
///
/// Selecting characters switches to an ungrouped view; clearing the selection
/// returns to level grouping. Changing the grouping picks the sort field that
/// suits it.
#[derive(Debug, Clone, Default)]
pub struct GuildController {
    controls: RosterControls,
}

impl GuildController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_controls(controls: RosterControls) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &RosterControls {
        &self.controls
    }

    pub fn into_controls(self) -> RosterControls {
        self.controls
    }

    pub fn selection(&self) -> &SearchSelection {
        &self.controls.selection
    }

    /// Toggle a character in the selection
    pub fn select_character(&mut self, key: &str) {
        self.controls.selection.toggle_character(key);
        if self.controls.selection.is_empty() {
            self.clear_selection();
        } else {
            self.controls.group_by = GroupBy::None;
        }
    }

    /// Toggle a player in the selection
    pub fn select_player(&mut self, name: &str) {
        self.controls.selection.toggle_player(name);
        if self.controls.selection.is_empty() {
            self.clear_selection();
        }
    }

    pub fn clear_selection(&mut self) {
        self.controls.selection.clear();
        self.controls.group_by = GroupBy::default();
    }

    pub fn set_group_by(&mut self, group_by: GroupBy) {
        self.controls.group_by = group_by;
        self.controls.sort_by = group_by.default_sort();
        self.controls.sort_ascending = false;
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.controls.sort_by = sort_by;
    }

    pub fn toggle_sort_direction(&mut self) {
        self.controls.sort_ascending = !self.controls.sort_ascending;
    }

    pub fn set_show_inactive(&mut self, show_inactive: bool) {
        self.controls.show_inactive = show_inactive;
    }

    /// Restore the default grouping, sorting and filters
    pub fn reset(&mut self) {
        let memorial = self.controls.memorial;
        self.controls = RosterControls {
            memorial,
            ..RosterControls::default()
        };
    }

    /// Short German description of the selection for the search box
    ///
    /// Character selections are described by name using `records`.
    pub fn selection_summary(&self, records: &[CharacterRecord]) -> Option<String> {
        let labels: Vec<String> = match &self.controls.selection {
            SearchSelection::Empty => return None,
            SearchSelection::Characters(keys) => keys
                .iter()
                .map(|key| {
                    records
                        .iter()
                        .find(|record| record.selection_key() == Some(key.as_str()))
                        .map(|record| record.name().to_string())
                        .unwrap_or_else(|| key.clone())
                })
                .collect(),
            SearchSelection::Players(names) => names.clone(),
        };

        match labels.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            [first, second] => Some(format!("{} & {}", first, second)),
            [first, second, rest @ ..] => Some(format!(
                "{}, {} & {} weitere ausgewählt",
                first,
                second,
                rest.len()
            )),
        }
    }
}

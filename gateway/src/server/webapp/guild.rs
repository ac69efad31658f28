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

//! Grouped guild and memorial views

use super::{ApiError, ready};
use crate::context::ServerContext;
use axum::extract::{Query, State};
use axum::response::Json;
use kandoran_common::CharacterRecord;
use kandoran_roster::{
    GroupBy, GuildController, PartitionControls, RosterControls, RosterGroup, SortBy, build_view,
    player_options, resolve_player,
};
use metrics::counter;
use serde::{Deserialize, Serialize};

/// Query parameters of the guild view
///
/// `characters` and `players` are comma separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct GuildQuery {
    pub group_by: Option<GroupBy>,
    pub sort_by: Option<SortBy>,
    pub ascending: Option<bool>,
    pub show_inactive: Option<bool>,
    pub characters: Option<String>,
    pub players: Option<String>,
}

fn split_list(value: Option<&str>) -> Vec<&str> {
    let mut items: Vec<&str> = Vec::new();
    for item in value.unwrap_or_default().split(',').map(str::trim) {
        if !item.is_empty() && !items.contains(&item) {
            items.push(item);
        }
    }
    items
}

impl GuildQuery {
    /// Replay the query as controller actions
    ///
    /// The selection goes first so explicit grouping and sorting win over
    /// the defaults a selection implies.
    fn controller(&self, records: &[CharacterRecord]) -> Result<GuildController, ApiError> {
        let characters = split_list(self.characters.as_deref());
        let players = split_list(self.players.as_deref());
        if !characters.is_empty() && !players.is_empty() {
            return Err(ApiError::BadRequest(
                "Select either characters or players, not both".to_string(),
            ));
        }

        let mut controller = GuildController::new();
        for key in characters {
            controller.select_character(key);
        }

        if !players.is_empty() {
            let options = player_options(records, "");
            let mut resolved: Vec<&str> = Vec::new();
            for value in players {
                let name = resolve_player(&options, value)
                    .map_or(value, |player| player.name.as_str());
                if !resolved.contains(&name) {
                    resolved.push(name);
                }
            }
            for name in resolved {
                controller.select_player(name);
            }
        }

        if let Some(group_by) = self.group_by {
            controller.set_group_by(group_by);
        }
        if let Some(sort_by) = self.sort_by {
            controller.set_sort_by(sort_by);
        }
        if let Some(ascending) = self.ascending
            && controller.controls().sort_ascending != ascending
        {
            controller.toggle_sort_direction();
        }
        if let Some(show_inactive) = self.show_inactive {
            controller.set_show_inactive(show_inactive);
        }

        Ok(controller)
    }
}

#[derive(Debug, Serialize)]
pub struct GuildResponse {
    pub controls: RosterControls,
    pub selection_summary: Option<String>,
    pub groups: Vec<RosterGroup>,
    pub memorial: Vec<RosterGroup>,
}

pub async fn guild_view(
    State(context): State<ServerContext>,
    Query(query): Query<GuildQuery>,
) -> Result<Json<GuildResponse>, ApiError> {
    counter!("gateway_api_requests_total", "route" => "guild").increment(1);
    let state = ready(context.current_roster().await)?;

    let controller = query.controller(&state.characters)?;
    let view = build_view(&state.characters, controller.controls());
    tracing::debug!(
        "Guild view with {} groups and {} characters",
        view.groups.len(),
        view.character_count()
    );

    Ok(Json(GuildResponse {
        selection_summary: controller.selection_summary(&state.characters),
        controls: controller.into_controls(),
        groups: view.groups,
        memorial: view.memorial,
    }))
}

/// Query parameters of the memorial view
#[derive(Debug, Default, Deserialize)]
pub struct MemorialQuery {
    pub group_by: Option<GroupBy>,
    pub sort_by: Option<SortBy>,
    pub ascending: Option<bool>,
}

impl MemorialQuery {
    fn controls(&self) -> PartitionControls {
        let defaults = PartitionControls::default();
        PartitionControls {
            group_by: self.group_by.unwrap_or(defaults.group_by),
            sort_by: self.sort_by.unwrap_or(defaults.sort_by),
            sort_ascending: self.ascending.unwrap_or(defaults.sort_ascending),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemorialResponse {
    pub controls: PartitionControls,
    pub groups: Vec<RosterGroup>,
}

pub async fn memorial_view(
    State(context): State<ServerContext>,
    Query(query): Query<MemorialQuery>,
) -> Result<Json<MemorialResponse>, ApiError> {
    counter!("gateway_api_requests_total", "route" => "memorial").increment(1);
    let state = ready(context.current_roster().await)?;

    let controls = RosterControls {
        memorial: query.controls(),
        ..RosterControls::default()
    };
    let view = build_view(&state.characters, &controls);

    Ok(Json(MemorialResponse {
        controls: controls.memorial,
        groups: view.memorial,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kandoran_roster::SearchSelection;

    fn roster() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord::new("Kasim", 9, "Rogue", "Active")
                .with_id("101")
                .with_player("Robin"),
            CharacterRecord::new("Mira", 6, "Cleric", "Active")
                .with_id("104")
                .with_player("Kim"),
        ]
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some(" 101, ,102,101 ")), vec!["101", "102"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_query_defaults() {
        let controller = GuildQuery::default().controller(&roster()).unwrap();
        assert_eq!(controller.controls(), &RosterControls::default());
    }

    #[test]
    fn test_query_rejects_mixed_selection() {
        let query = GuildQuery {
            characters: Some("101".to_string()),
            players: Some("Kim".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.controller(&roster()), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_query_character_selection_ungroups() {
        let query = GuildQuery {
            characters: Some("101".to_string()),
            ..Default::default()
        };
        let controls = query.controller(&roster()).unwrap().into_controls();
        assert_eq!(controls.group_by, GroupBy::None);
        assert_eq!(
            controls.selection,
            SearchSelection::Characters(vec!["101".to_string()])
        );
    }

    #[test]
    fn test_query_resolves_player_names() {
        let query = GuildQuery {
            players: Some("robin,ROB".to_string()),
            ..Default::default()
        };
        let controls = query.controller(&roster()).unwrap().into_controls();
        assert_eq!(
            controls.selection,
            SearchSelection::Players(vec!["Robin".to_string()])
        );
    }

    #[test]
    fn test_query_explicit_sorting() {
        let query = GuildQuery {
            group_by: Some(GroupBy::Class),
            sort_by: Some(SortBy::Alphabet),
            ascending: Some(true),
            show_inactive: Some(false),
            ..Default::default()
        };
        let controls = query.controller(&roster()).unwrap().into_controls();
        assert_eq!(controls.group_by, GroupBy::Class);
        assert_eq!(controls.sort_by, SortBy::Alphabet);
        assert!(controls.sort_ascending);
        assert!(!controls.show_inactive);
    }

    #[test]
    fn test_memorial_query_defaults() {
        assert_eq!(MemorialQuery::default().controls(), PartitionControls::default());
    }
}

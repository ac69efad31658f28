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

//! Raw roster and search endpoints

use super::{ApiError, StatusResponse, ready};
use crate::context::ServerContext;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use kandoran_common::PlayerAggregate;
use kandoran_roster::{CharacterOption, character_options, player_options};
use metrics::counter;
use serde::Deserialize;

/// Free-text search query
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// The roster payload exactly as published, for clients that render on their own
pub async fn list_characters(
    State(context): State<ServerContext>,
) -> Result<impl IntoResponse, ApiError> {
    counter!("gateway_api_requests_total", "route" => "characters").increment(1);
    let state = ready(context.current_roster().await)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CACHE_CONTROL, context.cache_control().to_string()),
        ],
        state.payload.to_string(),
    ))
}

/// Drop the cache and fetch the roster again
pub async fn refresh_characters(
    State(context): State<ServerContext>,
) -> Result<Json<StatusResponse>, ApiError> {
    counter!("gateway_api_requests_total", "route" => "refresh").increment(1);
    tracing::info!("Roster refresh requested");

    let state = ready(context.roster().refetch().await)?;
    Ok(Json(StatusResponse::from(&state)))
}

pub async fn search_characters(
    State(context): State<ServerContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CharacterOption>>, ApiError> {
    counter!("gateway_api_requests_total", "route" => "search").increment(1);
    let state = ready(context.current_roster().await)?;
    Ok(Json(character_options(&state.characters, &query.q)))
}

pub async fn search_players(
    State(context): State<ServerContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PlayerAggregate>>, ApiError> {
    counter!("gateway_api_requests_total", "route" => "players").increment(1);
    let state = ready(context.current_roster().await)?;
    Ok(Json(player_options(&state.characters, &query.q)))
}

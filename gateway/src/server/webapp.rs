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

//! JSON API over the cached roster

mod characters;
mod guild;

use crate::context::ServerContext;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use kandoran_roster::{LoadPhase, RosterState};
use serde::Serialize;
use serde_json::json;

pub fn router(context: &ServerContext) -> Router {
    Router::new()
        .route("/api/characters", get(characters::list_characters))
        .route("/api/characters/refresh", post(characters::refresh_characters))
        .route("/api/characters/search", get(characters::search_characters))
        .route("/api/players", get(characters::search_players))
        .route("/api/guild", get(guild::guild_view))
        .route("/api/guild/memorial", get(guild::memorial_view))
        .route("/api/status", get(status))
        .route("/health", get(health_check))
        .with_state(context.clone())
}

/// Errors returned by the API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No roster is available, not even a stale one
    #[error("Failed to fetch characters")]
    Unavailable,

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Roster of a state that carries data
fn ready(state: RosterState) -> Result<RosterState, ApiError> {
    match state.phase {
        LoadPhase::Failed => {
            if let Some(error) = &state.error {
                tracing::warn!("Roster unavailable: {}", error);
            }
            Err(ApiError::Unavailable)
        }
        _ => Ok(state),
    }
}

/// Provider status summary
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub phase: LoadPhase,
    pub characters: usize,
    pub error: Option<String>,
}

impl From<&RosterState> for StatusResponse {
    fn from(state: &RosterState) -> Self {
        Self {
            phase: state.phase,
            characters: state.characters.len(),
            error: state.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Report the provider state without triggering a load
async fn status(State(context): State<ServerContext>) -> Json<StatusResponse> {
    Json(StatusResponse::from(&context.roster().state()))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
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

//! Shared character types and utilities
//!
//! Records come from a spreadsheet export, so every field is optional on the
//! wire and the numeric columns are only numbers when the sheet cell was
//! filled in. Decoding is lenient per field; whether a record is fit for
//! display is a separate question answered by [`CharacterRecord::is_displayable`].

use crate::collate::compare_names;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Avatar shown for characters without their own image
pub const DEFAULT_AVATAR_URL: &str = "https://www.dndbeyond.com/avatars/default/0.jpg";

/// Base address of character sheets on D&D Beyond
pub const PROFILE_BASE_URL: &str = "https://www.dndbeyond.com/characters";

/// Character status as maintained in the roster sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterStatus {
    Active,
    Inactive,
    Dead,
    Other(String),
}

impl CharacterStatus {
    /// Display ranking used by the status sort
    pub fn rank(&self) -> u8 {
        match self {
            CharacterStatus::Active => 0,
            CharacterStatus::Inactive => 1,
            CharacterStatus::Dead => 2,
            CharacterStatus::Other(_) => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CharacterStatus::Active => "Active",
            CharacterStatus::Inactive => "Inactive",
            CharacterStatus::Dead => "Dead",
            CharacterStatus::Other(value) => value.as_str(),
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, CharacterStatus::Dead)
    }
}

impl From<&str> for CharacterStatus {
    fn from(value: &str) -> Self {
        match value {
            "Active" => CharacterStatus::Active,
            "Inactive" => CharacterStatus::Inactive,
            "Dead" => CharacterStatus::Dead,
            other => CharacterStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for CharacterStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Active" | "Inactive" | "Dead" => CharacterStatus::from(value.as_str()),
            _ => CharacterStatus::Other(value),
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for CharacterStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Adventuring companions of a character
///
/// The sheet stores them as one `", "` separated cell, hand edited files
/// sometimes use a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Buddies {
    Text(String),
    List(Vec<String>),
}

impl Buddies {
    /// Normalized, ordered buddy names with blanks removed
    pub fn names(&self) -> Vec<String> {
        match self {
            Buddies::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            Buddies::List(list) => list
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One character as published in the roster file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub secondary_class: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub secondary_subclass: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub gold: Option<u64>,
    #[serde(default, deserialize_with = "lenient_status", skip_serializing_if = "Option::is_none")]
    pub status: Option<CharacterStatus>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub games: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub last_game: Option<String>,
    #[serde(default, deserialize_with = "lenient_buddies", skip_serializing_if = "Option::is_none")]
    pub buddies: Option<Buddies>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

impl CharacterRecord {
    /// Create a record with the fields every displayable character needs
    pub fn new(
        name: impl Into<String>,
        level: u32,
        class: impl Into<String>,
        status: impl Into<CharacterStatus>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            level: Some(level),
            class: Some(class.into()),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_exp(mut self, exp: u64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn level(&self) -> u32 {
        self.level.unwrap_or(1)
    }

    pub fn class_name(&self) -> Option<&str> {
        non_empty(&self.class)
    }

    pub fn gold(&self) -> u64 {
        self.gold.unwrap_or(0)
    }

    pub fn exp(&self) -> u64 {
        self.exp.unwrap_or(0)
    }

    pub fn games(&self) -> u32 {
        self.games.unwrap_or(0)
    }

    pub fn status(&self) -> Option<&CharacterStatus> {
        self.status
            .as_ref()
            .filter(|status| !status.as_str().is_empty())
    }

    pub fn last_game(&self) -> &str {
        non_empty(&self.last_game).unwrap_or("-")
    }

    pub fn player(&self) -> Option<&str> {
        non_empty(&self.player)
    }

    pub fn avatar_url(&self) -> &str {
        non_empty(&self.avatar_url).unwrap_or(DEFAULT_AVATAR_URL)
    }

    pub fn buddies(&self) -> Vec<String> {
        self.buddies.as_ref().map(Buddies::names).unwrap_or_default()
    }

    /// Identity used by the character search, the id with the name as fallback
    pub fn selection_key(&self) -> Option<&str> {
        non_empty(&self.id).or_else(|| non_empty(&self.name))
    }

    /// Link to the character sheet when the record carries an external id
    pub fn profile_url(&self) -> Option<String> {
        non_empty(&self.id).map(|id| format!("{}/{}", PROFILE_BASE_URL, id))
    }

    /// Whether the record carries enough data to be shown in the guild
    ///
    /// Requires a name, a non-zero level, a class and a status.
    pub fn is_displayable(&self) -> bool {
        non_empty(&self.name).is_some()
            && self.level.is_some_and(|level| level > 0)
            && self.class_name().is_some()
            && self.status().is_some()
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
                    .map(|value| value as u64)
            })
            .and_then(|value| T::try_from(value).ok()),
        _ => None,
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CharacterStatus>, D::Error> {
    Ok(lenient_text(deserializer)?.map(CharacterStatus::from))
}

fn lenient_buddies<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Buddies>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(Buddies::Text(text)),
        Value::Array(items) => Some(Buddies::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    })
}

/// Errors raised while decoding a roster payload
#[derive(Debug, Error)]
pub enum RosterDecodeError {
    /// The payload is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but not an array of records.
    #[error("Expected a JSON array, found {0}")]
    NotAnArray(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a roster payload into records
///
/// Entries that are not JSON objects are skipped. Validity for display is
/// not checked here.
pub fn decode_roster(payload: &str) -> Result<Vec<CharacterRecord>, RosterDecodeError> {
    let entries = match serde_json::from_str::<Value>(payload)? {
        Value::Array(entries) => entries,
        other => return Err(RosterDecodeError::NotAnArray(json_kind(&other))),
    };

    let total = entries.len();
    let records: Vec<CharacterRecord> = entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!("Skipping undecodable roster entry: {}", err);
                None
            }
        })
        .collect();

    if records.len() != total {
        tracing::debug!("Dropped {} of {} roster entries", total - records.len(), total);
    }
    Ok(records)
}

/// Number of characters owned by one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub name: String,
    pub character_count: usize,
}

/// Count characters per distinct player, ordered by player name
pub fn player_aggregates<'a>(
    records: impl IntoIterator<Item = &'a CharacterRecord>,
) -> Vec<PlayerAggregate> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for player in records.into_iter().filter_map(CharacterRecord::player) {
        *counts.entry(player).or_default() += 1;
    }

    let mut players: Vec<PlayerAggregate> = counts
        .into_iter()
        .map(|(name, character_count)| PlayerAggregate {
            name: name.to_string(),
            character_count,
        })
        .collect();
    players.sort_by(|a, b| compare_names(&a.name, &b.name));
    players
}

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

//! Kandoran Roster Library
//!
//! This library provides the roster data provider, which fetches and caches
//! the published character list, and the guild view pipeline, which turns
//! that list into ordered groups for display.

pub mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod selection;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RosterConfig;
pub use error::{RosterError, RosterResult};
pub use pipeline::{
    GroupBy, PartitionControls, RosterControls, RosterGroup, RosterView, SearchSelection, SortBy,
    build_view,
};
pub use provider::{LoadPhase, ProviderOptions, RosterProvider, RosterState};
pub use selection::{
    CharacterOption, GuildController, character_options, player_options, resolve_player,
};
pub use source::{HttpRosterSource, RosterSource};
pub use store::{FileStore, KeyValueStore, MemoryStore};

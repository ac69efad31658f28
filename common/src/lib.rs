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

//! Kandoran Common Types
//!
//! This crate defines the shared data model used across the Kandoran roster:
//! - Character records as published in the roster JSON file
//! - Character status and its display ranking
//! - Player aggregates derived from the roster
//! - Name collation used for alphabetical ordering

pub mod character;
pub mod collate;

pub use character::{
    Buddies, CharacterRecord, CharacterStatus, PlayerAggregate, RosterDecodeError,
    decode_roster, player_aggregates,
};
pub use collate::compare_names;

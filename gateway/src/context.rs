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

use crate::config::Configuration;
use kandoran_roster::{
    FileStore, HttpRosterSource, KeyValueStore, MemoryStore, ProviderOptions,
    RosterProvider, RosterState, SystemClock,
};
use std::sync::Arc;

/// Server context containing shared resources
#[derive(Clone)]
pub struct ServerContext {
    /// Cached roster shared by every request
    pub roster: Arc<RosterProvider>,

    /// Cache-Control header for the raw roster
    pub cache_control: Arc<str>,
}

impl ServerContext {
    /// Create a new server context
    pub fn new(roster: Arc<RosterProvider>, cache_control: &str) -> Self {
        Self {
            roster,
            cache_control: Arc::from(cache_control),
        }
    }

    /// Wire the provider described by the configuration
    pub fn from_config(config: &Configuration) -> Result<Self, String> {
        let source = HttpRosterSource::new(&config.roster)
            .map_err(|e| format!("Failed to create roster source: {}", e))?;

        let store: Arc<dyn KeyValueStore> = match config.cache.file_path() {
            Some(path) => {
                tracing::info!("Caching roster in {}", path);
                Arc::new(
                    FileStore::open(path)
                        .map_err(|e| format!("Failed to open roster cache: {}", e))?,
                )
            }
            None => {
                tracing::info!("Caching roster in memory");
                Arc::new(MemoryStore::new())
            }
        };

        tracing::info!("Roster source is {}", source.url());
        let provider = RosterProvider::new(
            Arc::new(source),
            store,
            Arc::new(SystemClock),
            ProviderOptions::from(&config.roster),
        );

        Ok(Self::new(Arc::new(provider), &config.cache.cache_control))
    }

    /// Get the roster provider
    pub fn roster(&self) -> &Arc<RosterProvider> {
        &self.roster
    }

    /// Get the Cache-Control header value
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// Current roster, retrying explicitly when the last load failed
    pub async fn current_roster(&self) -> RosterState {
        self.roster.load_or_retry().await
    }
}

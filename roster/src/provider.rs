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

//! Roster data provider
//!
//! The provider owns the fetched character list and its cache entry. It
//! serves the list from the key-value store while the entry is fresh, fetches
//! it from the [`RosterSource`] otherwise, and falls back to a stale entry
//! when every fetch attempt fails.
//!
//! ## Deduplication and ordering
//!
//! Every fetch is tagged with a generation number. Concurrent `load()` calls
//! join the fetch that is already in flight. `refetch()` starts a new
//! generation, and only the newest generation may write the cache or publish
//! state, so a slow response to an older request can never overwrite fresher
//! data.
//!
//! ## Example
//!
//! ```rust,ignore
//! let provider = RosterProvider::new(source, store, Arc::new(SystemClock), options);
//! let state = provider.load().await;
//! for character in state.characters.iter() {
//!     println!("{}", character.name());
//! }
//! ```

use crate::clock::Clock;
use crate::config::RosterConfig;
use crate::error::{RosterError, RosterResult};
use crate::source::RosterSource;
use crate::store::KeyValueStore;
use futures::future::{BoxFuture, FutureExt, Shared};
use kandoran_common::{CharacterRecord, decode_roster};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, error, info, instrument, warn};

/// Store key holding the last fetched payload verbatim
pub const PAYLOAD_KEY: &str = "kandoran_characters";

/// Store key holding the payload's store time in milliseconds since the epoch
pub const TIMESTAMP_KEY: &str = "kandoran_characters_time";

/// Lifecycle of the roster as seen by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Snapshot of the provider published to every consumer
#[derive(Debug, Clone)]
pub struct RosterState {
    pub phase: LoadPhase,
    pub characters: Arc<Vec<CharacterRecord>>,
    /// The payload `characters` was decoded from, exactly as published
    pub payload: Arc<str>,
    pub error: Option<RosterError>,
}

impl RosterState {
    fn idle() -> Self {
        Self {
            phase: LoadPhase::Idle,
            characters: Arc::new(Vec::new()),
            payload: Arc::from(EMPTY_PAYLOAD),
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.phase == LoadPhase::Ready
    }
}

const EMPTY_PAYLOAD: &str = "[]";

/// Tuning for cache freshness and retries
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// How long a cached payload is served without revalidation
    pub cache_ttl: Duration,
    /// Automatic retries after the first failed attempt
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60 * 60),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl From<&RosterConfig> for ProviderOptions {
    fn from(config: &RosterConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

/// A payload together with its decoded records
#[derive(Debug)]
struct Decoded {
    payload: Arc<str>,
    characters: Arc<Vec<CharacterRecord>>,
}

impl Decoded {
    fn parse(payload: &str) -> RosterResult<Self> {
        let characters = decode_roster(payload)?;
        Ok(Self {
            payload: Arc::from(payload),
            characters: Arc::new(characters),
        })
    }

    fn empty() -> Self {
        Self {
            payload: Arc::from(EMPTY_PAYLOAD),
            characters: Arc::new(Vec::new()),
        }
    }
}

type FetchResult = Result<Arc<Decoded>, RosterError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

/// Generation bookkeeping; `in_flight` always belongs to `generation`
#[derive(Default)]
struct Flights {
    generation: u64,
    in_flight: Option<InFlight>,
}

/// Cached, deduplicating provider of the character roster
pub struct RosterProvider {
    source: Arc<dyn RosterSource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    options: ProviderOptions,
    flights: Mutex<Flights>,
    /// Last decoded cache entry, reused while the stored payload is unchanged
    decoded: RwLock<Option<Arc<Decoded>>>,
    state: watch::Sender<RosterState>,
}

impl std::fmt::Debug for RosterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterProvider")
            .field("source", &"Arc<dyn RosterSource>")
            .field("store", &"Arc<dyn KeyValueStore>")
            .field("clock", &"Arc<dyn Clock>")
            .field("options", &self.options)
            .field("phase", &self.state.borrow().phase)
            .finish()
    }
}

impl RosterProvider {
    /// Create a new provider
    pub fn new(
        source: Arc<dyn RosterSource>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        options: ProviderOptions,
    ) -> Self {
        let (state, _) = watch::channel(RosterState::idle());
        Self {
            source,
            store,
            clock,
            options,
            flights: Mutex::new(Flights::default()),
            decoded: RwLock::new(None),
            state,
        }
    }

    /// Current snapshot
    pub fn state(&self) -> RosterState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<RosterState> {
        self.state.subscribe()
    }

    /// Return the roster, from cache while fresh, from the source otherwise
    ///
    /// A provider that failed without any cached data stays failed until
    /// [`RosterProvider::refetch`] is called.
    #[instrument(skip(self))]
    pub async fn load(&self) -> RosterState {
        self.load_with(false).await
    }

    /// Like [`RosterProvider::load`], but a failed provider fetches again
    ///
    /// Concurrent callers that find the provider failed share one new fetch.
    #[instrument(skip(self))]
    pub async fn load_or_retry(&self) -> RosterState {
        self.load_with(true).await
    }

    async fn load_with(&self, retry_failed: bool) -> RosterState {
        if let Some(cached) = self.read_cache(true).await {
            counter!("roster.cache.hits").increment(1);
            debug!("Serving {} characters from cache", cached.characters.len());
            return self.publish(LoadPhase::Ready, &cached, None);
        }
        counter!("roster.cache.misses").increment(1);

        let (generation, fetch) = {
            let mut flights = self.flights.lock().await;
            let joined = flights
                .in_flight
                .as_ref()
                .map(|in_flight| (in_flight.generation, in_flight.fetch.clone()));

            match joined {
                Some((generation, fetch)) => {
                    debug!(generation, "Joining in-flight roster fetch");
                    (generation, fetch)
                }
                None if self.phase() == LoadPhase::Failed => {
                    if !retry_failed {
                        return self.state();
                    }
                    info!("Retrying failed roster load");
                    self.start_flight(&mut flights)
                }
                None => self.start_flight(&mut flights),
            }
        };

        self.await_flight(generation, fetch).await
    }

    /// Drop the cache entry and fetch again, superseding any fetch in flight
    #[instrument(skip(self))]
    pub async fn refetch(&self) -> RosterState {
        let (generation, fetch) = {
            let mut flights = self.flights.lock().await;
            self.store.remove(PAYLOAD_KEY).await;
            self.store.remove(TIMESTAMP_KEY).await;
            if let Some(previous) = &flights.in_flight {
                debug!(generation = previous.generation, "Superseding in-flight roster fetch");
            }
            self.start_flight(&mut flights)
        };

        self.await_flight(generation, fetch).await
    }

    fn start_flight(&self, flights: &mut Flights) -> (u64, SharedFetch) {
        flights.generation += 1;
        let generation = flights.generation;

        let fetch = fetch_with_retries(
            Arc::clone(&self.source),
            self.options.max_retries,
            self.options.retry_delay,
        )
        .boxed()
        .shared();

        flights.in_flight = Some(InFlight {
            generation,
            fetch: fetch.clone(),
        });

        self.state.send_modify(|state| {
            state.phase = LoadPhase::Loading;
            state.error = None;
        });
        info!(generation, "Starting roster fetch");

        (generation, fetch)
    }

    async fn await_flight(&self, mut generation: u64, mut fetch: SharedFetch) -> RosterState {
        loop {
            let result = fetch.await;

            let mut flights = self.flights.lock().await;
            if generation == flights.generation {
                // The first caller to get here settles, the others read the result.
                return match flights.in_flight.take() {
                    Some(_) => self.settle(result).await,
                    None => self.state(),
                };
            }

            debug!(generation, latest = flights.generation, "Roster fetch superseded");
            match &flights.in_flight {
                Some(in_flight) => {
                    generation = in_flight.generation;
                    fetch = in_flight.fetch.clone();
                }
                None => return self.state(),
            }
        }
    }

    async fn settle(&self, result: FetchResult) -> RosterState {
        match result {
            Ok(fetched) => {
                let stored_at = self.clock.now_millis();
                self.store.set(PAYLOAD_KEY, &fetched.payload).await;
                self.store.set(TIMESTAMP_KEY, &stored_at.to_string()).await;
                *self.decoded.write().await = Some(Arc::clone(&fetched));
                info!("Loaded {} characters", fetched.characters.len());
                self.publish(LoadPhase::Ready, &fetched, None)
            }
            Err(err) => {
                counter!("roster.fetch.failures").increment(1);
                match self.read_cache(false).await {
                    Some(stale) => {
                        counter!("roster.fallback.stale").increment(1);
                        warn!(
                            "Roster fetch failed, serving {} cached characters: {}",
                            stale.characters.len(),
                            err
                        );
                        self.publish(LoadPhase::Ready, &stale, None)
                    }
                    None => {
                        error!("Roster fetch failed with no cached data: {}", err);
                        self.publish(LoadPhase::Failed, &Decoded::empty(), Some(err))
                    }
                }
            }
        }
    }

    fn publish(&self, phase: LoadPhase, roster: &Decoded, error: Option<RosterError>) -> RosterState {
        let state = RosterState {
            phase,
            characters: Arc::clone(&roster.characters),
            payload: Arc::clone(&roster.payload),
            error,
        };
        self.state.send_replace(state.clone());
        state
    }

    /// Read the cached roster, optionally only while it is fresh
    async fn read_cache(&self, require_fresh: bool) -> Option<Arc<Decoded>> {
        let payload = self.store.get(PAYLOAD_KEY).await?;

        if require_fresh {
            let stored_at: i64 = self.store.get(TIMESTAMP_KEY).await?.trim().parse().ok()?;
            let age = i128::from(self.clock.now_millis()) - i128::from(stored_at);
            if age >= self.options.cache_ttl.as_millis() as i128 {
                return None;
            }
        }

        let memo = self.decoded.read().await.clone();
        if let Some(decoded) = memo
            && *decoded.payload == *payload
        {
            return Some(decoded);
        }

        match Decoded::parse(&payload) {
            Ok(decoded) => {
                let decoded = Arc::new(decoded);
                *self.decoded.write().await = Some(Arc::clone(&decoded));
                Some(decoded)
            }
            Err(e) => {
                warn!("Ignoring unreadable cached roster: {}", e);
                None
            }
        }
    }
}

async fn fetch_with_retries(
    source: Arc<dyn RosterSource>,
    max_retries: u32,
    retry_delay: Duration,
) -> FetchResult {
    let mut attempts = 0;
    loop {
        attempts += 1;
        counter!("roster.fetch.attempts").increment(1);

        match fetch_once(source.as_ref()).await {
            Ok(fetched) => return Ok(Arc::new(fetched)),
            Err(err) if attempts <= max_retries => {
                warn!(attempt = attempts, "Roster fetch failed, retrying: {}", err);
                if !retry_delay.is_zero() {
                    tokio::time::sleep(retry_delay).await;
                }
            }
            Err(err) => {
                return Err(RosterError::LoadFailed {
                    attempts,
                    cause: Box::new(err),
                });
            }
        }
    }
}

async fn fetch_once(source: &dyn RosterSource) -> RosterResult<Decoded> {
    let payload = source.fetch().await?;
    Decoded::parse(&payload)
}

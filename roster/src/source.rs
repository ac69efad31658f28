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

//! Roster source implementations

use crate::config::RosterConfig;
use crate::error::{RosterError, RosterResult};
use async_trait::async_trait;
use std::time::Duration;

/// Trait for roster sources
///
/// A source returns the raw roster payload. Decoding and caching are the
/// provider's business.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Fetch the raw roster payload
    async fn fetch(&self) -> RosterResult<String>;
}

/// Roster file served over HTTP
pub struct HttpRosterSource {
    url: String,
    client: reqwest::Client,
}

impl HttpRosterSource {
    /// Create a new HTTP source from the roster configuration
    pub fn new(config: &RosterConfig) -> RosterResult<Self> {
        Self::with_url(config.data_url(), config.timeout())
    }

    /// Create a new HTTP source for an explicit URL
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> RosterResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(RosterError::Config("Roster URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RosterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RosterSource for HttpRosterSource {
    async fn fetch(&self) -> RosterResult<String> {
        tracing::debug!("Fetching roster from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RosterError::Network(format!("Request failed: {}", e)))?;

        // The body of an error page is never parsed.
        if !response.status().is_success() {
            return Err(RosterError::Http(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| RosterError::Network(format!("Failed to read response body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_uses_configured_url() {
        let config = RosterConfig::default();
        let source = HttpRosterSource::new(&config).unwrap();
        assert_eq!(source.url(), config.data_url());
    }

    #[test]
    fn test_http_source_rejects_empty_url() {
        assert!(matches!(
            HttpRosterSource::with_url("  ", Duration::from_secs(1)),
            Err(RosterError::Config(_))
        ));
    }
}

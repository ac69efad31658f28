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

//! Roster error types

use kandoran_common::RosterDecodeError;
use thiserror::Error;

/// Errors that can occur while loading the roster.
///
/// Errors are cloneable because a single in-flight fetch hands its result to
/// every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The request could not be sent or the body could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The body is not a JSON array of records.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The provider or its source is misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The cache store could not be opened.
    #[error("Store error: {0}")]
    Store(String),

    /// Every fetch attempt failed and no cached roster was available.
    #[error("Failed to load characters after {attempts} attempt(s): {cause}")]
    LoadFailed {
        attempts: u32,
        cause: Box<RosterError>,
    },
}

impl From<RosterDecodeError> for RosterError {
    fn from(err: RosterDecodeError) -> Self {
        RosterError::Decode(err.to_string())
    }
}

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failed_message() {
        let err = RosterError::LoadFailed {
            attempts: 4,
            cause: Box::new(RosterError::Http(503)),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load characters after 4 attempt(s): HTTP error: status 503"
        );
    }

    #[test]
    fn test_decode_error_conversion() {
        let decode = kandoran_common::decode_roster("{}").unwrap_err();
        let err: RosterError = decode.into();
        assert!(matches!(err, RosterError::Decode(_)));
    }
}

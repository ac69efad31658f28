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

use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::time::Duration;

/// Where the roster file lives and how it is cached
///
/// The file is read from `raw.githubusercontent.com` using the
/// owner/repo/branch/path coordinates unless `url` overrides them.
#[derive(Debug, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_owner")]
    pub owner: EnvField<String>,

    #[serde(default = "default_repo")]
    pub repo: EnvField<String>,

    #[serde(default = "default_branch")]
    pub branch: EnvField<String>,

    #[serde(default = "default_path")]
    pub path: EnvField<String>,

    /// Full URL of the roster file, takes precedence over the coordinates
    #[serde(default)]
    pub url: Option<EnvField<String>>,

    /// Cache freshness window in seconds (default: 3600)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    /// Automatic retries after a failed fetch (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries in milliseconds (default: 500)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// HTTP request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn env_field(value: &str) -> EnvField<String> {
    // A plain string without `${...}` never fails to parse.
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .unwrap_or_default()
}

fn default_owner() -> EnvField<String> {
    env_field("RoKoDerBoss")
}

fn default_repo() -> EnvField<String> {
    env_field("kandoran_website")
}

fn default_branch() -> EnvField<String> {
    env_field("main")
}

fn default_path() -> EnvField<String> {
    env_field("data/characters.json")
}

fn default_cache_ttl() -> u64 {
    60 * 60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            owner: default_owner(),
            repo: default_repo(),
            branch: default_branch(),
            path: default_path(),
            url: None,
            cache_ttl: default_cache_ttl(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RosterConfig {
    /// Resolved address of the roster file
    pub fn data_url(&self) -> String {
        match &self.url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                self.owner.as_str(),
                self.repo.as_str(),
                self.branch.as_str(),
                self.path.as_str().trim_start_matches('/'),
            ),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_roster_config_default() {
        let config = RosterConfig::default();
        assert_eq!(
            config.data_url(),
            "https://raw.githubusercontent.com/RoKoDerBoss/kandoran_website/main/data/characters.json"
        );
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay(), Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_roster_config_partial_yaml() {
        let config: RosterConfig = serde_yaml::from_str(
            r#"
owner: someone
branch: develop
cache_ttl: 60
"#,
        )
        .unwrap();

        assert_eq!(
            config.data_url(),
            "https://raw.githubusercontent.com/someone/kandoran_website/develop/data/characters.json"
        );
        assert_eq!(config.cache_ttl, 60);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_roster_config_url_override() {
        let config: RosterConfig =
            serde_yaml::from_str("url: http://localhost:9000/characters.json\n").unwrap();
        assert_eq!(config.data_url(), "http://localhost:9000/characters.json");
    }

    #[test]
    fn test_roster_config_env_substitution() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            std::env::set_var("KANDORAN_ROSTER_BRANCH", "preview");
        }

        let config: RosterConfig =
            serde_yaml::from_str("branch: \"${KANDORAN_ROSTER_BRANCH:-main}\"\n").unwrap();

        unsafe {
            std::env::remove_var("KANDORAN_ROSTER_BRANCH");
        }

        assert_eq!(config.branch.as_str(), "preview");
    }
}

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

use clap::Parser;
use kandoran_roster::RosterConfig;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

/// Cache-Control value sent with the raw roster
pub const DEFAULT_CACHE_CONTROL: &str = "public, s-maxage=14400, stale-while-revalidate=86400";

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "gateway/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "gateway/.env"
    )]
    pub env_file: Option<String>,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub http: Option<HttpConfig>,

    #[serde(default)]
    pub roster: RosterConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Self, String> {
        tracing::debug!("Loading configuration from file: {}", path);
        let file =
            std::fs::File::open(path).map_err(|e| format!("Failed to open config file: {}", e))?;

        let conf = serde_yaml::from_reader(file)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(conf)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// File backing the roster cache, empty keeps it in memory
    #[serde(default)]
    pub path: EnvField<String>,

    /// Cache-Control header for `/api/characters`
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

fn default_cache_control() -> String {
    DEFAULT_CACHE_CONTROL.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            path: Default::default(),
            cache_control: default_cache_control(),
        }
    }
}

impl CacheConfig {
    pub fn file_path(&self) -> Option<&str> {
        Some(self.path.trim()).filter(|path| !path.is_empty())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub addr: EnvField<HttpBinding>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HttpBinding(SocketAddr);

impl HttpBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for HttpBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            8080,
        )))
    }
}

impl std::fmt::Display for HttpBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

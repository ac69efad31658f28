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
use kandoran_gateway::ServerContext;
use kandoran_gateway::config::{Arguments, Configuration};
use kandoran_roster::LoadPhase;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // Load configuration from a file with environment variable substitution
    let config: Configuration = Configuration::load(&arguments.config_file)
        .inspect_err(|err| eprintln!("Configuration load error: {}", err))
        .expect("Unable to load configuration file");

    debug!("Configuration loaded: {:?}", config);
    info!("Starting Kandoran Gateway Server...");

    let context = ServerContext::from_config(&config)
        .inspect_err(|err| eprintln!("Server context error: {}", err))
        .expect("Unable to create server context");

    // Warm the cache so the first request is served from it
    let state = context.roster().load().await;
    match state.phase {
        LoadPhase::Failed => warn!(
            "Starting without roster data: {}",
            state
                .error
                .map(|error| error.to_string())
                .unwrap_or_default()
        ),
        _ => info!("Roster ready with {} characters", state.characters.len()),
    }

    let webapp = kandoran_gateway::router(&context);

    let http_config = config.http.unwrap_or_default();
    let http_listener = tokio::net::TcpListener::bind(http_config.addr.to_addr())
        .await
        .expect("Unable to bind to the http port");

    info!(
        "HTTP Server listening on {} ({}:{})",
        http_config.addr,
        http_config.addr.to_ip(),
        http_config.addr.to_port()
    );

    axum::serve(http_listener, webapp)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down Kandoran Gateway Server");
        })
        .await
        .expect("HTTP server failed");
}

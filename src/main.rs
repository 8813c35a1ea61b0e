// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use content_store::config::load_config_with_env;
use content_store::{BackendFactory, FieldFilter};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Content Store - read and write records across ordered backends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one record
    Get {
        key: String,
        /// Comma-separated fields to return
        #[arg(long)]
        fields: Option<String>,
    },
    /// Fetch several records
    GetMany {
        #[arg(required = true)]
        keys: Vec<String>,
        #[arg(long)]
        fields: Option<String>,
    },
    /// Insert a record into the primary backend
    Insert { key: String, record: String },
    /// Update a record in the primary backend
    Update { key: String, record: String },
    /// Delete a record from the primary backend
    Delete { key: String },
    /// Run a search query (JSON)
    Search { query: String },
    /// Report backend health
    Health,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file
    let mut store_config = load_config_with_env(&args.config)?;

    // Apply CLI overrides
    if let Some(level) = args.log_level {
        store_config.logging.level = level;
    }

    // Initialize tracing with configured level; RUST_LOG wins when set
    let log_level = match store_config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Loaded configuration from: {:?}", args.config);
    info!("Configured backends: {}", store_config.backends.len());

    let orchestrator = BackendFactory::build_orchestrator(&store_config)?;
    orchestrator.initialize().await?;

    match args.command {
        Command::Get { key, fields } => {
            let filter = fields.as_deref().map(FieldFilter::parse);
            print_json(&orchestrator.fetch_one(&key, filter.as_ref()).await?)?;
        }
        Command::GetMany { keys, fields } => {
            let filter = fields.as_deref().map(FieldFilter::parse);
            print_json(&orchestrator.fetch_many(&keys, filter.as_ref()).await?)?;
        }
        Command::Insert { key, record } => {
            print_json(&orchestrator.insert(&key, parse_json(&record)?).await?)?;
        }
        Command::Update { key, record } => {
            print_json(&orchestrator.update(&key, parse_json(&record)?).await?)?;
        }
        Command::Delete { key } => {
            print_json(&orchestrator.delete(&key).await?)?;
        }
        Command::Search { query } => {
            print_json(&orchestrator.search(&parse_json(&query)?).await?)?;
        }
        Command::Health => {
            let report: Vec<Value> = orchestrator
                .health()
                .await
                .into_iter()
                .map(|(backend, healthy)| serde_json::json!({"backend": backend, "healthy": healthy}))
                .collect();
            print_json(&report)?;
        }
    }

    Ok(())
}

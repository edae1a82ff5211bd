//! `optimizecx` — developer tooling for the speculative-navigation optimizer.
//!
//! ```text
//! optimizecx rules prerender
//! optimizecx resolve --query '?optimized=true' --stored preload
//! optimizecx prime-url http://localhost:3000/ --run 6
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use optimizecx_core::errors::OptimizeError;
use optimizecx_core::overrides::override_url;
use optimizecx_core::ports::KeyValueStore;
use optimizecx_core::resolver::ModeResolver;
use optimizecx_core::rules;
use optimizecx_core::{OptimizationMode, OverrideSignal, SpeculationConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "optimizecx", version, about = "OptimizeCX speculative-navigation tooling")]
struct Cli {
    /// JSON config file overriding the default identifiers and targets.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the speculation-rules document a mode compiles to.
    Rules {
        /// Mode name (none, prefetch, preload, prerender).
        mode: String,
    },
    /// Dry-run mode resolution for a query string and stored value.
    Resolve {
        /// Query string of the navigation (`?optimization=prefetch`).
        #[arg(long, default_value = "")]
        query: String,
        /// Value currently in durable storage.
        #[arg(long)]
        stored: Option<String>,
    },
    /// Build the URL that primes a browser context into a mode.
    PrimeUrl {
        /// Storefront base URL.
        base: String,
        /// Explicit mode.
        #[arg(long, conflicts_with = "run")]
        mode: Option<String>,
        /// Load-test iteration index; rotates through every mode.
        #[arg(long)]
        run: Option<u64>,
    },
}

/// Single-key store standing in for the browser's localStorage.
#[derive(Default)]
struct DryRunStore {
    values: HashMap<String, String>,
    writes: Vec<(String, String)>,
}

impl KeyValueStore for DryRunStore {
    fn get(&self, key: &str) -> Result<Option<String>, OptimizeError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), OptimizeError> {
        self.writes.push((key.to_string(), value.to_string()));
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SpeculationConfig> {
    let Some(path) = path else {
        return Ok(SpeculationConfig::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = SpeculationConfig::from_json(&json).with_context(|| format!("loading {}", path.display()))?;
    tracing::debug!(path = %path.display(), storage_key = %config.storage_key, "config loaded");
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Rules { mode } => {
            let parsed: OptimizationMode = mode.parse()?;
            match rules::compile(parsed, &config) {
                Some(document) => {
                    let value = serde_json::to_value(&document)?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                None => eprintln!("{parsed}: no declarative speculation rules"),
            }
        }
        Command::Resolve { query, stored } => {
            let mut store = DryRunStore::default();
            if let Some(stored) = stored {
                store.values.insert(config.storage_key.clone(), stored);
            }
            let signal = OverrideSignal::from_query(&query, &config);
            let resolution = ModeResolver::new(config.storage_key.clone()).resolve(&signal, &mut store);
            tracing::debug!(query = %query, ?resolution, "dry-run resolution");
            let report = serde_json::json!({
                "optimizationMode": resolution.mode,
                "source": format!("{:?}", resolution.source).to_lowercase(),
                "persisted": resolution.persisted,
                "writes": store.writes,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::PrimeUrl { base, mode, run } => {
            let mode = match (mode, run) {
                (Some(mode), _) => mode.parse()?,
                (None, Some(run)) => OptimizationMode::for_run(run),
                (None, None) => bail!("one of --mode or --run is required"),
            };
            println!("{}", override_url(&base, mode, &config));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

//! utility-registry — deploy a registry from a manifest, or replay an
//! event log, and print the resulting catalog and canonical hash.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use utility_registry::engine::Registry;
use utility_registry::events::EventEnvelope;
use utility_registry::hashing::canonical_hash;
use utility_runtime::drift::verify_determinism;
use utility_runtime::manifest::DeployManifest;

#[derive(Parser)]
#[command(name = "utility-registry")]
#[command(about = "Multi-utility NFT registry")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a registry and print its catalog
    Deploy {
        /// Deploy manifest (JSON). Uses the reference deployment if omitted.
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
    /// Replay a JSON array of events and print the final state hash
    Replay {
        #[arg(short, long)]
        events: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Deploy { manifest } => {
            let manifest = match manifest {
                Some(path) => DeployManifest::load(&path)?,
                None => DeployManifest::default(),
            };
            let registry = manifest.deploy()?;
            info!(admin = %registry.admin(), "Multiutility registry deployed");
            print_summary(&registry);
        }
        Command::Replay { events } => {
            let data = fs::read_to_string(&events)
                .with_context(|| format!("reading {}", events.display()))?;
            let events: Vec<EventEnvelope> =
                serde_json::from_str(&data).context("parsing event log")?;

            verify_determinism(&events)?;
            let registry = Registry::replay(&events)?;
            print_summary(&registry);
        }
    }

    Ok(())
}

fn print_summary(registry: &Registry) {
    println!("{} ({})", registry.name(), registry.symbol());
    println!("admin:     {}", registry.admin());
    let ids: Vec<String> = registry
        .list_utility_ids()
        .iter()
        .map(|id| id.to_string())
        .collect();
    println!("utilities: [{}]", ids.join(", "));
    println!("units:     {}", registry.total_minted());
    println!("sequence:  {}", registry.last_sequence());
    println!("hash:      {}", canonical_hash(registry.state()));
}

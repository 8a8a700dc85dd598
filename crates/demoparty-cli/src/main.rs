//! Demoparty CLI - prints upcoming demoparties from demoparty.net.
//!
//! Reads the cached party list when it is fresh, otherwise fetches and
//! parses the feed (falling back to a built-in list when it is unreachable).

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use demoparty_core::{Config, PartyRecord, PartyService};

#[derive(Parser, Debug)]
#[command(name = "demoparty")]
#[command(about = "List upcoming demoparties from demoparty.net")]
struct Args {
    /// Ignore the cache and fetch the feed
    #[arg(short, long)]
    refresh: bool,

    /// Delete the cached party list and exit
    #[arg(long)]
    clear_cache: bool,

    /// Print the party list as JSON
    #[arg(short, long)]
    json: bool,

    /// Group parties by region
    #[arg(long)]
    regions: bool,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=demoparty_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_tracing();

    let config = Config::load().context("Failed to load configuration")?;
    let mut service = PartyService::from_config(&config)?;

    if args.clear_cache {
        service.clear_cache();
        eprintln!("Cache cleared");
        return Ok(());
    }

    info!(refresh = args.refresh, "Loading parties");
    service.load_parties(!args.refresh).await;

    if let Some(error) = service.error() {
        anyhow::bail!(error);
    }

    if args.json {
        let json = serde_json::to_string_pretty(service.parties())
            .context("Failed to serialize parties")?;
        println!("{}", json);
        return Ok(());
    }

    print_summary(&service);
    if args.regions {
        for (region, parties) in service.parties_by_region() {
            if parties.is_empty() {
                continue;
            }
            println!("\n== {} ({}) ==", region, parties.len());
            for party in parties {
                print_party(party);
            }
        }
    } else {
        println!();
        for party in service.upcoming_parties() {
            print_party(party);
        }
    }

    Ok(())
}

fn print_summary(service: &PartyService) {
    let stats = service.stats();
    println!(
        "{} parties, {} upcoming, {} online, {} this month",
        stats.total, stats.upcoming, stats.online, stats.this_month
    );
    if let Some(updated) = service.last_updated() {
        let age = service.cache_age().unwrap_or_default();
        println!(
            "Last updated {} {}",
            updated.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            age
        );
    }
}

fn print_party(party: &PartyRecord) {
    let mode = if party.is_online { " [online]" } else { "" };
    println!("{}{}", party.name, mode);
    println!("  {}  {}", party.date_label, party.country);
    println!("  {} | {} | {}", party.location, party.party_type, party.platforms_display());
    if !party.description.is_empty() {
        println!("  {}", party.description);
    }
    println!("  {}", party.url);
}

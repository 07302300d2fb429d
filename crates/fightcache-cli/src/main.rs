//! fightcache - MMA fighter, event and odds data from the terminal.
//!
//! Every command serves from the local cache when it can and refreshes from
//! the data service in the background, so it keeps working offline.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fightcache_core::models::{EventInfo, Fighter, OddsChartPoint};
use fightcache_core::utils::{format_optional, truncate_string};
use fightcache_core::{ApiClient, CacheManager, Config, LoadingState, Startup, SyncManager};

// ============================================================================
// Constants
// ============================================================================

/// Log file written inside the cache directory
const LOG_FILE: &str = "fightcache.log";

/// Column width for fighter names in card listings
const NAME_WIDTH: usize = 24;

#[derive(Parser, Debug)]
#[command(name = "fightcache", version, about = "MMA fighter, event and odds data with an offline cache")]
struct Cli {
    /// Ignore the freshness window and always refetch
    #[arg(long, global = true)]
    force: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh data from the server
    Sync,
    /// Show a fighter's profile and fight record
    Fighter {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// List upcoming cards, soonest first
    Upcoming,
    /// List the most recent completed cards
    Past,
    /// Show sportsbook odds movement for a fighter
    Odds {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Show cache age, loading state and server data version
    Status,
    /// Delete the cached snapshot so the next run fetches from scratch
    Clear,
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=fightcache_core=debug).
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    // File logging is best effort; stderr still works without it
    if std::fs::create_dir_all(log_dir).is_err() {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;
    let cache_dir = config.cache_dir()?;
    let _log_guard = init_tracing(&cache_dir);
    info!(base_url = %config.base_url(), cache_dir = %cache_dir.display(), "fightcache starting");

    let client = ApiClient::from_config(&config).context("Invalid data service URL")?;
    let cache = CacheManager::open(cache_dir)?;
    if matches!(cli.command, Command::Clear) {
        cache.clear()?;
        println!("Cache cleared");
        return Ok(());
    }

    let sync = Arc::new(
        SyncManager::new(Arc::new(client.clone()), cache)
            .with_freshness_window(config.freshness_window()),
    );

    let background = match sync.start().await {
        Startup::Hydrated { refresh } => Some(refresh),
        Startup::Fetched(outcome) => {
            debug!(?outcome, "Cold start fetch finished");
            None
        }
    };

    match cli.command {
        Command::Sync => {
            // Let the startup refresh settle so this one is not coalesced
            if let Some(refresh) = background {
                let _ = refresh.await;
            }
            let outcome = if cli.force {
                sync.force_refresh().await
            } else {
                sync.refresh().await
            };
            println!("{:?}", outcome);
            print_state(&sync.loading_state());
            return Ok(());
        }
        Command::Fighter { name } => show_fighter(&sync, &name.join(" "), cli.json)?,
        Command::Upcoming => print_cards(&sync.upcoming_events(), cli.json)?,
        Command::Past => print_cards(&sync.past_events(), cli.json)?,
        Command::Odds { name } => show_odds(&sync, &name.join(" "), cli.json).await?,
        Command::Status => show_status(&sync, &client).await,
        Command::Clear => {}
    }

    // Keep the cache current for the next run
    if let Some(refresh) = background {
        match refresh.await {
            Ok(outcome) => debug!(?outcome, "Background refresh finished"),
            Err(e) => warn!(error = %e, "Background refresh task failed"),
        }
    }

    info!("fightcache exiting");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_state(state: &LoadingState) {
    match state {
        LoadingState::Error(message) => eprintln!("Refresh failed: {} (showing cached data)", message),
        LoadingState::Loading => eprintln!("Refresh in progress"),
        LoadingState::Idle | LoadingState::Success => {}
    }
}

fn show_fighter(sync: &SyncManager, name: &str, json: bool) -> Result<()> {
    let Some(fighter) = sync.fighter(name) else {
        print_state(&sync.loading_state());
        anyhow::bail!("No fighter named {:?}", name);
    };
    if json {
        return print_json(&fighter);
    }

    print_profile(&fighter);

    let records = sync.fight_records(&fighter.name).unwrap_or_default();
    if !records.is_empty() {
        println!();
        for record in records {
            let finish = match (record.round, record.time.as_deref()) {
                (Some(round), Some(time)) => format!("R{} {}", round, time),
                (Some(round), None) => format!("R{}", round),
                _ => String::new(),
            };
            println!(
                "  {} {:<width$} {:<14} {:<10} {:<12} {}",
                record.outcome.letter(),
                truncate_string(&record.opponent, NAME_WIDTH),
                truncate_string(&format_optional(&record.method, "-"), 14),
                finish,
                record.date,
                record.event,
                width = NAME_WIDTH,
            );
        }
    }
    Ok(())
}

fn print_profile(fighter: &Fighter) {
    match fighter.nickname.as_deref() {
        Some(nick) if !nick.is_empty() => println!("{} \"{}\"", fighter.name, nick),
        _ => println!("{}", fighter.name),
    }
    println!("  Record:       {}", fighter.record());
    println!("  Weight class: {}", fighter.weight_class_display());
    let age = fighter.age(Local::now().date_naive());
    if age > 0 {
        println!("  Age:          {}", age);
    }
    println!("  Height/Reach: {} / {}", format_optional(&fighter.height, "N/A"), format_optional(&fighter.reach, "N/A"));
    println!("  Stance:       {}", format_optional(&fighter.stance, "N/A"));
    println!("  Team:         {}", format_optional(&fighter.team, "Unknown"));
    println!(
        "  Wins:         {} KO / {} SUB / {} DEC",
        fighter.wins_by_ko, fighter.wins_by_submission, fighter.wins_by_decision
    );
    println!(
        "  Losses:       {} KO / {} SUB / {} DEC",
        fighter.losses_by_ko, fighter.losses_by_submission, fighter.losses_by_decision
    );
}

fn print_cards(cards: &[EventInfo], json: bool) -> Result<()> {
    if json {
        return print_json(cards);
    }
    if cards.is_empty() {
        println!("No events loaded");
        return Ok(());
    }
    for card in cards {
        println!("{}  {}  {}", card.date, card.name, card.display_location());
        for fight in &card.fights {
            let marker = match (fight.is_main_event, fight.is_title_fight) {
                (_, true) => "T",
                (true, false) => "*",
                _ => " ",
            };
            let winner = fight
                .winner
                .as_deref()
                .map(|w| format!("  -> {}", w))
                .unwrap_or_default();
            println!(
                "  {} {:>width$} vs {:<width$}{}",
                marker,
                truncate_string(&fight.red_corner, NAME_WIDTH),
                truncate_string(&fight.blue_corner, NAME_WIDTH),
                winner,
                width = NAME_WIDTH,
            );
        }
        println!();
    }
    Ok(())
}

async fn show_odds(sync: &SyncManager, name: &str, json: bool) -> Result<()> {
    if sync.odds_chart(name).is_none() {
        sync.prefetch_odds().await;
    }
    let Some(points) = sync.odds_chart(name) else {
        anyhow::bail!("No odds for {:?} (only fighters on upcoming cards have odds)", name);
    };
    if json {
        return print_json(&points);
    }
    print_odds(&points);
    Ok(())
}

fn print_odds(points: &[OddsChartPoint]) {
    if points.is_empty() {
        println!("No lines from tracked sportsbooks");
        return;
    }
    for point in points {
        let odds = if point.odds > 0.0 {
            format!("+{}", point.odds)
        } else {
            format!("{}", point.odds)
        };
        println!("  {:<20} {:<20} {:>8}", point.sportsbook, point.timestamp, odds);
    }
}

async fn show_status(sync: &SyncManager, client: &ApiClient) {
    let data = sync.dataset();
    println!("Server:    {}", client.base_url());
    println!(
        "Cache:     {}",
        sync.cache_age(Utc::now()).unwrap_or_else(|| "never".to_string())
    );
    println!("State:     {:?}", sync.loading_state());
    println!(
        "Loaded:    {} fighters, {} events, {} upcoming, {} past",
        data.fighters.len(),
        data.event_details.len(),
        data.upcoming_events.len(),
        data.past_events.len()
    );

    match client.fetch_data_version().await {
        Ok(version) => println!(
            "Versions:  fighters {} / events {} ({})",
            version.fighter_data_version, version.event_data_version, version.timestamp
        ),
        Err(e) => println!("Versions:  unavailable ({})", e),
    }
}

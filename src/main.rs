//! Price Tracker daemon
//!
//! Watches a small set of product pages, re-fetches prices on a schedule,
//! and reports price drops. Runs continuously with an optional web UI.

use clap::Parser;
use price_tracker::{
    init_schema, DropLog, PriceClient, PriceTracker, TrackerError, DEFAULT_MAX_ITEMS,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;

/// Product price tracker - watches product pages and notifies on price drops
#[derive(Parser, Debug)]
#[command(name = "price_tracker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Run a single refresh cycle and exit (default: run continuously)
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Refresh interval in hours when running continuously
    #[arg(long, default_value_t = 6)]
    interval_hours: u64,

    /// Enable web UI on specified port (default: disabled)
    #[arg(long)]
    web_port: Option<u16>,

    /// Base URL of a hosted price endpoint (default: $PRICE_API_URL, or
    /// fetch product pages directly when unset)
    #[arg(long)]
    api_url: Option<String>,

    /// API key sent as x-api-key to the hosted price endpoint
    /// (default: $PRICE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum number of tracked items
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    max_items: usize,

    /// Track a new product URL, print the result and exit
    #[arg(long, value_name = "URL")]
    add: Option<String>,

    /// Print tracked items and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

/// Returns the default database path: ~/.local/share/price_tracker/tracker.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("price_tracker")
        .join("tracker.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting price_tracker...");
    log::info!("Database path: {}", db_path.display());

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    // Wrap connection in Arc<Mutex> for thread-safe sharing
    let db = Arc::new(Mutex::new(conn));

    let client = build_client(&args);
    let tracker = PriceTracker::new(db, client, args.max_items);
    let drops = Arc::new(Mutex::new(DropLog::new()));

    // One-shot commands
    if let Some(url) = &args.add {
        match tracker.add_item(url).await {
            Ok(id) => println!("Tracking item {} ({})", id, url),
            Err(e @ TrackerError::Capacity(_)) => {
                println!("{}", e);
                std::process::exit(1);
            }
            Err(e) => {
                log::error!("Failed to add item: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }
    if args.list {
        print_items(&tracker);
        return;
    }

    // Spawn web server if --web-port specified
    if let Some(port) = args.web_port {
        let web_tracker = tracker.clone();
        let web_drops = Arc::clone(&drops);
        tokio::spawn(async move {
            if let Err(e) = price_tracker::web::serve(web_tracker, web_drops, port).await {
                log::error!("Web server error: {}", e);
            }
        });
    }

    if args.once {
        // Run once and exit
        run_cycle(&tracker, &drops, false).await;
    } else {
        log::info!(
            "Running in daemon mode, refreshing every {} hour(s)",
            args.interval_hours
        );
        run_daemon(&tracker, &drops, args.interval_hours).await;
    }
}

/// Pick the fetch mode: hosted price endpoint if configured, else direct
/// page fetching.
fn build_client(args: &Args) -> PriceClient {
    let api_url = args
        .api_url
        .clone()
        .or_else(|| std::env::var("PRICE_API_URL").ok())
        .filter(|url| !url.trim().is_empty());
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("PRICE_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());

    match api_url {
        Some(url) => {
            log::info!("Using hosted price endpoint: {}", url);
            PriceClient::with_api(url, api_key)
        }
        None => {
            log::info!("No price endpoint configured, fetching product pages directly");
            PriceClient::direct()
        }
    }
}

/// Run the refresh daemon until interrupted
async fn run_daemon(tracker: &PriceTracker, drops: &Arc<Mutex<DropLog>>, interval_hours: u64) {
    let mut ticker = interval(Duration::from_secs(interval_hours * 3600));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_cycle(tracker, drops, true).await;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down");
                break;
            }
        }
    }
}

/// Run a single refresh cycle.
///
/// Scheduled cycles are skipped while no item has drop notifications
/// enabled; a manual `--once` run always refreshes.
async fn run_cycle(tracker: &PriceTracker, drops: &Arc<Mutex<DropLog>>, gated: bool) {
    if gated {
        match tracker.notify_enabled() {
            Ok(true) => {}
            Ok(false) => {
                log::info!("No items with drop notifications enabled, skipping refresh");
                return;
            }
            Err(e) => {
                log::error!("Failed to check notification flags: {}", e);
                return;
            }
        }
    }

    match tracker.refresh_all().await {
        Ok(outcome) => {
            drops.lock().unwrap().record_all(outcome.drop_events);
        }
        Err(e) => {
            log::error!("Refresh cycle failed: {}", e);
        }
    }
}

/// Print the tracked items as a simple table
fn print_items(tracker: &PriceTracker) {
    match tracker.items() {
        Ok(items) => {
            if items.is_empty() {
                println!("No tracked items.");
                return;
            }
            println!("{:<5} {:<8} {:<12} TITLE / URL", "ID", "NOTIFY", "PRICE");
            for item in items {
                println!(
                    "{:<5} {:<8} {:<12} {}",
                    item.id,
                    if item.notify_on_drop { "on" } else { "off" },
                    item.price_text,
                    item.title
                );
                println!("{:<27} {}", "", item.url);
            }
        }
        Err(e) => {
            log::error!("Failed to list items: {}", e);
            std::process::exit(1);
        }
    }
}

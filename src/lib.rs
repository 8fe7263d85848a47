//! Price Tracker - product page price watcher
//!
//! Tracks a small set of e-commerce product pages in SQLite, re-fetches each
//! price on a schedule, and emits notification events when a price drops.

pub mod database;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod notify;
pub mod parser;
pub mod tracker;
pub mod web;

pub use database::{init_schema, PriceItem};
pub use error::{Result, TrackerError};
pub use fetch::{FetchOutcome, PriceClient, PriceSnapshot};
pub use notify::DropLog;
pub use tracker::{DropEvent, PriceTracker, RefreshOutcome, DEFAULT_MAX_ITEMS};

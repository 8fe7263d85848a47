//! Refresh reconciliation core
//!
//! Owns the add/refresh/toggle/delete operations over the item store and
//! turns observed price decreases into drop events.

use crate::database::{self, NewPriceItem, PriceItem};
use crate::error::{Result, TrackerError};
use crate::fetch::{FetchOutcome, PriceClient, UNAVAILABLE};
use crate::parser;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Default cap on tracked items
pub const DEFAULT_MAX_ITEMS: usize = 12;

/// A notification-worthy price decrease between two consecutive successful
/// fetches of the same item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropEvent {
    pub item_id: i64,
    pub title: String,
    pub previous_price: String,
    pub new_price: String,
}

/// Aggregate result of one refresh cycle
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub updated: usize,
    pub failed: usize,
    pub drop_events: Vec<DropEvent>,
}

/// Orchestrates fetch + parse + persist for the tracked item set.
///
/// Holds the process-wide store handle; construct once in `main` and clone
/// where needed. All item mutation goes through here.
#[derive(Clone)]
pub struct PriceTracker {
    db: Arc<Mutex<Connection>>,
    client: PriceClient,
    max_items: usize,
    items_tx: Arc<watch::Sender<Vec<PriceItem>>>,
}

impl PriceTracker {
    pub fn new(db: Arc<Mutex<Connection>>, client: PriceClient, max_items: usize) -> Self {
        let (items_tx, _) = watch::channel(Vec::new());
        let tracker = Self {
            db,
            client,
            max_items,
            items_tx: Arc::new(items_tx),
        };
        tracker.publish();
        tracker
    }

    /// Live stream of item-list snapshots, republished after every mutation
    pub fn subscribe(&self) -> watch::Receiver<Vec<PriceItem>> {
        self.items_tx.subscribe()
    }

    /// Current item list, most recently created first
    pub fn items(&self) -> Result<Vec<PriceItem>> {
        let conn = self.db.lock().unwrap();
        Ok(database::list_items(&conn)?)
    }

    /// Track a new product page and return the assigned id.
    ///
    /// Fails with [`TrackerError::Capacity`] when the store is full. A
    /// failed fetch never blocks creation: the item is stored with
    /// placeholder price fields and picked up by the next refresh.
    pub async fn add_item(&self, url: &str) -> Result<i64> {
        {
            let conn = self.db.lock().unwrap();
            if database::count_items(&conn)? as usize >= self.max_items {
                return Err(TrackerError::Capacity(self.max_items));
            }
        }

        let fallback_title = parser::fallback_title_from_url(url);
        let outcome = self.client.fetch_price(url, &fallback_title).await;
        let now = now_millis();

        let item = match outcome {
            FetchOutcome::Success(snapshot) => NewPriceItem {
                url: url.to_string(),
                title: snapshot.title,
                price_text: snapshot.price_text,
                price_value: snapshot.price_value,
                last_updated: now,
            },
            FetchOutcome::Failure(message) => {
                log::warn!("Initial fetch failed for {}: {}", url, message);
                NewPriceItem {
                    url: url.to_string(),
                    title: fallback_title,
                    price_text: UNAVAILABLE.to_string(),
                    price_value: None,
                    last_updated: now,
                }
            }
        };

        let id = {
            let conn = self.db.lock().unwrap();
            database::insert_item(&conn, &item)?
        };
        log::info!("Tracking item {} ({})", id, url);
        self.publish();
        Ok(id)
    }

    /// One complete pass over all tracked items.
    ///
    /// The item set is snapshotted up front; items added meanwhile are not
    /// part of this pass. A fetch failure leaves the stored row untouched
    /// (no timestamp bump) and never aborts the batch. Drop detection is a
    /// single comparison against the prior stored value, so an item emits
    /// at most one event per cycle.
    pub async fn refresh_all(&self) -> Result<RefreshOutcome> {
        let items = self.items()?;
        let mut outcome = RefreshOutcome::default();

        for item in items {
            let fallback_title = parser::fallback_title_from_url(&item.url);
            match self.client.fetch_price(&item.url, &fallback_title).await {
                FetchOutcome::Success(snapshot) => {
                    let updated = PriceItem {
                        title: snapshot.title,
                        price_text: snapshot.price_text,
                        price_value: snapshot.price_value,
                        last_updated: now_millis(),
                        ..item.clone()
                    };
                    {
                        let conn = self.db.lock().unwrap();
                        database::update_item(&conn, &updated)?;
                    }
                    outcome.updated += 1;

                    if item.notify_on_drop {
                        if let (Some(old), Some(new)) = (item.price_value, updated.price_value) {
                            if new < old {
                                outcome.drop_events.push(DropEvent {
                                    item_id: item.id,
                                    title: updated.title.clone(),
                                    previous_price: item.price_text.clone(),
                                    new_price: updated.price_text.clone(),
                                });
                            }
                        }
                    }
                }
                FetchOutcome::Failure(message) => {
                    log::warn!(
                        "Refresh failed for item {} ({}): {}",
                        item.id,
                        item.url,
                        message
                    );
                    outcome.failed += 1;
                }
            }
        }

        log::info!(
            "Refresh cycle done: {} updated, {} failed, {} price drop(s)",
            outcome.updated,
            outcome.failed,
            outcome.drop_events.len()
        );
        self.publish();
        Ok(outcome)
    }

    /// Flip the drop-notification flag; no other field changes
    pub fn update_notify(&self, id: i64, enabled: bool) -> Result<()> {
        {
            let conn = self.db.lock().unwrap();
            database::set_notify(&conn, id, enabled)?;
        }
        self.publish();
        Ok(())
    }

    /// Stop tracking an item. Deleting an already-gone item is a success.
    pub fn delete_item(&self, id: i64) -> Result<()> {
        {
            let conn = self.db.lock().unwrap();
            database::delete_item(&conn, id)?;
        }
        self.publish();
        Ok(())
    }

    /// True while at least one item has drop notifications enabled
    pub fn notify_enabled(&self) -> Result<bool> {
        let conn = self.db.lock().unwrap();
        Ok(database::any_notify_enabled(&conn)?)
    }

    fn publish(&self) {
        match self.items() {
            Ok(items) => {
                let _ = self.items_tx.send(items);
            }
            Err(e) => log::error!("Failed to publish item snapshot: {}", e),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;

//! Drop event sink
//!
//! Delivery is keyed by item id: a newer drop for the same item replaces the
//! older one, mirroring how a notification tray collapses repeat alerts.

use crate::tracker::DropEvent;

/// In-process sink for delivered drop events, newest first
#[derive(Debug, Default)]
pub struct DropLog {
    events: Vec<DropEvent>,
}

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one drop event, replacing any earlier event for the same item
    pub fn record(&mut self, event: DropEvent) {
        log::info!(
            "Price drop: {} ({} -> {})",
            event.title,
            event.previous_price,
            event.new_price
        );
        self.events.retain(|e| e.item_id != event.item_id);
        self.events.insert(0, event);
    }

    /// Deliver a batch of drop events in order
    pub fn record_all(&mut self, events: impl IntoIterator<Item = DropEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Delivered events, newest first, at most one per item
    pub fn recent(&self) -> &[DropEvent] {
        &self.events
    }
}

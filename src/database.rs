//! Item store operations
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Single-item writes are atomic; callers serialize access through a shared
//! `Mutex<Connection>`.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// A tracked product row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceItem {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub price_text: String,
    pub price_value: Option<f64>,
    /// Epoch milliseconds of the last fetch attempt that produced this row
    pub last_updated: i64,
    pub notify_on_drop: bool,
}

/// Field set for a not-yet-inserted item; `notify_on_drop` always starts off
#[derive(Debug, Clone)]
pub struct NewPriceItem {
    pub url: String,
    pub title: String,
    pub price_text: String,
    pub price_value: Option<f64>,
    pub last_updated: i64,
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS price_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            price_text TEXT NOT NULL,
            price_value REAL,
            last_updated INTEGER NOT NULL,
            notify_on_drop INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<PriceItem> {
    Ok(PriceItem {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        price_text: row.get(3)?,
        price_value: row.get(4)?,
        last_updated: row.get(5)?,
        notify_on_drop: row.get(6)?,
    })
}

/// All tracked items, most recently created first
pub fn list_items(conn: &Connection) -> DbResult<Vec<PriceItem>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, url, title, price_text, price_value, last_updated, notify_on_drop
         FROM price_items
         ORDER BY id DESC",
    )?;
    let items: DbResult<Vec<PriceItem>> = stmt.query_map([], |row| row_to_item(row))?.collect();
    items
}

/// Number of tracked items
pub fn count_items(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM price_items", [], |row| row.get(0))
}

/// Look up a single item by id
pub fn get_item(conn: &Connection, id: i64) -> DbResult<Option<PriceItem>> {
    conn.prepare_cached(
        "SELECT id, url, title, price_text, price_value, last_updated, notify_on_drop
         FROM price_items
         WHERE id = ?1",
    )?
    .query_row(params![id], |row| row_to_item(row))
    .optional()
}

/// Insert a new item and return its assigned id
pub fn insert_item(conn: &Connection, item: &NewPriceItem) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO price_items (url, title, price_text, price_value, last_updated, notify_on_drop)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![
            &item.url,
            &item.title,
            &item.price_text,
            item.price_value,
            item.last_updated,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace all fields of the row matching `item.id`
pub fn update_item(conn: &Connection, item: &PriceItem) -> DbResult<()> {
    conn.execute(
        "UPDATE price_items
         SET url = ?2, title = ?3, price_text = ?4, price_value = ?5,
             last_updated = ?6, notify_on_drop = ?7
         WHERE id = ?1",
        params![
            item.id,
            &item.url,
            &item.title,
            &item.price_text,
            item.price_value,
            item.last_updated,
            item.notify_on_drop,
        ],
    )?;
    Ok(())
}

/// Persist the drop-notification flag; touches no other field
pub fn set_notify(conn: &Connection, id: i64, enabled: bool) -> DbResult<()> {
    conn.execute(
        "UPDATE price_items SET notify_on_drop = ?2 WHERE id = ?1",
        params![id, enabled],
    )?;
    Ok(())
}

/// Delete an item by id. Deleting a missing row is a success.
pub fn delete_item(conn: &Connection, id: i64) -> DbResult<()> {
    conn.execute("DELETE FROM price_items WHERE id = ?1", params![id])?;
    Ok(())
}

/// True while at least one item has drop notifications enabled
pub fn any_notify_enabled(conn: &Connection) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM price_items WHERE notify_on_drop = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an in-memory database for testing
    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_item(url: &str) -> NewPriceItem {
        NewPriceItem {
            url: url.to_string(),
            title: "Sample".to_string(),
            price_text: "$10.00".to_string(),
            price_value: Some(10.0),
            last_updated: 1_700_000_000_000,
        }
    }

    #[test]
    fn init_schema_creates_table() {
        let conn = test_db();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='price_items'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn insert_assigns_increasing_ids_and_defaults_notify_off() {
        let conn = test_db();
        let first = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();
        let second = insert_item(&conn, &sample_item("https://amazon.com/dp/B")).unwrap();
        assert!(second > first);

        let item = get_item(&conn, first).unwrap().unwrap();
        assert_eq!(item.url, "https://amazon.com/dp/A");
        assert!(!item.notify_on_drop);
    }

    #[test]
    fn list_orders_newest_first() {
        let conn = test_db();
        insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();
        insert_item(&conn, &sample_item("https://amazon.com/dp/B")).unwrap();
        insert_item(&conn, &sample_item("https://amazon.com/dp/C")).unwrap();

        let items = list_items(&conn).unwrap();
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://amazon.com/dp/C",
                "https://amazon.com/dp/B",
                "https://amazon.com/dp/A"
            ]
        );
    }

    #[test]
    fn count_tracks_inserts_and_deletes() {
        let conn = test_db();
        assert_eq!(count_items(&conn).unwrap(), 0);
        let id = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();
        assert_eq!(count_items(&conn).unwrap(), 1);
        delete_item(&conn, id).unwrap();
        assert_eq!(count_items(&conn).unwrap(), 0);
    }

    #[test]
    fn update_replaces_all_fields() {
        let conn = test_db();
        let id = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();

        let mut item = get_item(&conn, id).unwrap().unwrap();
        item.title = "Renamed".to_string();
        item.price_text = "$8.00".to_string();
        item.price_value = Some(8.0);
        item.last_updated = 1_700_000_999_000;
        update_item(&conn, &item).unwrap();

        let stored = get_item(&conn, id).unwrap().unwrap();
        assert_eq!(stored, item);
    }

    #[test]
    fn update_stores_null_price_value() {
        let conn = test_db();
        let id = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();

        let mut item = get_item(&conn, id).unwrap().unwrap();
        item.price_value = None;
        update_item(&conn, &item).unwrap();

        assert_eq!(get_item(&conn, id).unwrap().unwrap().price_value, None);
    }

    #[test]
    fn set_notify_is_idempotent_and_targeted() {
        let conn = test_db();
        let id = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();
        let before = get_item(&conn, id).unwrap().unwrap();

        set_notify(&conn, id, true).unwrap();
        let once = get_item(&conn, id).unwrap().unwrap();
        set_notify(&conn, id, true).unwrap();
        let twice = get_item(&conn, id).unwrap().unwrap();

        assert!(once.notify_on_drop);
        assert_eq!(once, twice);
        // Only the flag changed
        assert_eq!(once.price_text, before.price_text);
        assert_eq!(once.last_updated, before.last_updated);
    }

    #[test]
    fn delete_missing_row_is_success() {
        let conn = test_db();
        delete_item(&conn, 4242).unwrap();
    }

    #[test]
    fn notify_gate_reflects_flags() {
        let conn = test_db();
        assert!(!any_notify_enabled(&conn).unwrap());

        let id = insert_item(&conn, &sample_item("https://amazon.com/dp/A")).unwrap();
        assert!(!any_notify_enabled(&conn).unwrap());

        set_notify(&conn, id, true).unwrap();
        assert!(any_notify_enabled(&conn).unwrap());

        set_notify(&conn, id, false).unwrap();
        assert!(!any_notify_enabled(&conn).unwrap());
    }
}

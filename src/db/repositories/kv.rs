use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::{connection::Database, helpers::decode_slot};

/// Slot names shared with the rest of the client.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const STEP_TODAY: &str = "stepToday";
    pub const STEP_TARGET: &str = "stepTarget";
    pub const LAST_LOGIN: &str = "lastLogin";
    pub const DAILY_FLAGS: &str = "dailyFlags";
}

pub(crate) fn get_raw(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read slot '{key}'"))
}

pub(crate) fn put_raw(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
    .with_context(|| format!("failed to write slot '{key}'"))?;
    Ok(())
}

pub(crate) fn read_slot<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    Ok(decode_slot(get_raw(conn, key)?, key))
}

pub(crate) fn write_slot<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let encoded =
        serde_json::to_string(value).with_context(|| format!("failed to encode slot '{key}'"))?;
    put_raw(conn, key, &encoded)
}

impl Database {
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| get_raw(conn, &key)).await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| put_raw(conn, &key, &value)).await
    }

    pub async fn remove_value(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .with_context(|| format!("failed to remove slot '{key}'"))?;
            Ok(())
        })
        .await
    }
}

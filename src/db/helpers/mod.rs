use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::de::DeserializeOwned;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("failed to parse {field} as YYYY-MM-DD"))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Decode a persisted JSON slot. A value that no longer parses is reported
/// and treated as absent so the next successful write replaces it.
pub fn decode_slot<T: DeserializeOwned>(raw: Option<String>, key: &str) -> Option<T> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Discarding malformed '{key}' slot: {err}");
            None
        }
    }
}

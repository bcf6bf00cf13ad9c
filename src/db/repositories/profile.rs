use anyhow::Result;
use chrono::NaiveDate;

use crate::db::{
    connection::Database,
    helpers::{format_date, parse_date},
};
use crate::models::{DailyFlags, DEFAULT_STEP_TARGET};

use super::kv::{keys, read_slot, write_slot};

impl Database {
    pub async fn token(&self) -> Result<Option<String>> {
        Ok(self
            .get_value(keys::TOKEN)
            .await?
            .filter(|token| !token.is_empty()))
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.set_value(keys::TOKEN, token).await
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.remove_value(keys::TOKEN).await
    }

    /// Cached profile target; unset, unparsable or zero falls back to the default.
    pub async fn step_target(&self) -> Result<u64> {
        let stored = self.get_value(keys::STEP_TARGET).await?;
        Ok(stored
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|target| *target > 0)
            .unwrap_or(DEFAULT_STEP_TARGET))
    }

    pub async fn set_step_target(&self, target: u64) -> Result<()> {
        self.set_value(keys::STEP_TARGET, &target.to_string()).await
    }

    pub async fn last_login(&self) -> Result<Option<NaiveDate>> {
        let stored = self.get_value(keys::LAST_LOGIN).await?;
        Ok(stored.and_then(|raw| parse_date(&raw, keys::LAST_LOGIN).ok()))
    }

    pub async fn set_last_login(&self, date: NaiveDate) -> Result<()> {
        self.set_value(keys::LAST_LOGIN, &format_date(date)).await
    }

    /// Today's flags; anything stored for another day reads as cleared.
    pub async fn daily_flags(&self, today: NaiveDate) -> Result<DailyFlags> {
        let stored = self
            .execute(|conn| read_slot::<DailyFlags>(conn, keys::DAILY_FLAGS))
            .await?;
        Ok(DailyFlags::for_day(stored, today))
    }

    pub async fn write_daily_flags(&self, flags: &DailyFlags) -> Result<()> {
        let flags = flags.clone();
        self.execute(move |conn| write_slot(conn, keys::DAILY_FLAGS, &flags))
            .await
    }

    /// Read-modify-write of today's flags in one store task. Returns the
    /// written flags together with whatever `update` produced.
    pub async fn update_daily_flags<F, R>(&self, today: NaiveDate, update: F) -> Result<(DailyFlags, R)>
    where
        F: FnOnce(&mut DailyFlags) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.execute(move |conn| {
            let stored = read_slot::<DailyFlags>(conn, keys::DAILY_FLAGS)?;
            let mut flags = DailyFlags::for_day(stored, today);
            let outcome = update(&mut flags);
            write_slot(conn, keys::DAILY_FLAGS, &flags)?;
            Ok((flags, outcome))
        })
        .await
    }
}

use anyhow::Result;
use chrono::NaiveDate;

use crate::db::connection::Database;
use crate::models::StepRecord;

use super::kv::{keys, read_slot, write_slot};

impl Database {
    /// Stored record, whatever its date. Malformed records read as absent.
    pub async fn read_step_record(&self) -> Result<Option<StepRecord>> {
        self.execute(|conn| read_slot(conn, keys::STEP_TODAY)).await
    }

    pub async fn write_step_record(&self, record: &StepRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| write_slot(conn, keys::STEP_TODAY, &record))
            .await
    }

    /// Stored record only if it belongs to `today`.
    pub async fn read_today_record(&self, today: NaiveDate) -> Result<Option<StepRecord>> {
        Ok(self
            .read_step_record()
            .await?
            .filter(|record| record.is_current(today)))
    }

    /// Add one confirmed step to today's record in a single store task.
    pub async fn increment_step_record(&self, today: NaiveDate) -> Result<StepRecord> {
        self.execute(move |conn| {
            let next = match read_slot::<StepRecord>(conn, keys::STEP_TODAY)? {
                Some(current) => current.incremented(today),
                None => StepRecord::for_count(today, 1),
            };
            write_slot(conn, keys::STEP_TODAY, &next)?;
            Ok(next)
        })
        .await
    }

    /// Replace today's count with an authoritative value (may go down).
    pub async fn overwrite_step_count(&self, today: NaiveDate, step_count: u64) -> Result<StepRecord> {
        let record = StepRecord::for_count(today, step_count);
        self.write_step_record(&record).await?;
        Ok(record)
    }
}

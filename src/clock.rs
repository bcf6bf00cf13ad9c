use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of local wall-clock time. Day boundaries and reminder slots are
/// evaluated against this, never against UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) use test_clock::ManualClock;

//! Local notifications: the delivery seam, message texts and the periodic
//! reminder check.

pub mod messages;
mod scheduler;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

pub use scheduler::{run_notification_check, NotificationReport, REMINDER_GRACE_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Fires a notification immediately. The platform scheduler lives behind
/// this trait.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Host notifier that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        info!("[notification] {}: {}", notification.title, notification.body);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingNotifier;

#[cfg(test)]
mod recording {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::{Notification, Notifier};

    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub(crate) fn titles(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.title.clone())
                .collect()
        }

        pub(crate) fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: &Notification) -> Result<()> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }
}

//! Transient notification channel (success / failure banners)
//!
//! Senders never block and never fail: if nothing is listening the notice is
//! simply logged and discarded.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// How long a banner should stay visible
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
    ttl: Duration,
}

pub struct NoticeFeed {
    rx: mpsc::UnboundedReceiver<Notice>,
}

/// Create a connected notifier/feed pair
pub fn channel(ttl: Duration) -> (Notifier, NoticeFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx, ttl }, NoticeFeed { rx })
}

impl Notifier {
    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Error => error!(notice = %message, "Notice"),
            _ => info!(notice = %message, "Notice"),
        }
        let notice = Notice {
            level,
            message,
            ttl: self.ttl,
        };
        if self.tx.send(notice).is_err() {
            debug!("Notice feed closed, notice dropped");
        }
    }
}

impl NoticeFeed {
    /// Next notice if one is already queued
    pub fn try_next(&mut self) -> Option<Notice> {
        self.rx.try_recv().ok()
    }

    /// All queued notices, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next notice; `None` once every notifier is gone
    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }
}

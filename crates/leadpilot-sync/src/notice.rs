//! Dismissible, auto-expiring user notices.
//!
//! # Design
//! - Every component reports outcomes here instead of returning UI strings.
//! - Expiry is evaluated on read against the tokio clock, so paused-time tests
//!   see the same behaviour as production.
//! - A broadcast feed lets front ends render notices as they arrive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

const FEED_CAPACITY: usize = 64;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Operation completed.
    Success,
    /// Neutral information.
    Info,
    /// Operation failed; local state was kept or reverted.
    Error,
}

/// A single user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Identifier used to dismiss the notice.
    pub id: Uuid,
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
    /// When the notice was raised.
    pub raised_at: Instant,
}

/// Shared notice list with TTL-based expiry.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Arc<Mutex<Vec<Notice>>>,
    feed: broadcast::Sender<Notice>,
}

impl NoticeBoard {
    /// Create a board whose notices expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            ttl,
            notices: Arc::new(Mutex::new(Vec::new())),
            feed,
        }
    }

    /// Raise a notice and return its id.
    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            raised_at: Instant::now(),
        };
        let id = notice.id;
        {
            let mut notices = self.lock();
            prune(&mut notices, self.ttl);
            notices.push(notice.clone());
        }
        let _ = self.feed.send(notice);
        id
    }

    /// Raise a success notice.
    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Success, message)
    }

    /// Raise an informational notice.
    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Info, message)
    }

    /// Raise an error notice.
    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Error, message)
    }

    /// Remove a notice before it expires. Returns whether it was present.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut notices = self.lock();
        let before = notices.len();
        notices.retain(|notice| notice.id != id);
        notices.len() != before
    }

    /// Notices that have not yet expired, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        let mut notices = self.lock();
        prune(&mut notices, self.ttl);
        notices.clone()
    }

    /// Most recent live notice, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Notice> {
        self.active().pop()
    }

    /// Subscribe to notices as they are raised.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.feed.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn prune(notices: &mut Vec<Notice>, ttl: Duration) {
    let now = Instant::now();
    notices.retain(|notice| now.duration_since(notice.raised_at) < ttl);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notices_expire_after_ttl() {
        let board = NoticeBoard::new(Duration::from_secs(4));
        board.error("first");
        tokio::time::advance(Duration::from_secs(2)).await;
        board.success("second");
        assert_eq!(board.active().len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        let active = board.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "second");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(board.active().is_empty());
    }

    #[tokio::test]
    async fn dismiss_removes_only_the_named_notice() {
        let board = NoticeBoard::new(Duration::from_secs(4));
        let keep = board.info("keep");
        let gone = board.info("gone");
        assert!(board.dismiss(gone));
        assert!(!board.dismiss(gone));
        let active = board.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep);
    }

    #[tokio::test]
    async fn subscribers_receive_raised_notices() -> Result<(), broadcast::error::RecvError> {
        let board = NoticeBoard::new(Duration::from_secs(4));
        let mut feed = board.subscribe();
        board.error("boom");
        let notice = feed.recv().await?;
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "boom");
        Ok(())
    }
}

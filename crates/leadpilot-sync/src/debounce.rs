//! Coalesces rapid filter edits into one settled value.
//!
//! # Design
//! - A single worker task owns the deadline; `on_edit` only enqueues.
//! - Each edit restarts the quiet window; when it elapses the latest value is
//!   published once through a `watch` channel.
//! - A settle equal to the current effective value is not published.
//! - No network call originates here.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Debounced filter with a subscribable effective value.
#[derive(Debug)]
pub struct FilterDebouncer<F> {
    edits: mpsc::UnboundedSender<F>,
    settled: watch::Receiver<F>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<F> FilterDebouncer<F>
where
    F: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a debouncer with `initial` as the effective value.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(initial: F, quiet: Duration) -> Self {
        let (edits, inbox) = mpsc::unbounded_channel();
        let (publish, settled) = watch::channel(initial);
        let worker = tokio::spawn(settle_loop(inbox, publish, quiet));
        Self {
            edits,
            settled,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Record an edit; restarts the quiet window.
    pub fn on_edit(&self, filter: F) {
        if self.edits.send(filter).is_err() {
            debug!("filter edit dropped after debouncer shutdown");
        }
    }

    /// Current effective value.
    #[must_use]
    pub fn effective(&self) -> F {
        self.settled.borrow().clone()
    }

    /// Receiver notified once per settle.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<F> {
        self.settled.clone()
    }

    /// Stop the worker; pending edits are discarded. Idempotent.
    pub fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.abort();
        }
    }
}

impl<F> Drop for FilterDebouncer<F> {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.abort();
        }
    }
}

async fn settle_loop<F>(
    mut inbox: mpsc::UnboundedReceiver<F>,
    publish: watch::Sender<F>,
    quiet: Duration,
) where
    F: PartialEq + Send + Sync + 'static,
{
    let mut pending: Option<F> = None;
    let mut deadline = Instant::now();
    loop {
        tokio::select! {
            edit = inbox.recv() => {
                let Some(filter) = edit else {
                    break;
                };
                pending = Some(filter);
                deadline = Instant::now() + quiet;
            }
            () = sleep_until(deadline), if pending.is_some() => {
                if let Some(filter) = pending.take() {
                    let changed = publish.send_if_modified(|current| {
                        if *current == filter {
                            false
                        } else {
                            *current = filter;
                            true
                        }
                    });
                    debug!(changed, "filter settled");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_settle_once_with_last_value() -> Result<(), watch::error::RecvError> {
        let debouncer = FilterDebouncer::new(String::new(), Duration::from_millis(280));
        let mut settled = debouncer.subscribe();

        debouncer.on_edit("d".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.on_edit("de".to_string());
        sleep(Duration::from_millis(100)).await;
        debouncer.on_edit("den".to_string());

        sleep(Duration::from_millis(279)).await;
        assert!(!settled.has_changed()?);

        sleep(Duration::from_millis(2)).await;
        assert!(settled.has_changed()?);
        assert_eq!(*settled.borrow_and_update(), "den");

        sleep(Duration::from_secs(2)).await;
        assert!(!settled.has_changed()?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn settling_on_the_current_value_is_silent() -> Result<(), watch::error::RecvError> {
        let debouncer = FilterDebouncer::new("austin".to_string(), Duration::from_millis(280));
        let settled = debouncer.subscribe();
        debouncer.on_edit("austi".to_string());
        debouncer.on_edit("austin".to_string());
        sleep(Duration::from_secs(1)).await;
        assert!(!settled.has_changed()?);
        assert_eq!(debouncer.effective(), "austin");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_pending_edit() {
        let debouncer = FilterDebouncer::new(0_u32, Duration::from_millis(280));
        debouncer.on_edit(7);
        tokio::task::yield_now().await;
        debouncer.shutdown();
        debouncer.shutdown();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(debouncer.effective(), 0);
    }
}

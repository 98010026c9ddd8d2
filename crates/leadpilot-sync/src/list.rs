//! Paginated list controller.
//!
//! # Design
//! - `load` is the single fetch primitive; paging, refresh, filter changes and
//!   post-delete reloads all route through it.
//! - Each load takes a fence token from the store; only the latest issued
//!   request may commit, whatever order responses arrive in.
//! - On failure the previous page stays on screen and an error notice is
//!   raised; `page_number` only moves when a page is committed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::api::{BulkDelete, PageSource};
use crate::context::SyncContext;
use crate::entity::Entity;
use crate::error::{ApiError, ApiResult};
use crate::poll::RefreshFn;
use crate::store::{self, ListStore};

/// Result of one `load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was committed.
    Applied,
    /// A newer request was issued before this one resolved; its result was dropped.
    Superseded,
    /// The fetch failed; the previous page was kept.
    Failed(ApiError),
}

impl LoadOutcome {
    /// Convert into a result, treating a superseded load as success.
    ///
    /// # Errors
    ///
    /// Returns the fetch error for [`LoadOutcome::Failed`].
    pub fn into_result(self) -> ApiResult<()> {
        match self {
            Self::Applied | Self::Superseded => Ok(()),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Drives fetches for one list view.
pub struct PaginatedListController<S: PageSource> {
    source: Arc<S>,
    store: ListStore<S::Item>,
    effective: Arc<Mutex<S::Filter>>,
    ctx: SyncContext,
}

impl<S: PageSource> Clone for PaginatedListController<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: self.store.clone(),
            effective: Arc::clone(&self.effective),
            ctx: self.ctx.clone(),
        }
    }
}

impl<S: PageSource> PaginatedListController<S> {
    /// Create a controller with an empty store sized from configuration.
    #[must_use]
    pub fn new(source: Arc<S>, initial: S::Filter, ctx: SyncContext) -> Self {
        let store = ListStore::new(ctx.config.sync.page_size);
        Self::with_store(source, store, initial, ctx)
    }

    /// Create a controller over an existing store.
    #[must_use]
    pub fn with_store(
        source: Arc<S>,
        store: ListStore<S::Item>,
        initial: S::Filter,
        ctx: SyncContext,
    ) -> Self {
        Self {
            source,
            store,
            effective: Arc::new(Mutex::new(initial)),
            ctx,
        }
    }

    /// Shared list state.
    #[must_use]
    pub const fn store(&self) -> &ListStore<S::Item> {
        &self.store
    }

    /// Current effective filter.
    #[must_use]
    pub fn filter(&self) -> S::Filter {
        self.effective
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch `page_number` for `filter` and commit it if still wanted.
    ///
    /// When the server reports a total that no longer reaches `page_number`,
    /// the last available page is loaded instead.
    #[instrument(name = "list.load", skip(self, filter), fields(kind = S::Item::KIND))]
    pub async fn load(&self, filter: S::Filter, page_number: u32) -> LoadOutcome {
        let mut page_number = page_number.max(1);
        loop {
            let (outcome, reload) = self.fetch_and_commit(&filter, page_number).await;
            match reload {
                Some(last) => {
                    info!(requested = page_number, last, "list shrank past the page; reloading");
                    page_number = last;
                }
                None => return outcome,
            }
        }
    }

    async fn fetch_and_commit(
        &self,
        filter: &S::Filter,
        page_number: u32,
    ) -> (LoadOutcome, Option<u32>) {
        let (token, page_size) = self
            .store
            .update(|state| (state.begin_request(), state.page_size));
        let offset = store::page_offset(page_number, page_size);
        let started = Instant::now();
        let result = self.source.fetch_page(filter, offset, page_size).await;
        self.ctx.metrics.observe_fetch_latency(started.elapsed());

        let committed = self.store.update(|state| {
            if !state.is_current(token) {
                return None;
            }
            match result {
                Ok(slice) => Some(Ok(store::apply_page(state, page_number, slice, Utc::now()))),
                Err(err) => Some(Err(err)),
            }
        });

        match committed {
            None => {
                debug!(token, "discarded superseded page response");
                self.ctx.metrics.inc_fetch("superseded");
                (LoadOutcome::Superseded, None)
            }
            Some(Ok(reload)) => {
                info!(page_number, "page committed");
                self.ctx.metrics.inc_fetch("applied");
                (LoadOutcome::Applied, reload)
            }
            Some(Err(err)) => {
                warn!(error = %err, page_number, "page fetch failed");
                self.ctx.metrics.inc_fetch("failed");
                self.ctx.notices.error(format!(
                    "Could not load {}: {}",
                    S::Item::KIND,
                    err.describe()
                ));
                (LoadOutcome::Failed(err), None)
            }
        }
    }

    /// Jump to page `n`, clamped into the available range.
    pub async fn go_to_page(&self, n: u32) -> LoadOutcome {
        let target = self
            .store
            .read(|state| store::clamp_page(n, state.total, state.page_size));
        self.load(self.filter(), target).await
    }

    /// Reload the current page with the current effective filter.
    pub async fn refresh(&self) -> LoadOutcome {
        let page = self.store.read(|state| state.page_number);
        self.load(self.filter(), page).await
    }

    /// Adopt a newly settled filter: reset to page one, clear selection, load.
    pub async fn apply_filter(&self, filter: S::Filter) -> LoadOutcome {
        *self.effective.lock().unwrap_or_else(PoisonError::into_inner) = filter.clone();
        self.store.update(|state| {
            state.page_number = 1;
            state.selected.clear();
        });
        self.load(filter, 1).await
    }

    /// Follow a debouncer: every settled value triggers [`Self::apply_filter`].
    ///
    /// The returned task ends when the debouncer is dropped.
    pub fn follow(&self, mut settled: watch::Receiver<S::Filter>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while settled.changed().await.is_ok() {
                let filter = settled.borrow_and_update().clone();
                let _ = controller.apply_filter(filter).await;
            }
        })
    }

    /// Toggle one row in the selection.
    pub fn toggle_selected(&self, id: <S::Item as Entity>::Id) {
        self.store.update(|state| store::toggle_selected(state, id));
    }

    /// Select the whole page, or clear when it is already fully selected.
    pub fn select_all_or_clear(&self) {
        self.store.update(store::select_all_or_clear);
    }

    /// Open the detail view for a row on the page.
    pub fn open_detail(&self, id: <S::Item as Entity>::Id) -> bool {
        self.store.update(|state| store::open_detail(state, id))
    }

    /// Close the detail view.
    pub fn close_detail(&self) {
        self.store.update(|state| state.detail = None);
    }

    /// Refresh callback suitable for a [`crate::PollingScheduler`].
    #[must_use]
    pub fn poll_refresh(&self) -> RefreshFn {
        let controller = self.clone();
        Arc::new(move || {
            let controller = controller.clone();
            async move { controller.refresh().await.into_result() }.boxed()
        })
    }
}

impl<S: BulkDelete> PaginatedListController<S> {
    /// Delete the selected rows.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; local state is untouched in that case.
    pub async fn delete_selected(&self) -> ApiResult<usize> {
        let ids: Vec<_> = self
            .store
            .read(|state| state.selected.iter().copied().collect());
        self.delete(&ids).await
    }

    /// Delete `ids` server-side, then drop them locally and reload.
    ///
    /// Nothing is removed locally until the server acknowledges the batch.
    /// Repeated ids are sent and counted once.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; local state is untouched in that case.
    #[instrument(name = "list.delete", skip(self, ids), fields(kind = S::Item::KIND, count = ids.len()))]
    pub async fn delete(&self, ids: &[<S::Item as Entity>::Id]) -> ApiResult<usize> {
        let mut seen = HashSet::new();
        let ids: Vec<_> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        match self.source.batch_delete(&ids).await {
            Ok(deleted) => {
                let reload_page = self
                    .store
                    .update(|state| store::remove_confirmed(state, &ids));
                info!(deleted, reload_page, "batch delete acknowledged");
                self.ctx
                    .notices
                    .success(format!("Deleted {} {}", ids.len(), S::Item::KIND));
                let _ = self.load(self.filter(), reload_page).await;
                Ok(ids.len())
            }
            Err(err) => {
                warn!(error = %err, "batch delete failed");
                self.ctx.notices.error(format!(
                    "Could not delete {}: {}",
                    S::Item::KIND,
                    err.describe()
                ));
                Err(err)
            }
        }
    }
}

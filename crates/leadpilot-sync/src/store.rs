//! Shared list state and the pure transitions applied to it.
//!
//! # Design
//! - `ListState` transitions are plain functions so invariants are unit-testable
//!   without a runtime.
//! - `ListStore` is the single container the list controller and the mutation
//!   engine serialize through; every update bumps a revision watchers can follow.
//! - Request fencing lives here so "is this response still wanted" is answered
//!   under the same lock that commits it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use leadpilot_api_models::PageSlice;
use tokio::sync::watch;

use crate::entity::Entity;

/// Number of pages needed for `total` rows; never less than one.
#[must_use]
pub fn page_count(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, page_count]`.
#[must_use]
pub fn clamp_page(requested: u32, total: u64, page_size: u32) -> u32 {
    requested.clamp(1, page_count(total, page_size))
}

/// Row offset of the first item on `page_number`.
#[must_use]
pub fn page_offset(page_number: u32, page_size: u32) -> u64 {
    u64::from(page_number.max(1) - 1) * u64::from(page_size)
}

/// Local view of one server-owned list.
#[derive(Debug, Clone)]
pub struct ListState<E: Entity> {
    /// Rows on the current page.
    pub items: Vec<E>,
    /// Server-side row count for the current filter.
    pub total: u64,
    /// One-based page number.
    pub page_number: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Ids selected on the current page.
    pub selected: HashSet<E::Id>,
    /// Record open in the detail view.
    pub detail: Option<E>,
    /// When the list last committed a server response.
    pub last_synced_at: Option<DateTime<Utc>>,
    latest_token: u64,
}

impl<E: Entity> ListState<E> {
    /// Empty state on page one.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page_number: 1,
            page_size: page_size.max(1),
            selected: HashSet::new(),
            detail: None,
            last_synced_at: None,
            latest_token: 0,
        }
    }

    /// Pages available for the current total.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        page_count(self.total, self.page_size)
    }

    /// Look up a row on the current page.
    #[must_use]
    pub fn find(&self, id: E::Id) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Issue a new request token; earlier tokens become stale.
    pub const fn begin_request(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    /// Whether `token` is still the most recently issued one.
    #[must_use]
    pub const fn is_current(&self, token: u64) -> bool {
        self.latest_token == token
    }
}

/// Commit a fetched page.
///
/// Replaces rows and total, records the sync time, clears the selection and
/// re-resolves the detail view by id (closing it when the row is gone).
///
/// The page number is clamped against the new total. When the fetched page
/// lies past the last page, returns the last page so the caller can reload it.
pub fn apply_page<E: Entity>(
    state: &mut ListState<E>,
    page_number: u32,
    slice: PageSlice<E>,
    synced_at: DateTime<Utc>,
) -> Option<u32> {
    let PageSlice { mut items, total } = slice;
    if total == 0 {
        items.clear();
    }
    items.truncate(state.page_size as usize);
    let requested = page_number.max(1);
    let last = page_count(total, state.page_size);
    state.items = items;
    state.total = total;
    state.page_number = requested.min(last);
    state.last_synced_at = Some(synced_at);
    state.selected.clear();
    if let Some(open) = state.detail.as_ref().map(Entity::id) {
        state.detail = state.find(open).cloned();
    }
    (requested > last).then_some(last)
}

/// Toggle one id in the selection. Ids not on the page are ignored.
pub fn toggle_selected<E: Entity>(state: &mut ListState<E>, id: E::Id) {
    if state.selected.remove(&id) {
        return;
    }
    if state.find(id).is_some() {
        state.selected.insert(id);
    }
}

/// Select every row on the page, or clear when all are already selected.
pub fn select_all_or_clear<E: Entity>(state: &mut ListState<E>) {
    let all_selected =
        !state.items.is_empty() && state.items.iter().all(|item| state.selected.contains(&item.id()));
    if all_selected {
        state.selected.clear();
    } else {
        state.selected = state.items.iter().map(Entity::id).collect();
    }
}

/// Open the detail view for a row on the page. Returns whether it was found.
pub fn open_detail<E: Entity>(state: &mut ListState<E>, id: E::Id) -> bool {
    state.detail = state.find(id).cloned();
    state.detail.is_some()
}

/// Apply `edit` to the row with `id` and to the open detail view.
///
/// Returns whether the row exists on the current page.
pub fn edit_entity<E: Entity>(state: &mut ListState<E>, id: E::Id, edit: impl Fn(&mut E)) -> bool {
    let mut found = false;
    if let Some(row) = state.items.iter_mut().find(|item| item.id() == id) {
        edit(row);
        found = true;
    }
    if let Some(detail) = state.detail.as_mut().filter(|detail| detail.id() == id) {
        edit(detail);
    }
    found
}

/// Drop rows whose deletion the server acknowledged.
///
/// Decrements the total by the number of confirmed ids, steps back one page
/// when the current page empties past page one, then clamps. Returns the page
/// the caller should reload.
pub fn remove_confirmed<E: Entity>(state: &mut ListState<E>, ids: &[E::Id]) -> u32 {
    let confirmed: HashSet<E::Id> = ids.iter().copied().collect();
    state.items.retain(|item| !confirmed.contains(&item.id()));
    state.selected.retain(|id| !confirmed.contains(id));
    if state
        .detail
        .as_ref()
        .is_some_and(|detail| confirmed.contains(&detail.id()))
    {
        state.detail = None;
    }
    state.total = state.total.saturating_sub(confirmed.len() as u64);
    if state.total == 0 {
        state.items.clear();
    }
    if state.items.is_empty() && state.page_number > 1 {
        state.page_number -= 1;
    }
    state.page_number = clamp_page(state.page_number, state.total, state.page_size);
    state.page_number
}

/// Shared handle over one [`ListState`].
#[derive(Debug, Clone)]
pub struct ListStore<E: Entity> {
    state: Arc<Mutex<ListState<E>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl<E: Entity> ListStore<E> {
    /// Create an empty store.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(ListState::new(page_size))),
            revision: Arc::new(revision),
        }
    }

    /// Read from the state under the lock.
    pub fn read<R>(&self, read: impl FnOnce(&ListState<E>) -> R) -> R {
        read(&self.lock())
    }

    /// Mutate the state under the lock and notify watchers.
    pub fn update<R>(&self, update: impl FnOnce(&mut ListState<E>) -> R) -> R {
        let result = update(&mut self.lock());
        self.revision.send_modify(|revision| *revision += 1);
        result
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ListState<E> {
        self.lock().clone()
    }

    /// Receiver that changes whenever the state is updated.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, ListState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Entity for Row {
        type Id = u32;
        const KIND: &'static str = "rows";

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn rows(ids: std::ops::RangeInclusive<u32>) -> Vec<Row> {
        ids.map(|id| Row { id, label: "row" }).collect()
    }

    fn loaded(page_size: u32, page: u32, ids: std::ops::RangeInclusive<u32>, total: u64) -> ListState<Row> {
        let mut state = ListState::new(page_size);
        apply_page(
            &mut state,
            page,
            PageSlice {
                items: rows(ids),
                total,
            },
            Utc::now(),
        );
        state
    }

    #[test]
    fn page_count_never_drops_below_one() {
        assert_eq!(page_count(0, 50), 1);
        assert_eq!(page_count(50, 50), 1);
        assert_eq!(page_count(51, 50), 2);
        assert_eq!(page_count(10, 0), 10);
    }

    #[test]
    fn clamp_page_respects_bounds() {
        for total in [0_u64, 1, 49, 50, 51, 199, 1_000] {
            for requested in [0_u32, 1, 2, 5, 21, u32::MAX] {
                let page = clamp_page(requested, total, 50);
                assert!(page >= 1);
                assert!(page <= page_count(total, 50));
            }
        }
    }

    #[test]
    fn apply_page_clears_selection_and_reresolves_detail() {
        let mut state = loaded(10, 1, 1..=3, 3);
        toggle_selected(&mut state, 2);
        assert!(open_detail(&mut state, 3));

        apply_page(
            &mut state,
            1,
            PageSlice {
                items: vec![Row { id: 3, label: "fresh" }, Row { id: 4, label: "row" }],
                total: 2,
            },
            Utc::now(),
        );
        assert!(state.selected.is_empty());
        assert_eq!(state.detail.as_ref().map(|row| row.label), Some("fresh"));

        apply_page(&mut state, 1, PageSlice { items: rows(5..=6), total: 2 }, Utc::now());
        assert!(state.detail.is_none());
    }

    #[test]
    fn page_past_the_end_is_clamped_and_reported() {
        let mut state = loaded(50, 1, 1..=50, 120);
        let reload = apply_page(&mut state, 3, PageSlice { items: Vec::new(), total: 10 }, Utc::now());
        assert_eq!(reload, Some(1));
        assert_eq!(state.page_number, 1);
        assert_eq!(state.total, 10);

        let reload = apply_page(&mut state, 1, PageSlice { items: rows(1..=10), total: 10 }, Utc::now());
        assert_eq!(reload, None);
    }

    #[test]
    fn zero_total_forces_empty_items() {
        let state = loaded(10, 1, 1..=3, 0);
        assert!(state.items.is_empty());
    }

    #[test]
    fn select_all_toggles_between_all_and_none() {
        let mut state = loaded(10, 1, 1..=3, 3);
        select_all_or_clear(&mut state);
        assert_eq!(state.selected.len(), 3);
        select_all_or_clear(&mut state);
        assert!(state.selected.is_empty());
        toggle_selected(&mut state, 1);
        select_all_or_clear(&mut state);
        assert_eq!(state.selected.len(), 3);
    }

    #[test]
    fn toggle_ignores_ids_off_page() {
        let mut state = loaded(10, 1, 1..=3, 3);
        toggle_selected(&mut state, 99);
        assert!(state.selected.is_empty());
    }

    #[test]
    fn removing_last_row_on_page_two_steps_back() {
        let mut state = loaded(50, 2, 51..=51, 51);
        let reload = remove_confirmed(&mut state, &[51]);
        assert_eq!(state.total, 50);
        assert_eq!(reload, 1);
        assert_eq!(state.page_number, 1);
    }

    #[test]
    fn removal_closes_detail_and_drops_selection() {
        let mut state = loaded(10, 1, 1..=3, 3);
        toggle_selected(&mut state, 1);
        toggle_selected(&mut state, 2);
        open_detail(&mut state, 2);
        remove_confirmed(&mut state, &[2]);
        assert_eq!(state.total, 2);
        assert!(state.detail.is_none());
        assert_eq!(state.selected.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn edit_entity_updates_row_and_detail() {
        let mut state = loaded(10, 1, 1..=2, 2);
        open_detail(&mut state, 2);
        assert!(edit_entity(&mut state, 2, |row| row.label = "edited"));
        assert_eq!(state.find(2).map(|row| row.label), Some("edited"));
        assert_eq!(state.detail.as_ref().map(|row| row.label), Some("edited"));
        assert!(!edit_entity(&mut state, 9, |row| row.label = "nope"));
    }

    #[test]
    fn only_latest_token_is_current() {
        let mut state: ListState<Row> = ListState::new(10);
        let first = state.begin_request();
        let second = state.begin_request();
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }

    #[test]
    fn store_updates_bump_revision() {
        let store: ListStore<Row> = ListStore::new(10);
        let watcher = store.subscribe();
        store.update(|state| state.total = 4);
        assert_eq!(*watcher.borrow(), 1);
        assert_eq!(store.read(|state| state.total), 4);
    }
}

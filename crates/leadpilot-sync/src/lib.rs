#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client-side synchronization for the LeadPilot dashboard.
//!
//! Layout: `store.rs` (shared list state and pure transitions), `debounce.rs`
//! (filter settling), `list.rs` (paginated fetch controller), `mutation.rs`
//! (optimistic field updates), `poll.rs` (background refresh), `targets.rs` +
//! `queue.rs` (scrape target normalization and submission), `preview.rs`
//! (guest preview with demo fallback), `dashboard.rs` (polled lead counters),
//! `notice.rs` (user notices).
//!
//! Remote calls are expressed as traits in `api.rs`; the HTTP implementation
//! lives in `leadpilot-client`.

pub mod api;
pub mod context;
pub mod dashboard;
pub mod debounce;
pub mod entity;
pub mod error;
pub mod list;
pub mod mutation;
pub mod notice;
pub mod poll;
pub mod preview;
pub mod queue;
pub mod store;
pub mod targets;

pub use api::{
    BatchSubmitter, BulkDelete, HealthProbe, JobLookup, LeadMutations, PageSource,
    PreviewSource, StatsSource,
};
pub use context::SyncContext;
pub use dashboard::{DashboardMonitor, DashboardState};
pub use debounce::FilterDebouncer;
pub use entity::Entity;
pub use error::{ApiError, ApiResult, QueueError};
pub use list::{LoadOutcome, PaginatedListController};
pub use mutation::{
    FieldMutation, LeadStatusField, MutationAttempt, MutationStatus, OptimisticMutationEngine,
};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use poll::{PollState, PollingScheduler, RefreshFn, Visibility, is_stale};
pub use preview::{GuestPreview, PreviewOutcome, demo_leads};
pub use queue::{SubmitReceipt, TargetQueue};
pub use store::{ListState, ListStore, page_count};
pub use targets::{BulkReport, MergeOutcome, RawTarget, TargetNormalizer, identity_key};

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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (record builders and contexts), mocks.rs (scriptable fake API).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{job, lead, leads, test_context, test_context_with};
pub use mocks::{FakeJobApi, FakeLeadApi, FetchCall, Gate};

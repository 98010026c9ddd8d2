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

//! HTTP implementation of the LeadPilot sync collaborators.
//!
//! Layout:
//! - `transport.rs`: shared `reqwest` client, headers, URL building
//! - `problem.rs`: mapping of transport failures and error bodies onto `ApiError`
//! - `leads.rs` / `jobs.rs`: trait implementations per resource

pub mod error;
pub mod jobs;
pub mod leads;
pub mod problem;
pub mod transport;

pub use error::ClientError;
pub use jobs::HttpJobApi;
pub use leads::HttpLeadApi;
pub use transport::{ApiClient, HEADER_API_KEY, HEADER_REQUEST_ID};

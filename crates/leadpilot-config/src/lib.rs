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

//! Typed client configuration for the LeadPilot sync layer.
//!
//! Layout: `model.rs` (typed sections), `defaults.rs` (baseline values),
//! `loader.rs` (JSON file + environment overlays), `validate.rs` (range checks).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, ENV_PREFIX, load, load_with};
pub use model::{ApiConfig, ClientConfig, SyncConfig, TargetConfig};

//! Command handlers.

pub(crate) mod dashboard;
pub(crate) mod jobs;
pub(crate) mod leads;
pub(crate) mod preview;
pub(crate) mod targets;
pub(crate) mod watch;

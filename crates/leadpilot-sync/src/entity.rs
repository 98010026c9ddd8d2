//! Identity contract for list rows.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use leadpilot_api_models::{JobId, JobSummary, Lead, LeadId};

/// A server-owned record with a stable identifier.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Identifier type.
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Plural noun used in notices (`leads`, `jobs`).
    const KIND: &'static str;

    /// Stable identifier of this record.
    fn id(&self) -> Self::Id;
}

impl Entity for Lead {
    type Id = LeadId;

    const KIND: &'static str = "leads";

    fn id(&self) -> LeadId {
        self.id
    }
}

impl Entity for JobSummary {
    type Id = JobId;

    const KIND: &'static str = "jobs";

    fn id(&self) -> JobId {
        self.id
    }
}

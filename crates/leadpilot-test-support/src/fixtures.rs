//! Record builders and ready-made contexts.

use chrono::{DateTime, TimeZone, Utc};
use leadpilot_api_models::{JobId, JobStatus, JobSummary, Lead, LeadId, LeadSource, LeadStatus};
use leadpilot_config::ClientConfig;
use leadpilot_sync::SyncContext;

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_557_600, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Lead with predictable fields derived from `id`.
#[must_use]
pub fn lead(id: LeadId, name: &str) -> Lead {
    let score = u8::try_from(id.rem_euclid(100)).unwrap_or(0);
    Lead {
        id,
        name: name.to_string(),
        phone: Some(format!("+1 555 {id:04}")),
        city: Some("Austin".to_string()),
        category: Some("Dentist".to_string()),
        rating: Some(4.5),
        reviews: Some(42),
        website: (id % 2 == 0).then(|| format!("https://lead{id}.example")),
        instagram: None,
        lead_score: score,
        reason: None,
        ai_outreach: None,
        source: LeadSource::GoogleMaps,
        status: LeadStatus::New,
        country: Some("US".to_string()),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// `count` leads with ids `1..=count`.
#[must_use]
pub fn leads(count: i64) -> Vec<Lead> {
    (1..=count).map(|id| lead(id, &format!("Lead {id}"))).collect()
}

/// Scrape job in `status`.
#[must_use]
pub fn job(id: JobId, status: JobStatus) -> JobSummary {
    JobSummary {
        id,
        job_type: "google_maps".to_string(),
        targets: r#"[{"city":"Austin","category":"Dentist","limit":50}]"#.to_string(),
        status,
        leads_found: 0,
        error_message: None,
        started_at: None,
        completed_at: None,
        created_at: epoch(),
    }
}

/// Context built from default configuration.
///
/// # Panics
///
/// Panics if the metrics registry cannot be created.
#[must_use]
pub fn test_context() -> SyncContext {
    test_context_with(ClientConfig::default())
}

/// Context built from `config`.
///
/// # Panics
///
/// Panics if the metrics registry cannot be created.
#[must_use]
pub fn test_context_with(config: ClientConfig) -> SyncContext {
    match SyncContext::new(config) {
        Ok(ctx) => ctx,
        Err(err) => panic!("metrics registry should build: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leads_are_numbered_from_one() {
        let rows = leads(3);
        assert_eq!(rows.iter().map(|lead| lead.id).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(rows[1].website.is_some());
        assert!(rows[0].website.is_none());
    }
}

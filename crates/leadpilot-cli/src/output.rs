//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use leadpilot_api_models::{JobSummary, Lead, LeadSource, LeadStats, LeadStatus, ScrapeTarget};
use leadpilot_sync::{BulkReport, DashboardState, ListState, PreviewOutcome, SubmitReceipt};
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json(value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn page_json<T: Serialize + leadpilot_sync::Entity>(state: &ListState<T>) -> serde_json::Value {
    json!({
        "items": state.items,
        "total": state.total,
        "page": state.page_number,
        "page_count": state.page_count(),
        "last_synced_at": state.last_synced_at,
    })
}

pub(crate) fn render_lead_page(state: &ListState<Lead>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&page_json(state))?,
        OutputFormat::Table => {
            println!(
                "{:>6} {:<15} {:>5} {:<16} {:<18} NAME",
                "ID", "STATUS", "SCORE", "CITY", "CATEGORY"
            );
            for lead in &state.items {
                println!(
                    "{:>6} {:<15} {:>5} {:<16} {:<18} {}",
                    lead.id,
                    lead.status,
                    lead.lead_score,
                    truncate(lead.city.as_deref().unwrap_or("-"), 16),
                    truncate(lead.category.as_deref().unwrap_or("-"), 18),
                    lead.name
                );
            }
            println!("{}", page_footer(state.page_number, state.page_count(), state.total, state.last_synced_at));
        }
    }
    Ok(())
}

pub(crate) fn render_job_page(state: &ListState<JobSummary>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&page_json(state))?,
        OutputFormat::Table => {
            println!("{:>6} {:<10} {:>6} {:<12} CREATED", "ID", "STATUS", "FOUND", "TYPE");
            for job in &state.items {
                println!(
                    "{:>6} {:<10} {:>6} {:<12} {}",
                    job.id,
                    job.status,
                    job.leads_found,
                    job.job_type,
                    job.created_at.format("%Y-%m-%d %H:%M")
                );
                if let Some(message) = &job.error_message {
                    println!("       error: {message}");
                }
            }
            println!("{}", page_footer(state.page_number, state.page_count(), state.total, state.last_synced_at));
        }
    }
    Ok(())
}

pub(crate) fn render_job(job: &JobSummary, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(job)?,
        OutputFormat::Table => {
            for line in job_lines(job) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn job_lines(job: &JobSummary) -> Vec<String> {
    let stamp = |at: Option<DateTime<Utc>>| {
        at.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
    };
    let mut lines = vec![
        format!("job #{} ({})", job.id, job.job_type),
        format!("status:    {}", job.status),
        format!("found:     {}", job.leads_found),
        format!("created:   {}", job.created_at.format("%Y-%m-%d %H:%M")),
        format!("started:   {}", stamp(job.started_at)),
        format!("completed: {}", stamp(job.completed_at)),
        format!("targets:   {}", job.targets),
    ];
    if let Some(message) = &job.error_message {
        lines.push(format!("error:     {message}"));
    }
    lines
}

pub(crate) fn render_stats(state: &DashboardState, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "stats": state.stats,
            "last_synced_at": state.last_synced_at,
        }))?,
        OutputFormat::Table => {
            let Some(stats) = &state.stats else {
                println!("no counters loaded yet");
                return Ok(());
            };
            for line in stats_lines(stats) {
                println!("{line}");
            }
            let synced = state
                .last_synced_at
                .map_or_else(|| "never".to_string(), |at| at.format("%H:%M:%S").to_string());
            println!("synced {synced}");
        }
    }
    Ok(())
}

fn stats_lines(stats: &LeadStats) -> Vec<String> {
    let mut lines = vec![
        format!("{:<16} {:>7}", "TOTAL", stats.total_leads),
        format!("{:<16} {:>7}", "HIGH PRIORITY", stats.high_priority_leads),
    ];
    for status in LeadStatus::ALL {
        lines.push(format!("{:<16} {:>7}", status, stats.status_count(status)));
    }
    for source in [LeadSource::GoogleMaps, LeadSource::Instagram] {
        lines.push(format!("{:<16} {:>7}", source.as_str(), stats.source_count(source)));
    }
    lines
}

pub(crate) fn render_queue(
    records: &[ScrapeTarget],
    report: &BulkReport,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "targets": records,
            "lines_considered": report.lines_considered,
            "accepted": report.accepted,
            "dropped": report.dropped,
            "added": report.added,
        }))?,
        OutputFormat::Table => {
            for target in records {
                println!("{}", describe_target(target));
            }
            println!(
                "{} line(s) read, {} accepted, {} dropped, {} new",
                report.lines_considered, report.accepted, report.dropped, report.added
            );
        }
    }
    Ok(())
}

pub(crate) fn render_receipt(receipt: &SubmitReceipt, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "job_id": receipt.job_id,
            "submitted": receipt.submitted,
            "message": receipt.message,
        })),
        OutputFormat::Table => {
            println!("job #{} queued with {} target(s)", receipt.job_id, receipt.submitted);
            Ok(())
        }
    }
}

pub(crate) fn render_preview(outcome: &PreviewOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "live": outcome.live,
            "data_source": outcome.data_source,
            "fallback_reason": outcome.fallback_reason,
            "usage": outcome.usage,
            "leads": outcome.leads,
        }))?,
        OutputFormat::Table => {
            println!("{:>5} {:<8} NAME", "SCORE", "WEBSITE");
            for lead in &outcome.leads {
                let site = if lead.website.is_some() { "yes" } else { "no" };
                println!("{:>5} {:<8} {}", lead.lead_score, site, lead.name);
            }
            if outcome.live {
                println!("source: {} (live)", outcome.data_source);
            } else {
                let reason = outcome.fallback_reason.as_deref().unwrap_or("unknown");
                println!("source: {} (sample data, not live: {reason})", outcome.data_source);
            }
        }
    }
    Ok(())
}

pub(crate) fn describe_target(target: &ScrapeTarget) -> String {
    match target {
        ScrapeTarget::GoogleMaps(maps) => {
            format!("maps  {} / {} (limit {})", maps.city, maps.category, maps.limit)
        }
        ScrapeTarget::Instagram(instagram) => {
            let mut line = format!("insta {} (limit {})", instagram.keyword, instagram.limit);
            if let (Some(min), Some(max)) = (instagram.followers_min, instagram.followers_max) {
                let _ = write!(line, " followers {min}-{max}");
            }
            if let Some(score) = instagram.score_threshold {
                let _ = write!(line, " score>={score}");
            }
            line
        }
    }
}

fn page_footer(page: u32, pages: u32, total: u64, synced: Option<DateTime<Utc>>) -> String {
    let synced = synced.map_or_else(|| "never".to_string(), |at| at.format("%H:%M:%S").to_string());
    format!("page {page}/{pages} ({total} total, synced {synced})")
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(max.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadpilot_api_models::{GoogleMapsTarget, InstagramTarget};

    #[test]
    fn truncate_marks_cut_values() {
        assert_eq!(truncate("Austin", 16), "Austin");
        assert_eq!(truncate("San Francisco Bay", 8), "San Fra~");
    }

    #[test]
    fn footer_reports_never_synced() {
        assert_eq!(page_footer(1, 1, 0, None), "page 1/1 (0 total, synced never)");
    }

    #[test]
    fn stats_list_every_status_and_source() {
        let mut stats = LeadStats {
            total_leads: 12,
            high_priority_leads: 4,
            ..LeadStats::default()
        };
        stats.leads_by_status.insert("contacted".into(), 5);
        let lines = stats_lines(&stats);
        assert_eq!(lines.len(), 2 + LeadStatus::ALL.len() + 2);
        assert_eq!(lines[0], format!("{:<16} {:>7}", "TOTAL", 12));
        assert!(lines.contains(&format!("{:<16} {:>7}", LeadStatus::Contacted, 5)));
        assert!(lines.contains(&format!("{:<16} {:>7}", "instagram", 0)));
    }

    #[test]
    fn job_detail_shows_error_only_when_present() {
        let mut job = JobSummary {
            id: 3,
            job_type: "instagram".into(),
            targets: "[]".into(),
            status: leadpilot_api_models::JobStatus::Running,
            leads_found: 7,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        let lines = job_lines(&job);
        assert_eq!(lines[0], "job #3 (instagram)");
        assert!(lines.contains(&"started:   -".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("error:")));

        job.error_message = Some("quota exceeded".into());
        assert_eq!(
            job_lines(&job).last().map(String::as_str),
            Some("error:     quota exceeded")
        );
    }

    #[test]
    fn targets_describe_their_bounds() {
        let maps = ScrapeTarget::GoogleMaps(GoogleMapsTarget {
            city: "London".into(),
            category: "Dentist".into(),
            limit: 50,
        });
        assert_eq!(describe_target(&maps), "maps  London / Dentist (limit 50)");
        let instagram = ScrapeTarget::Instagram(InstagramTarget {
            keyword: "coffee".into(),
            limit: 30,
            followers_min: Some(100),
            followers_max: Some(500),
            score_threshold: Some(60),
        });
        assert_eq!(
            describe_target(&instagram),
            "insta coffee (limit 30) followers 100-500 score>=60"
        );
    }
}

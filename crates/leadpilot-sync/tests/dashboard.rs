use std::sync::Arc;
use std::time::Duration;

use leadpilot_api_models::{LeadSource, LeadStatus};
use leadpilot_sync::{
    ApiError, DashboardMonitor, LoadOutcome, NoticeLevel, PollingScheduler, Visibility,
};
use leadpilot_test_support::{FakeLeadApi, leads, test_context};
use tokio::sync::watch;
use tokio::time::sleep;

fn monitor(api: &Arc<FakeLeadApi>) -> DashboardMonitor<FakeLeadApi> {
    DashboardMonitor::new(Arc::clone(api), test_context())
}

async fn wait_for_stats_calls(api: &FakeLeadApi, count: usize) {
    while api.stats_count() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn refresh_commits_counters_and_bumps_revision() {
    let mut records = leads(120);
    records[0].status = LeadStatus::Contacted;
    records[1].status = LeadStatus::Contacted;
    records[2].source = LeadSource::Instagram;
    let api = Arc::new(FakeLeadApi::new(records));
    let dashboard = monitor(&api);
    let revision = dashboard.subscribe();
    assert!(dashboard.is_stale(Duration::from_secs(30)));

    assert_eq!(dashboard.refresh().await, LoadOutcome::Applied);

    let state = dashboard.snapshot();
    let stats = state.stats.expect("counters committed");
    assert_eq!(stats.total_leads, 120);
    assert_eq!(stats.high_priority_leads, 20);
    assert_eq!(stats.status_count(LeadStatus::Contacted), 2);
    assert_eq!(stats.status_count(LeadStatus::New), 118);
    assert_eq!(stats.source_count(LeadSource::Instagram), 1);
    assert!(state.last_synced_at.is_some());
    assert!(!dashboard.is_stale(Duration::from_secs(30)));
    assert_eq!(*revision.borrow(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_counters() {
    let api = Arc::new(FakeLeadApi::new(leads(5)));
    let ctx = test_context();
    let dashboard = DashboardMonitor::new(Arc::clone(&api), ctx.clone());
    assert_eq!(dashboard.refresh().await, LoadOutcome::Applied);
    let before = dashboard.snapshot();

    api.set_leads(leads(9));
    api.fail_next_stats(ApiError::Server {
        status: 500,
        detail: Some("database unavailable".into()),
    });
    assert!(matches!(
        dashboard.refresh().await,
        LoadOutcome::Failed(ApiError::Server { status: 500, .. })
    ));

    assert_eq!(dashboard.snapshot(), before);
    let notice = ctx.notices.latest().expect("error notice raised");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(
        notice.message,
        "Could not load dashboard: database unavailable (HTTP 500)"
    );
    assert_eq!(ctx.metrics.fetch_count("failed"), 1);
}

#[tokio::test]
async fn older_response_is_superseded_by_newer_refresh() {
    let api = Arc::new(FakeLeadApi::new(leads(4)));
    let ctx = test_context();
    let dashboard = DashboardMonitor::new(Arc::clone(&api), ctx.clone());

    let gate = api.hold_next_stats();
    let slow = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.refresh().await }
    });
    wait_for_stats_calls(&api, 1).await;

    api.set_leads(leads(7));
    assert_eq!(dashboard.refresh().await, LoadOutcome::Applied);
    gate.release();

    assert_eq!(slow.await.expect("task joins"), LoadOutcome::Superseded);
    let stats = dashboard.snapshot().stats.expect("counters committed");
    assert_eq!(stats.total_leads, 7);
    assert_eq!(ctx.metrics.fetch_count("superseded"), 1);
}

#[tokio::test(start_paused = true)]
async fn scheduler_polls_dashboard_while_visible() {
    let api = Arc::new(FakeLeadApi::new(leads(2)));
    let ctx = test_context();
    let dashboard = DashboardMonitor::new(Arc::clone(&api), ctx.clone());
    let (visibility, rx) = watch::channel(Visibility::Visible);
    let scheduler = PollingScheduler::new(Duration::from_secs(5), rx, ctx.metrics.clone());
    scheduler.start(dashboard.poll_refresh());

    sleep(Duration::from_millis(5_001)).await;
    assert_eq!(api.stats_count(), 1);
    assert_eq!(
        dashboard.snapshot().stats.map(|stats| stats.total_leads),
        Some(2)
    );

    api.set_leads(leads(6));
    sleep(Duration::from_secs(5)).await;
    assert_eq!(
        dashboard.snapshot().stats.map(|stats| stats.total_leads),
        Some(6)
    );

    let _ = visibility.send(Visibility::Hidden);
    sleep(Duration::from_secs(20)).await;
    assert_eq!(api.stats_count(), 2);
    scheduler.stop();
}

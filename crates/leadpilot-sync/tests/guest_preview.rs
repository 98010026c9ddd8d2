use std::sync::Arc;
use std::time::Duration;

use leadpilot_api_models::GuestPreviewRequest;
use leadpilot_sync::{ApiError, GuestPreview, NoticeLevel};
use leadpilot_test_support::{FakeLeadApi, test_context};

fn request(limit: u32) -> GuestPreviewRequest {
    GuestPreviewRequest {
        city: "Austin".into(),
        category: "Dentist".into(),
        limit,
    }
}

#[tokio::test]
async fn healthy_backend_returns_live_rows() -> Result<(), ApiError> {
    let api = Arc::new(FakeLeadApi::new(Vec::new()));
    let preview = GuestPreview::new(Arc::clone(&api), test_context());

    let outcome = preview.run(request(3)).await?;

    assert!(outcome.live);
    assert_eq!(outcome.data_source, "apify_live");
    assert_eq!(outcome.leads.len(), 3);
    assert_eq!(outcome.usage.map(|usage| usage.leads_used), Some(3));
    assert_eq!(api.preview_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_probe_falls_back_without_calling_preview() -> Result<(), ApiError> {
    let api = Arc::new(FakeLeadApi::new(Vec::new()));
    api.set_probe_delay(Some(Duration::from_secs(30)));
    let ctx = test_context();
    let preview = GuestPreview::new(Arc::clone(&api), ctx.clone());

    let started = tokio::time::Instant::now();
    let outcome = preview.run(request(25)).await?;

    assert!(started.elapsed() <= ctx.config.api.probe_timeout());
    assert!(!outcome.live);
    assert_eq!(outcome.data_source, "local_demo");
    assert_eq!(outcome.leads.len(), 10);
    assert!(outcome.fallback_reason.is_some());
    assert_eq!(api.preview_count(), 0);
    assert_eq!(ctx.notices.latest().map(|notice| notice.level), Some(NoticeLevel::Info));
    Ok(())
}

#[tokio::test]
async fn unhealthy_backend_falls_back() -> Result<(), ApiError> {
    let api = Arc::new(FakeLeadApi::new(Vec::new()));
    api.set_healthy(false);
    let preview = GuestPreview::new(Arc::clone(&api), test_context());

    let outcome = preview.run(request(2)).await?;
    assert!(!outcome.live);
    assert_eq!(outcome.leads.len(), 2);
    assert_eq!(api.preview_count(), 0);
    Ok(())
}

#[tokio::test]
async fn transport_failure_during_preview_falls_back() -> Result<(), ApiError> {
    let api = Arc::new(FakeLeadApi::new(Vec::new()));
    api.fail_next_preview(ApiError::Transport {
        detail: "connection refused".into(),
    });
    let preview = GuestPreview::new(Arc::clone(&api), test_context());

    let outcome = preview.run(request(4)).await?;

    assert!(!outcome.live);
    assert_eq!(outcome.data_source, "local_demo");
    assert!(
        outcome
            .fallback_reason
            .is_some_and(|reason| reason.contains("connection refused"))
    );
    assert_eq!(api.preview_count(), 1);
    Ok(())
}

#[tokio::test]
async fn quota_rejection_surfaces_as_error() {
    let api = Arc::new(FakeLeadApi::new(Vec::new()));
    api.fail_next_preview(ApiError::Server {
        status: 429,
        detail: Some("Guest preview limit reached".into()),
    });
    let ctx = test_context();
    let preview = GuestPreview::new(Arc::clone(&api), ctx.clone());

    let result = preview.run(request(4)).await;

    assert!(matches!(result, Err(ApiError::Server { status: 429, .. })));
    let notice = ctx.notices.latest();
    assert_eq!(notice.as_ref().map(|notice| notice.level), Some(NoticeLevel::Error));
    assert!(notice.is_some_and(|notice| notice.message.contains("limit reached")));
}

use std::sync::Arc;

use leadpilot_api_models::{GoogleMapsTarget, ScrapeTarget, TargetKind};
use leadpilot_config::TargetConfig;
use leadpilot_sync::{ApiError, NoticeLevel, QueueError, RawTarget, TargetNormalizer, TargetQueue};
use leadpilot_test_support::{FakeLeadApi, test_context};

fn queue(kind: TargetKind) -> Result<(TargetQueue, leadpilot_sync::SyncContext), QueueError> {
    let ctx = test_context();
    let normalizer = Arc::new(TargetNormalizer::new(TargetConfig::default())?);
    Ok((TargetQueue::new(kind, normalizer, ctx.clone()), ctx))
}

#[test]
fn duplicate_add_updates_existing_entry() -> Result<(), QueueError> {
    let (mut queue, ctx) = queue(TargetKind::GoogleMaps)?;

    let first = queue.add(&RawTarget::maps("Austin", "Dentist").with_limit("10"))?;
    assert_eq!(first.added_count, 1);

    let second = queue.add(&RawTarget::maps(" austin ", "DENTIST").with_limit("20"))?;
    assert_eq!((second.added_count, second.replaced_count), (0, 1));
    assert_eq!(queue.len(), 1);
    assert_eq!(
        queue.records(),
        [ScrapeTarget::GoogleMaps(GoogleMapsTarget {
            city: "austin".into(),
            category: "DENTIST".into(),
            limit: 20,
        })]
    );
    let notice = ctx.notices.latest();
    assert!(notice.is_some_and(|notice| notice.message.contains("already queued")));
    Ok(())
}

#[test]
fn incomplete_target_is_rejected_with_notice() -> Result<(), QueueError> {
    let (mut queue, ctx) = queue(TargetKind::GoogleMaps)?;
    let outcome = queue.add(&RawTarget::maps("  ", "Dentist"))?;
    assert_eq!(outcome.rejected_count, 1);
    assert!(queue.is_empty());
    assert_eq!(ctx.notices.latest().map(|notice| notice.level), Some(NoticeLevel::Error));
    Ok(())
}

#[test]
fn other_source_is_refused() -> Result<(), QueueError> {
    let (mut queue, _ctx) = queue(TargetKind::GoogleMaps)?;
    let err = queue.add(&RawTarget::instagram("coffee"));
    assert!(matches!(
        err,
        Err(QueueError::KindMismatch {
            expected: TargetKind::GoogleMaps,
            found: TargetKind::Instagram,
        })
    ));
    assert!(queue.is_empty());
    Ok(())
}

#[test]
fn remove_and_clear() -> Result<(), QueueError> {
    let (mut queue, ctx) = queue(TargetKind::Instagram)?;
    queue.add(&RawTarget::instagram("coffee"))?;
    queue.add(&RawTarget::instagram("bakery"))?;
    assert!(queue.remove("instagram:COFFEE"));
    assert!(!queue.remove("instagram:coffee"));
    assert_eq!(queue.len(), 1);
    queue.clear();
    assert!(queue.is_empty());
    assert!(ctx.metrics.render().is_ok_and(|text| text.contains("leadpilot_queued_targets 0")));
    Ok(())
}

#[test]
fn bulk_paste_reports_dropped_lines() -> Result<(), QueueError> {
    let (mut queue, _ctx) = queue(TargetKind::GoogleMaps)?;
    queue.add(&RawTarget::maps("Austin", "Dentist"))?;

    let text = "Austin, Dentist, 30\n\nDenver|Plumber\nonlyonefield\n  ,Roofer\nBoise,Gym,abc\n";
    let report = queue.add_bulk(text);

    assert_eq!(report.lines_considered, 5);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.added, 2);
    assert_eq!(queue.len(), 3);
    let limits: Vec<u32> = queue.records().iter().map(ScrapeTarget::limit).collect();
    assert_eq!(limits, [30, 50, 50]);
    Ok(())
}

#[tokio::test]
async fn successful_submit_clears_queue() -> Result<(), QueueError> {
    let api = FakeLeadApi::new(Vec::new());
    let (mut queue, ctx) = queue(TargetKind::Instagram)?;
    queue.add(&RawTarget::instagram("coffee").with_followers("5000", "1000"))?;
    queue.add(&RawTarget::instagram("bakery").with_score_threshold("150"))?;

    let receipt = queue.submit(&api).await?;

    assert_eq!(receipt.job_id, 100);
    assert_eq!(receipt.submitted, 2);
    assert!(queue.is_empty());
    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, TargetKind::Instagram);
    assert_eq!(submissions[0].1.len(), 2);
    assert!(ctx.notices.latest().is_some_and(|notice| notice.message.contains("#100")));
    assert_eq!(ctx.metrics.submit_count("accepted"), 1);
    Ok(())
}

#[tokio::test]
async fn failed_submit_keeps_queue() -> Result<(), QueueError> {
    let api = FakeLeadApi::new(Vec::new());
    let (mut queue, ctx) = queue(TargetKind::GoogleMaps)?;
    queue.add(&RawTarget::maps("Austin", "Dentist"))?;
    let before = queue.records().to_vec();

    api.fail_next_submit(ApiError::Server {
        status: 503,
        detail: Some("scraper busy".into()),
    });
    let err = queue.submit(&api).await;

    assert!(matches!(err, Err(QueueError::Submit { .. })));
    assert_eq!(queue.records(), before.as_slice());
    assert_eq!(ctx.notices.latest().map(|notice| notice.level), Some(NoticeLevel::Error));
    assert_eq!(ctx.metrics.submit_count("failed"), 1);
    Ok(())
}

#[tokio::test]
async fn empty_and_oversized_batches_never_reach_backend() -> Result<(), QueueError> {
    let api = FakeLeadApi::new(Vec::new());
    let (mut queue, _ctx) = queue(TargetKind::GoogleMaps)?;

    assert!(matches!(queue.submit(&api).await, Err(QueueError::Empty)));

    let text: String = (0..51).map(|i| format!("City{i},Dentist\n")).collect();
    let report = queue.add_bulk(&text);
    assert_eq!(report.added, 51);
    assert!(matches!(
        queue.submit(&api).await,
        Err(QueueError::OverCap { len: 51, cap: 50, .. })
    ));
    assert_eq!(queue.len(), 51);
    assert_eq!(api.submit_count(), 0);
    Ok(())
}

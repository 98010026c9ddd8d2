//! Shared loop for `watch` commands: poll, re-render on commit, report staleness.

use std::time::Duration;

use chrono::Utc;
use leadpilot_sync::{ListState, PageSource, PaginatedListController, PollingScheduler, Visibility, is_stale};
use tokio::sync::{broadcast, watch};

use crate::client::{AppContext, CliResult, format_notice};

/// Poll `list` until interrupted or `updates` renders were printed.
pub(crate) async fn follow_list<S, R>(
    ctx: &AppContext,
    list: &PaginatedListController<S>,
    stale_after: Duration,
    updates: Option<u32>,
    render: R,
) -> CliResult<()>
where
    S: PageSource,
    R: Fn(&ListState<S::Item>) -> CliResult<()>,
{
    let mut revisions = list.store().subscribe();
    let mut notices = ctx.sync.notices.subscribe();
    list.refresh().await.into_result()?;

    let (_visibility, visible) = watch::channel(Visibility::Visible);
    let scheduler = PollingScheduler::new(
        ctx.sync.config.sync.poll_interval(),
        visible,
        ctx.sync.metrics.clone(),
    );
    scheduler.start(list.poll_refresh());

    let mut stale_check = tokio::time::interval(stale_after.max(Duration::from_secs(1)));
    let mut rendered_sync = None;
    let mut rendered = 0_u32;
    let mut warned_stale = false;
    loop {
        let state = list.store().snapshot();
        if state.last_synced_at != rendered_sync {
            render(&state)?;
            rendered_sync = state.last_synced_at;
            rendered += 1;
            warned_stale = false;
            if updates.is_some_and(|max| rendered >= max) {
                break;
            }
        }
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    eprintln!("{}", format_notice(notice.level, &notice.message));
                    ctx.sync.notices.dismiss(notice.id);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notice feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {}
            },
            _ = stale_check.tick() => {
                let stale = list
                    .store()
                    .read(|state| is_stale(state.last_synced_at, Utc::now(), stale_after));
                if stale && !warned_stale {
                    eprintln!("[info] data is stale; waiting for the next successful refresh");
                    warned_stale = true;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    scheduler.stop();
    Ok(())
}

//! `dashboard` subcommands.

use std::time::Duration;

use leadpilot_sync::{DashboardMonitor, PollingScheduler, StatsSource, Visibility};
use tokio::sync::{broadcast, watch};

use crate::cli::{DashboardWatchArgs, OutputFormat};
use crate::client::{AppContext, CliResult, format_notice};
use crate::output::render_stats;

pub(crate) async fn handle_show(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let dashboard = DashboardMonitor::new(ctx.leads(), ctx.sync.clone());
    dashboard.refresh().await.into_result()?;
    render_stats(&dashboard.snapshot(), output)
}

pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: DashboardWatchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let dashboard = DashboardMonitor::new(ctx.leads(), ctx.sync.clone());
    follow_dashboard(ctx, &dashboard, args.updates, output).await
}

async fn follow_dashboard<S: StatsSource + ?Sized>(
    ctx: &AppContext,
    dashboard: &DashboardMonitor<S>,
    updates: Option<u32>,
    output: OutputFormat,
) -> CliResult<()> {
    let mut revisions = dashboard.subscribe();
    let mut notices = ctx.sync.notices.subscribe();
    dashboard.refresh().await.into_result()?;

    let (_visibility, visible) = watch::channel(Visibility::Visible);
    let scheduler = PollingScheduler::new(
        ctx.sync.config.sync.poll_interval(),
        visible,
        ctx.sync.metrics.clone(),
    );
    scheduler.start(dashboard.poll_refresh());

    let stale_after = ctx.sync.config.sync.leads_stale_after();
    let mut stale_check = tokio::time::interval(stale_after.max(Duration::from_secs(1)));
    let mut rendered_sync = None;
    let mut rendered = 0_u32;
    let mut warned_stale = false;
    loop {
        let state = dashboard.snapshot();
        if state.last_synced_at != rendered_sync {
            render_stats(&state, output)?;
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
                if dashboard.is_stale(stale_after) && !warned_stale {
                    eprintln!("[info] counters are stale; waiting for the next successful refresh");
                    warned_stale = true;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    scheduler.stop();
    Ok(())
}

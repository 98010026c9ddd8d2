//! `jobs` subcommands.

use leadpilot_api_models::JobFilter;
use leadpilot_sync::{JobLookup, PaginatedListController};

use crate::cli::{JobListArgs, JobShowArgs, JobWatchArgs, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::commands::watch::follow_list;
use crate::output::{render_job, render_job_page};

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: JobListArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let filter = JobFilter {
        status: args.status,
    };
    let list = PaginatedListController::new(ctx.jobs(), filter, ctx.sync.clone());
    list.refresh().await.into_result()?;
    if args.page > 1 {
        list.go_to_page(args.page).await.into_result()?;
    }
    render_job_page(&list.store().snapshot(), output)
}

pub(crate) async fn handle_show(
    ctx: &AppContext,
    args: JobShowArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let job = ctx.jobs().job(args.id).await?;
    render_job(&job, output)
}

pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: JobWatchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let filter = JobFilter {
        status: args.status,
    };
    let list = PaginatedListController::new(ctx.jobs(), filter, ctx.sync.clone());
    follow_list(
        ctx,
        &list,
        ctx.sync.config.sync.jobs_stale_after(),
        args.updates,
        |state| render_job_page(state, output),
    )
    .await
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn show_fetches_single_job() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/jobs/8");
            then.status(200).json_body(json!({
                "id": 8,
                "job_type": "google_maps",
                "targets": "[]",
                "status": "failed",
                "leads_found": 0,
                "error_message": "quota exceeded",
                "created_at": "2024-05-01T10:00:00Z"
            }));
        });
        let ctx = AppContext::for_base_url(&server.base_url())?;

        handle_show(&ctx, JobShowArgs { id: 8 }, OutputFormat::Table).await?;

        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn show_missing_job_is_a_failure() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/jobs/404");
            then.status(404).json_body(json!({ "detail": "Job not found" }));
        });
        let ctx = AppContext::for_base_url(&server.base_url())?;

        let result = handle_show(&ctx, JobShowArgs { id: 404 }, OutputFormat::Json).await;

        assert!(result.is_err_and(|err| {
            err.exit_code() == 3 && err.display_message() == "Job not found (HTTP 404)"
        }));
        Ok(())
    }
}

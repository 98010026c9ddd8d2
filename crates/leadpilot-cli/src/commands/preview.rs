//! `preview` subcommand.

use leadpilot_api_models::GuestPreviewRequest;
use leadpilot_sync::GuestPreview;

use crate::cli::{OutputFormat, PreviewArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_preview;

pub(crate) async fn handle_preview(
    ctx: &AppContext,
    args: PreviewArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let city = args.city.trim();
    let category = args.category.trim();
    if city.is_empty() || category.is_empty() {
        return Err(CliError::validation("--city and --category must not be empty"));
    }
    let request = GuestPreviewRequest {
        city: city.to_string(),
        category: category.to_string(),
        limit: args.limit.max(1),
    };
    let outcome = GuestPreview::new(ctx.leads(), ctx.sync.clone())
        .run(request)
        .await?;
    render_preview(&outcome, output)
}

//! `targets` subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use leadpilot_api_models::TargetKind;
use leadpilot_sync::{TargetNormalizer, TargetQueue};
use tokio::io::AsyncReadExt;

use crate::cli::{ImportArgs, OutputFormat, TargetSource};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_queue, render_receipt};

const fn kind_of(source: TargetSource) -> TargetKind {
    match source {
        TargetSource::Maps => TargetKind::GoogleMaps,
        TargetSource::Instagram => TargetKind::Instagram,
    }
}

async fn read_input(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to read stdin: {err}")))?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path).await.map_err(|err| {
        CliError::validation(format!("failed to read '{}': {err}", path.display()))
    })
}

pub(crate) async fn handle_import(
    ctx: &AppContext,
    args: ImportArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let text = read_input(&args.file).await?;
    let normalizer = Arc::new(TargetNormalizer::new(ctx.sync.config.targets.clone())?);
    let mut queue = TargetQueue::new(kind_of(args.kind), normalizer, ctx.sync.clone());

    let report = queue.add_bulk(&text);
    render_queue(queue.records(), &report, output)?;

    if args.submit {
        let api = ctx.leads();
        let receipt = queue.submit(api.as_ref()).await?;
        render_receipt(&receipt, output)?;
    }
    Ok(())
}

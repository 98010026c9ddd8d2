//! `leads` subcommands.

use std::sync::Arc;

use leadpilot_api_models::{Lead, LeadFilter, LeadSource, LeadStatus};
use leadpilot_sync::{
    FilterDebouncer, LeadStatusField, MutationStatus, OptimisticMutationEngine,
    PaginatedListController,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{
    LeadFilterArgs, LeadListArgs, LeadWatchArgs, OutputFormat, RemoveArgs, SetStatusArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::watch::follow_list;
use crate::output::render_lead_page;

pub(crate) fn filter_from(args: &LeadFilterArgs) -> LeadFilter {
    LeadFilter {
        status: args.status,
        source: args.source,
        city: args.city.clone().unwrap_or_default(),
        category: args.category.clone().unwrap_or_default(),
        min_score: args.min_score,
        has_website: args.has_website,
    }
}

async fn open_page(
    ctx: &AppContext,
    filter: LeadFilter,
    page: u32,
) -> CliResult<PaginatedListController<leadpilot_client::HttpLeadApi>> {
    let list = PaginatedListController::new(ctx.leads(), filter, ctx.sync.clone());
    list.refresh().await.into_result()?;
    if page > 1 {
        list.go_to_page(page).await.into_result()?;
    }
    Ok(list)
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: LeadListArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let list = open_page(ctx, filter_from(&args.filter), args.page).await?;
    render_lead_page(&list.store().snapshot(), output)
}

pub(crate) async fn handle_set_status(ctx: &AppContext, args: SetStatusArgs) -> CliResult<()> {
    let api = ctx.leads();
    let list = open_page(ctx, filter_from(&args.filter), args.page).await?;
    let engine: OptimisticMutationEngine<Lead, LeadStatusField> =
        OptimisticMutationEngine::new(list.store().clone(), ctx.sync.clone());

    let attempt = engine
        .set_lead_status(api.as_ref(), args.id, args.status)
        .await
        .ok_or_else(|| {
            CliError::validation(format!(
                "lead {} is not on page {}; narrow the filter or pass --page",
                args.id, args.page
            ))
        })?;
    match attempt.status {
        MutationStatus::Committed => {
            println!(
                "lead {}: {} -> {}",
                attempt.entity_id, attempt.previous_value, attempt.next_value
            );
            Ok(())
        }
        _ => Err(CliError::failure(anyhow::anyhow!(
            "status change for lead {} was not applied",
            attempt.entity_id
        ))),
    }
}

pub(crate) async fn handle_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    let list = PaginatedListController::new(ctx.leads(), LeadFilter::default(), ctx.sync.clone());
    let deleted = list.delete(&args.ids).await?;
    println!("deleted {deleted} lead(s)");
    Ok(())
}

pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: LeadWatchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let initial = filter_from(&args.filter);
    let list = PaginatedListController::new(ctx.leads(), initial.clone(), ctx.sync.clone());

    let mut editor = None;
    if args.interactive {
        let debouncer = Arc::new(FilterDebouncer::new(
            initial.clone(),
            ctx.sync.config.sync.debounce(),
        ));
        let follower = list.follow(debouncer.subscribe());
        let reader = tokio::spawn(read_filter_edits(Arc::clone(&debouncer), initial));
        editor = Some((debouncer, follower, reader));
    }

    let result = follow_list(
        ctx,
        &list,
        ctx.sync.config.sync.leads_stale_after(),
        args.updates,
        |state| render_lead_page(state, output),
    )
    .await;

    if let Some((debouncer, follower, reader)) = editor {
        reader.abort();
        debouncer.shutdown();
        follower.abort();
    }
    result
}

async fn read_filter_edits(debouncer: Arc<FilterDebouncer<LeadFilter>>, mut filter: LeadFilter) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match apply_edit(&mut filter, &line) {
            Ok(()) => debouncer.on_edit(filter.clone()),
            Err(message) => eprintln!("[error] {message}"),
        }
    }
}

/// Apply one `field value` edit line to `filter`.
pub(crate) fn apply_edit(filter: &mut LeadFilter, line: &str) -> Result<(), String> {
    let line = line.trim();
    let (field, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let value = value.trim();
    match field {
        "" => Ok(()),
        "clear" => {
            *filter = LeadFilter::default();
            Ok(())
        }
        "city" => {
            filter.city = value.to_string();
            Ok(())
        }
        "category" => {
            filter.category = value.to_string();
            Ok(())
        }
        "status" if value.is_empty() => {
            filter.status = None;
            Ok(())
        }
        "status" => {
            filter.status = Some(value.parse::<LeadStatus>().map_err(|err| err.to_string())?);
            Ok(())
        }
        "source" if value.is_empty() => {
            filter.source = None;
            Ok(())
        }
        "source" => {
            filter.source = Some(value.parse::<LeadSource>().map_err(|err| err.to_string())?);
            Ok(())
        }
        "min-score" | "min_score" if value.is_empty() => {
            filter.min_score = None;
            Ok(())
        }
        "min-score" | "min_score" => {
            let score = value
                .parse::<u8>()
                .map_err(|_| format!("min score must be 0-100, got '{value}'"))?;
            filter.min_score = Some(score.min(100));
            Ok(())
        }
        "website" => {
            filter.has_website = matches!(value, "" | "yes" | "true" | "on");
            Ok(())
        }
        other => Err(format!("unknown filter field '{other}'")),
    }
}

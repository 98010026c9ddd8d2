//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use leadpilot_api_models::{JobId, JobStatus, LeadId, LeadSource, LeadStatus};
use leadpilot_telemetry::{LogFormat, LoggingConfig, init_logging};
use url::Url;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::{dashboard, jobs, leads, preview, targets};

/// Parse arguments, run the requested command, and report the outcome.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: LogFormat::from_name(&cli.log_format),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::build(&cli.global)?;
    let output = cli.global.output;
    let result = match cli.command {
        Command::Leads(command) => match command {
            LeadsCommand::Ls(args) => leads::handle_list(&ctx, args, output).await,
            LeadsCommand::SetStatus(args) => leads::handle_set_status(&ctx, args).await,
            LeadsCommand::Rm(args) => leads::handle_remove(&ctx, args).await,
            LeadsCommand::Watch(args) => leads::handle_watch(&ctx, args, output).await,
        },
        Command::Jobs(command) => match command {
            JobsCommand::Ls(args) => jobs::handle_list(&ctx, args, output).await,
            JobsCommand::Show(args) => jobs::handle_show(&ctx, args, output).await,
            JobsCommand::Watch(args) => jobs::handle_watch(&ctx, args, output).await,
        },
        Command::Dashboard(command) => match command {
            DashboardCommand::Show => dashboard::handle_show(&ctx, output).await,
            DashboardCommand::Watch(args) => dashboard::handle_watch(&ctx, args, output).await,
        },
        Command::Targets(command) => match command {
            TargetsCommand::Import(args) => targets::handle_import(&ctx, args, output).await,
        },
        Command::Preview(args) => preview::handle_preview(&ctx, args, output).await,
    };
    ctx.flush_notices();
    result
}

#[derive(Parser)]
#[command(name = "leadpilot", about = "Browse leads, queue scrape targets and watch jobs")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[arg(long, global = true, env = "LEADPILOT_LOG", default_value = "warn")]
    log_level: String,
    #[arg(long, global = true, env = "LEADPILOT_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command. Unset values fall back to configuration.
#[derive(Args, Default)]
pub(crate) struct GlobalArgs {
    #[arg(long, global = true, value_parser = parse_url)]
    pub(crate) api_url: Option<Url>,
    #[arg(long, global = true)]
    pub(crate) api_key: Option<String>,
    #[arg(long, global = true, help = "Request timeout in seconds")]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    Leads(LeadsCommand),
    #[command(subcommand)]
    Jobs(JobsCommand),
    #[command(subcommand)]
    Targets(TargetsCommand),
    #[command(subcommand)]
    Dashboard(DashboardCommand),
    Preview(PreviewArgs),
}

#[derive(Subcommand)]
enum LeadsCommand {
    Ls(LeadListArgs),
    SetStatus(SetStatusArgs),
    Rm(RemoveArgs),
    Watch(LeadWatchArgs),
}

#[derive(Subcommand)]
enum JobsCommand {
    Ls(JobListArgs),
    Show(JobShowArgs),
    Watch(JobWatchArgs),
}

#[derive(Subcommand)]
enum DashboardCommand {
    Show,
    Watch(DashboardWatchArgs),
}

#[derive(Subcommand)]
enum TargetsCommand {
    Import(ImportArgs),
}

#[derive(Args, Default, Clone)]
pub(crate) struct LeadFilterArgs {
    #[arg(long, value_parser = parse_lead_status)]
    pub(crate) status: Option<LeadStatus>,
    #[arg(long, value_parser = parse_lead_source)]
    pub(crate) source: Option<LeadSource>,
    #[arg(long)]
    pub(crate) city: Option<String>,
    #[arg(long)]
    pub(crate) category: Option<String>,
    #[arg(long)]
    pub(crate) min_score: Option<u8>,
    #[arg(long)]
    pub(crate) has_website: bool,
}

#[derive(Args, Default)]
pub(crate) struct LeadListArgs {
    #[command(flatten)]
    pub(crate) filter: LeadFilterArgs,
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
}

#[derive(Args)]
pub(crate) struct SetStatusArgs {
    #[arg(help = "Lead identifier")]
    pub(crate) id: LeadId,
    #[arg(id = "new_status", value_name = "STATUS", value_parser = parse_lead_status)]
    pub(crate) status: LeadStatus,
    #[command(flatten)]
    pub(crate) filter: LeadFilterArgs,
    #[arg(long, default_value_t = 1, help = "Page the lead is listed on")]
    pub(crate) page: u32,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    #[arg(required = true, num_args = 1.., help = "Lead identifiers")]
    pub(crate) ids: Vec<LeadId>,
}

#[derive(Args, Default)]
pub(crate) struct LeadWatchArgs {
    #[command(flatten)]
    pub(crate) filter: LeadFilterArgs,
    #[arg(long, help = "Exit after this many renders")]
    pub(crate) updates: Option<u32>,
    #[arg(long, help = "Read filter edits (`city Austin`, `status new`, `clear`) from stdin")]
    pub(crate) interactive: bool,
}

#[derive(Args, Default)]
pub(crate) struct JobListArgs {
    #[arg(long, value_parser = parse_job_status)]
    pub(crate) status: Option<JobStatus>,
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
}

#[derive(Args, Default)]
pub(crate) struct JobWatchArgs {
    #[arg(long, value_parser = parse_job_status)]
    pub(crate) status: Option<JobStatus>,
    #[arg(long, help = "Exit after this many renders")]
    pub(crate) updates: Option<u32>,
}

#[derive(Args)]
pub(crate) struct JobShowArgs {
    #[arg(help = "Job identifier")]
    pub(crate) id: JobId,
}

#[derive(Args, Default)]
pub(crate) struct DashboardWatchArgs {
    #[arg(long, help = "Exit after this many renders")]
    pub(crate) updates: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum TargetSource {
    Maps,
    Instagram,
}

#[derive(Args)]
pub(crate) struct ImportArgs {
    #[arg(long, value_enum, default_value_t = TargetSource::Maps)]
    pub(crate) kind: TargetSource,
    #[arg(long, short = 'f', help = "File with one target per line; `-` reads stdin")]
    pub(crate) file: PathBuf,
    #[arg(long, help = "Submit the queue as one batch job after importing")]
    pub(crate) submit: bool,
}

#[derive(Args)]
pub(crate) struct PreviewArgs {
    #[arg(long)]
    pub(crate) city: String,
    #[arg(long)]
    pub(crate) category: String,
    #[arg(long, default_value_t = 5)]
    pub(crate) limit: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_lead_status(input: &str) -> Result<LeadStatus, String> {
    input.parse().map_err(|err| format!("{err}"))
}

fn parse_lead_source(input: &str) -> Result<LeadSource, String> {
    input.parse().map_err(|err| format!("{err}"))
}

fn parse_job_status(input: &str) -> Result<JobStatus, String> {
    input.parse().map_err(|err| format!("{err}"))
}

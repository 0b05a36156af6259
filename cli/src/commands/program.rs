//! Program management commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand, ValueEnum};

use laurel_core::{Program, ProgramRequest, ProgramSearchFilter, ProgramStatus};

use crate::commands::{parse_date, parse_id, resolve_caller, resolve_country_ids};
use crate::state_file::CliEngine;

#[derive(Debug, Subcommand)]
pub enum ProgramCommands {
    /// Create a referral program
    Create(ProgramCreateArgs),
    /// List programs visible to the acting user
    List(ProgramListArgs),
    /// Apply a status transition
    SetStatus(ProgramSetStatusArgs),
    /// Designate the system default program (must be worldwide)
    SetDefault(ProgramSetDefaultArgs),
}

#[derive(Debug, Args)]
pub struct ProgramCreateArgs {
    /// Acting administrator's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Program name, unique
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Days a claim has to complete
    #[arg(long)]
    pub completion_window_days: Option<u32>,

    /// Per-link completion cap
    #[arg(long)]
    pub completion_limit_referee: Option<u32>,

    /// Global completion cap
    #[arg(long)]
    pub completion_limit: Option<u32>,

    /// Referrer payout per completion, in whole Zlto
    #[arg(long)]
    pub reward_referrer: Option<u64>,

    /// Referee payout per completion, in whole Zlto
    #[arg(long)]
    pub reward_referee: Option<u64>,

    /// Budget earmarked for the program, in whole Zlto
    #[arg(long)]
    pub reward_pool: Option<u64>,

    /// Require proof of personhood before completion
    #[arg(long)]
    pub proof_of_personhood: bool,

    /// Require the program pathway before completion
    #[arg(long)]
    pub pathway_required: bool,

    /// Allow one referrer to hold several active links
    #[arg(long)]
    pub multiple_links: bool,

    /// Create in `Inactive` instead of going live immediately
    #[arg(long)]
    pub draft: bool,

    /// Designate as the system default (must be worldwide)
    #[arg(long)]
    pub default: bool,

    /// Start timestamp (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub date_start: Option<String>,

    /// End timestamp (RFC 3339 or YYYY-MM-DD); open-ended when omitted
    #[arg(long)]
    pub date_end: Option<String>,

    /// Alpha-2 country codes the program is limited to; empty = worldwide
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ProgramListArgs {
    /// Acting username; omit for the anonymous view
    #[arg(long, value_name = "USERNAME")]
    pub actor: Option<String>,

    /// Filter by name fragment
    #[arg(long)]
    pub name_contains: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProgramSetStatusArgs {
    /// Acting administrator's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Program id
    #[arg(long)]
    pub id: String,

    /// Target status
    #[arg(long, value_enum)]
    pub status: ProgramStatusArg,
}

#[derive(Debug, Args)]
pub struct ProgramSetDefaultArgs {
    /// Acting administrator's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Program id
    #[arg(long)]
    pub id: String,
}

/// clap-facing mirror of [`ProgramStatus`].
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProgramStatusArg {
    Active,
    Inactive,
    Expired,
    LimitReached,
    UnCompletable,
    Deleted,
}

impl From<ProgramStatusArg> for ProgramStatus {
    fn from(value: ProgramStatusArg) -> Self {
        match value {
            ProgramStatusArg::Active => Self::Active,
            ProgramStatusArg::Inactive => Self::Inactive,
            ProgramStatusArg::Expired => Self::Expired,
            ProgramStatusArg::LimitReached => Self::LimitReached,
            ProgramStatusArg::UnCompletable => Self::UnCompletable,
            ProgramStatusArg::Deleted => Self::Deleted,
        }
    }
}

pub fn execute(cli: &CliEngine, command: ProgramCommands, admin: bool) -> Result<String> {
    match command {
        ProgramCommands::Create(args) => create(cli, args),
        ProgramCommands::List(args) => list(cli, args, admin),
        ProgramCommands::SetStatus(args) => {
            let caller = resolve_caller(cli, &args.actor, true)?;
            let id = parse_id(&args.id, "program")?;
            let program = cli
                .engine
                .programs
                .update_status(caller, id, args.status.into())
                .map_err(|e| anyhow!(e))?;
            Ok(format!(
                "Program '{}' status is now {}",
                program.name, program.status
            ))
        }
        ProgramCommands::SetDefault(args) => {
            let caller = resolve_caller(cli, &args.actor, true)?;
            let id = parse_id(&args.id, "program")?;
            let program = cli
                .engine
                .programs
                .set_as_default(caller, id)
                .map_err(|e| anyhow!(e))?;
            Ok(format!("Program '{}' is now the default", program.name))
        }
    }
}

fn create(cli: &CliEngine, args: ProgramCreateArgs) -> Result<String> {
    let caller = resolve_caller(cli, &args.actor, true)?;
    let countries = resolve_country_ids(cli, &args.countries)?;
    let date_start = match &args.date_start {
        Some(value) => parse_date(value)?,
        None => chrono::Utc::now(),
    };
    let date_end = args.date_end.as_deref().map(parse_date).transpose()?;

    let request = ProgramRequest {
        name: args.name,
        description: args.description,
        image_url: None,
        completion_window_days: args.completion_window_days,
        completion_limit_referee: args.completion_limit_referee,
        completion_limit: args.completion_limit,
        zlto_reward_referrer: args.reward_referrer,
        zlto_reward_referee: args.reward_referee,
        zlto_reward_pool: args.reward_pool,
        proof_of_personhood_required: args.proof_of_personhood,
        pathway_required: args.pathway_required,
        multiple_links_allowed: args.multiple_links,
        pre_activated: !args.draft,
        is_default: args.default,
        date_start,
        date_end,
        countries,
    };

    let program = cli
        .engine
        .programs
        .create(caller, request)
        .map_err(|e| anyhow!(e))?;

    Ok(format!(
        "Program created\nId: {}\nName: {}\nStatus: {}\nStarts: {}",
        program.id,
        program.name,
        program.status,
        program.date_start.date_naive()
    ))
}

fn list(cli: &CliEngine, args: ProgramListArgs, admin: bool) -> Result<String> {
    let caller = args
        .actor
        .as_deref()
        .map(|actor| resolve_caller(cli, actor, admin))
        .transpose()?;

    let filter = ProgramSearchFilter {
        statuses: None,
        countries: None,
        name_contains: args.name_contains,
    };
    let programs = cli
        .engine
        .programs
        .search(caller, &filter)
        .map_err(|e| anyhow!(e))?;

    if programs.is_empty() {
        return Ok("No programs found".to_string());
    }
    Ok(programs.iter().map(render_row).collect::<Vec<_>>().join("\n"))
}

fn render_row(program: &Program) -> String {
    let balance = program
        .completion_balance()
        .map_or_else(|| "unlimited".to_string(), |b| b.to_string());
    format!(
        "{}  {}  [{}]  completions {} (balance {}){}",
        program.id,
        program.name,
        program.status,
        program.completion_total,
        balance,
        if program.is_default { "  (default)" } else { "" }
    )
}

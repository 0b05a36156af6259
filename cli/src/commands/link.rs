//! Referral link commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use laurel_core::{Link, LinkRequest};

use crate::commands::{parse_id, resolve_caller};
use crate::state_file::CliEngine;

#[derive(Debug, Subcommand)]
pub enum LinkCommands {
    /// Create a referral link for the acting referrer
    Create(LinkCreateArgs),
    /// Cancel one of the acting user's links
    Cancel(LinkCancelArgs),
    /// List the acting user's links
    List(LinkListArgs),
}

#[derive(Debug, Args)]
pub struct LinkCreateArgs {
    /// Acting referrer's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Program id the link belongs to
    #[arg(long)]
    pub program_id: String,

    /// Link name, unique per user and program
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct LinkCancelArgs {
    /// Acting username (owner, or an administrator)
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Link id
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct LinkListArgs {
    /// Acting username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,
}

pub fn execute(cli: &CliEngine, command: LinkCommands, admin: bool) -> Result<String> {
    match command {
        LinkCommands::Create(args) => {
            let caller = resolve_caller(cli, &args.actor, false)?;
            let program_id = parse_id(&args.program_id, "program")?;
            let link = cli
                .engine
                .links
                .create(
                    caller,
                    LinkRequest {
                        program_id,
                        name: args.name,
                        description: args.description,
                    },
                )
                .map_err(|e| anyhow!(e))?;
            Ok(format!(
                "Referral link created\nId: {}\nName: {}\nURL: {}\nShort URL: {}",
                link.id, link.name, link.url, link.short_url
            ))
        }
        LinkCommands::Cancel(args) => {
            let caller = resolve_caller(cli, &args.actor, admin)?;
            let id = parse_id(&args.id, "link")?;
            let link = cli
                .engine
                .links
                .cancel(caller, id)
                .map_err(|e| anyhow!(e))?;
            Ok(format!("Referral link '{}' is now {}", link.name, link.status))
        }
        LinkCommands::List(args) => {
            let caller = resolve_caller(cli, &args.actor, false)?;
            let links = cli.engine.links.list_by_user(caller.user_id);
            if links.is_empty() {
                return Ok("No referral links".to_string());
            }
            Ok(links.iter().map(render_row).collect::<Vec<_>>().join("\n"))
        }
    }
}

fn render_row(link: &Link) -> String {
    format!(
        "{}  {}  [{}]  completions {}  {}",
        link.id, link.name, link.status, link.completion_total, link.short_url
    )
}

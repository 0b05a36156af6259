//! Block / unblock commands

use anyhow::{anyhow, Context, Result};
use clap::Args;

use laurel_core::collaborators::UserDirectory;
use laurel_core::BlockRequest;

use crate::commands::resolve_caller;
use crate::state_file::CliEngine;

#[derive(Debug, Args)]
pub struct BlockArgs {
    /// Acting administrator's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Username of the user to block
    #[arg(long)]
    pub user: String,

    /// Block reason name, as registered in the reason lookup
    #[arg(long, default_value = "Other")]
    pub reason: String,

    #[arg(long)]
    pub comment: Option<String>,

    /// Also cancel the user's active referral links
    #[arg(long)]
    pub cancel_links: bool,
}

#[derive(Debug, Args)]
pub struct UnblockArgs {
    /// Acting administrator's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Username of the user to unblock
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub comment: Option<String>,
}

pub fn execute_block(cli: &CliEngine, args: BlockArgs) -> Result<String> {
    let actor = resolve_caller(cli, &args.actor, true)?;
    let user = cli
        .directory
        .by_username(&args.user)
        .with_context(|| format!("unknown user '{}'", args.user))?;
    let reason = cli
        .block_reasons
        .records()
        .into_iter()
        .find(|r| r.name.eq_ignore_ascii_case(&args.reason))
        .with_context(|| format!("unknown block reason '{}'", args.reason))?;

    let block = cli
        .engine
        .blocks
        .block(
            actor,
            BlockRequest {
                user_id: user.id,
                reason_id: reason.id,
                comment: args.comment,
                cancel_links: args.cancel_links,
            },
        )
        .map_err(|e| anyhow!(e))?;

    Ok(format!(
        "User '{}' blocked\nBlock id: {}\nReason: {}",
        args.user, block.id, block.reason
    ))
}

pub fn execute_unblock(cli: &CliEngine, args: UnblockArgs) -> Result<String> {
    let actor = resolve_caller(cli, &args.actor, true)?;
    let user = cli
        .directory
        .by_username(&args.user)
        .with_context(|| format!("unknown user '{}'", args.user))?;

    let lifted = cli
        .engine
        .blocks
        .unblock(actor, user.id, args.comment)
        .map_err(|e| anyhow!(e))?;

    Ok(match lifted {
        Some(block) => format!("User '{}' unblocked (block {})", args.user, block.id),
        None => format!("User '{}' was not blocked; nothing to do", args.user),
    })
}

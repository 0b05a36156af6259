//! Claim, completion, and expiry commands
//!
//! Completion and expiry stand in for the external pathway/criteria and
//! completion-window sweeps that drive these transitions in production.

use anyhow::{anyhow, Result};
use clap::Args;

use crate::commands::{parse_id, resolve_caller};
use crate::state_file::CliEngine;

#[derive(Debug, Args)]
pub struct ClaimArgs {
    /// Acting referee's username
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Link id to claim
    #[arg(long)]
    pub link_id: String,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    /// Usage id whose criteria are satisfied
    #[arg(long)]
    pub usage_id: String,
}

#[derive(Debug, Args)]
pub struct ExpireArgs {
    /// Usage id whose completion window elapsed
    #[arg(long)]
    pub usage_id: String,
}

pub fn execute_claim(cli: &CliEngine, args: ClaimArgs) -> Result<String> {
    let caller = resolve_caller(cli, &args.actor, false)?;
    let link_id = parse_id(&args.link_id, "link")?;
    let usage = cli
        .engine
        .usages
        .claim_as_referee(caller, link_id)
        .map_err(|e| anyhow!(e))?;
    Ok(format!(
        "Link claimed\nUsage id: {}\nStatus: {}\nClaimed: {}",
        usage.id,
        usage.status,
        usage.date_claimed.date_naive()
    ))
}

pub fn execute_complete(cli: &CliEngine, args: CompleteArgs) -> Result<String> {
    let usage_id = parse_id(&args.usage_id, "usage")?;
    let usage = cli
        .engine
        .usages
        .process_completion(usage_id)
        .map_err(|e| anyhow!(e))?;
    Ok(format!(
        "Usage completed\nReferrer reward: {} Zlto\nReferee reward: {} Zlto",
        usage.zlto_reward_referrer.unwrap_or(0),
        usage.zlto_reward_referee.unwrap_or(0)
    ))
}

pub fn execute_expire(cli: &CliEngine, args: ExpireArgs) -> Result<String> {
    let usage_id = parse_id(&args.usage_id, "usage")?;
    let usage = cli
        .engine
        .usages
        .process_expiration(usage_id)
        .map_err(|e| anyhow!(e))?;
    Ok(format!("Usage {} expired", usage.id))
}

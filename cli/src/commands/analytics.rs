//! Analytics and leaderboard commands

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};

use laurel_core::{ParticipationRole, UserAnalytics};

use crate::commands::resolve_caller;
use crate::state_file::CliEngine;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    Referrer,
    Referee,
}

impl From<RoleArg> for ParticipationRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Referrer => Self::Referrer,
            RoleArg::Referee => Self::Referee,
        }
    }
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    /// Username to report on
    #[arg(long, value_name = "USERNAME")]
    pub actor: String,

    /// Which side of the referral to aggregate
    #[arg(long, value_enum, default_value_t = RoleArg::Referrer)]
    pub role: RoleArg,
}

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Which side of the referral to rank
    #[arg(long, value_enum, default_value_t = RoleArg::Referrer)]
    pub role: RoleArg,

    /// Number of rows
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

pub fn execute_analytics(cli: &CliEngine, args: AnalyticsArgs) -> Result<String> {
    let caller = resolve_caller(cli, &args.actor, false)?;
    let report = cli
        .engine
        .analytics
        .by_user(caller.user_id, args.role.into())
        .map_err(|e| anyhow!(e))?;
    Ok(render(&report))
}

pub fn execute_leaderboard(cli: &CliEngine, args: LeaderboardArgs) -> Result<String> {
    let rows = cli.engine.analytics.leaderboard(args.role.into(), args.limit);
    if rows.is_empty() {
        return Ok("No activity yet".to_string());
    }
    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "{:>2}. {}  completed {}  pending {}  {} Zlto",
                i.saturating_add(1),
                row.user_display_name,
                row.usage_count_completed,
                row.usage_count_pending,
                row.zlto_reward_total
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render(report: &UserAnalytics) -> String {
    format!(
        "Analytics for {}\nLinks: {} ({} active)\nCompleted: {}\nPending: {}\nExpired: {}\nZlto earned: {}",
        report.user_display_name,
        report.link_count,
        report.link_count_active,
        report.usage_count_completed,
        report.usage_count_pending,
        report.usage_count_expired,
        report.zlto_reward_total
    )
}

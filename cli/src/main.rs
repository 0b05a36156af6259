//! Laurel CLI - operator interface for the referral-rewards engine
//!
//! Runs the engine in-process over a JSON state snapshot: load, execute one
//! command, save. Stands in for the API layer in front of the engine.

#![forbid(unsafe_code)]

mod commands;
mod config;
mod state_file;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{analytics, block, claim, directory, link, program};
use config::CliConfig;
use state_file::CliEngine;

#[derive(Parser, Debug)]
#[command(
    name = "laurel",
    version,
    about = "Operator CLI for the Laurel referral-rewards engine"
)]
struct Cli {
    /// Path of the JSON state snapshot
    #[arg(long)]
    state: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    /// Act with administrator privileges where the command supports it
    #[arg(long, global = true)]
    admin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage users known to the directory
    User {
        #[command(subcommand)]
        command: directory::UserCommands,
    },

    /// Manage countries known to the lookup
    Country {
        #[command(subcommand)]
        command: directory::CountryCommands,
    },

    /// Manage referral programs
    Program {
        #[command(subcommand)]
        command: program::ProgramCommands,
    },

    /// Manage referral links
    Link {
        #[command(subcommand)]
        command: link::LinkCommands,
    },

    /// Claim a referral link as referee
    Claim(claim::ClaimArgs),

    /// Complete a pending usage (external criteria satisfied)
    Complete(claim::CompleteArgs),

    /// Expire a pending usage (completion-window sweep)
    Expire(claim::ExpireArgs),

    /// Block a user from referral participation
    Block(block::BlockArgs),

    /// Lift a user's block
    Unblock(block::UnblockArgs),

    /// Per-user analytics
    Analytics(analytics::AnalyticsArgs),

    /// Completion leaderboard
    Leaderboard(analytics::LeaderboardArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let Cli {
        state,
        output,
        admin,
        command,
    } = Cli::parse();
    let config = CliConfig::new();

    let state_path = state.unwrap_or_else(|| config.state_path.clone());
    let default_output_format = parse_output_format(&config.default_output_format)?;
    let output_format = output.unwrap_or(default_output_format);

    let loaded = state_file::load(Path::new(&state_path))?;
    let engine = state_file::build_engine(loaded, &config)?;

    let result = execute_command(command, admin, &engine);

    // Persist whatever the command changed before reporting.
    if result.is_ok() {
        state_file::save(Path::new(&state_path), &engine.snapshot())?;
    }

    match result {
        Ok(output) => match output_format {
            OutputFormat::Human => println!("{output}"),
            OutputFormat::Json => {
                let json_output = serde_json::json!({
                    "success": true,
                    "data": output
                });
                println!("{}", serde_json::to_string_pretty(&json_output)?);
            }
        },
        Err(e) => {
            match output_format {
                OutputFormat::Human => eprintln!("Error: {e}"),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "success": false,
                        "error": e.to_string()
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Parse output format from string
fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
    match format_str.to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(anyhow::anyhow!("Invalid output format: {}", format_str)),
    }
}

fn execute_command(command: Commands, admin: bool, engine: &CliEngine) -> Result<String> {
    match command {
        Commands::User { command } => directory::execute_user(engine, command),
        Commands::Country { command } => directory::execute_country(engine, command),
        Commands::Program { command } => program::execute(engine, command, admin),
        Commands::Link { command } => link::execute(engine, command, admin),
        Commands::Claim(args) => claim::execute_claim(engine, args),
        Commands::Complete(args) => claim::execute_complete(engine, args),
        Commands::Expire(args) => claim::execute_expire(engine, args),
        Commands::Block(args) => block::execute_block(engine, args),
        Commands::Unblock(args) => block::execute_unblock(engine, args),
        Commands::Analytics(args) => analytics::execute_analytics(engine, args),
        Commands::Leaderboard(args) => analytics::execute_leaderboard(engine, args),
    }
}

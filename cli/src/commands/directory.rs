//! Seed management: users and countries known to the in-process engine

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use laurel_core::collaborators::{CountryRecord, UserProfile};

use crate::commands::resolve_country_ids;
use crate::state_file::CliEngine;

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    /// Register a user in the directory
    Add(UserAddArgs),
    /// List known users
    List,
}

#[derive(Debug, Args)]
pub struct UserAddArgs {
    /// Username, unique in the directory
    #[arg(long)]
    pub username: String,

    /// Display name shown in reports
    #[arg(long)]
    pub display_name: Option<String>,

    /// Alpha-2 code of the user's country
    #[arg(long)]
    pub country: Option<String>,

    /// Register the user as not yet onboarded
    #[arg(long)]
    pub pending_onboarding: bool,
}

#[derive(Debug, Subcommand)]
pub enum CountryCommands {
    /// Register a country
    Add(CountryAddArgs),
    /// List known countries
    List,
}

#[derive(Debug, Args)]
pub struct CountryAddArgs {
    /// Alpha-2 code, e.g. ZA
    #[arg(long)]
    pub code: String,

    /// Display name, e.g. "South Africa"
    #[arg(long)]
    pub name: String,
}

pub fn execute_user(cli: &CliEngine, command: UserCommands) -> Result<String> {
    match command {
        UserCommands::Add(args) => {
            let country_id = match &args.country {
                Some(code) => Some(resolve_country_ids(cli, std::slice::from_ref(code))?[0]),
                None => None,
            };
            let profile = UserProfile {
                id: Uuid::new_v4(),
                username: args.username.clone(),
                display_name: args.display_name,
                country_id,
                onboarded: !args.pending_onboarding,
            };
            let id = profile.id;
            cli.directory.upsert(profile);
            Ok(format!("User '{}' registered\nId: {id}", args.username))
        }
        UserCommands::List => {
            let mut profiles = cli.directory.profiles();
            profiles.sort_by(|a, b| a.username.cmp(&b.username));
            if profiles.is_empty() {
                return Ok("No users registered".to_string());
            }
            let lines: Vec<String> = profiles
                .iter()
                .map(|p| {
                    format!(
                        "{}  {}  onboarded={}",
                        p.id,
                        p.username,
                        p.onboarded
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

pub fn execute_country(cli: &CliEngine, command: CountryCommands) -> Result<String> {
    match command {
        CountryCommands::Add(args) => {
            let record = CountryRecord {
                id: Uuid::new_v4(),
                code_alpha2: args.code.to_uppercase(),
                name: args.name,
            };
            let id = record.id;
            let code = record.code_alpha2.clone();
            cli.countries.insert(record);
            Ok(format!("Country '{code}' registered\nId: {id}"))
        }
        CountryCommands::List => {
            let mut records = cli.countries.records();
            records.sort_by(|a, b| a.code_alpha2.cmp(&b.code_alpha2));
            let lines: Vec<String> = records
                .iter()
                .map(|c| format!("{}  {}  {}", c.id, c.code_alpha2, c.name))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

//! CLI command implementations

pub mod analytics;
pub mod block;
pub mod claim;
pub mod directory;
pub mod link;
pub mod program;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use laurel_core::collaborators::{CountryLookup, UserDirectory};
use laurel_core::Caller;

use crate::state_file::CliEngine;

/// Resolves the acting user by username.
pub fn resolve_caller(cli: &CliEngine, username: &str, admin: bool) -> Result<Caller> {
    let profile = cli
        .directory
        .by_username(username)
        .with_context(|| format!("unknown user '{username}'"))?;
    Ok(if admin {
        Caller::admin(profile.id)
    } else {
        Caller::user(profile.id)
    })
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected RFC 3339 or YYYY-MM-DD"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid date '{value}'"))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

/// Maps alpha-2 country codes to their ids via the lookup.
pub fn resolve_country_ids(cli: &CliEngine, codes: &[String]) -> Result<Vec<Uuid>> {
    codes
        .iter()
        .map(|code| {
            Ok(cli
                .countries
                .by_code_alpha2(code)
                .with_context(|| format!("unknown country code '{code}'"))?
                .id)
        })
        .collect()
}

/// Parses a UUID argument with a friendly error.
pub fn parse_id(value: &str, what: &str) -> Result<Uuid> {
    value
        .parse()
        .with_context(|| format!("invalid {what} id '{value}'"))
}

//! External collaborators consumed by the engine
//!
//! The engine treats the user directory, country lookup, short-link
//! provider, clock, and notification delivery as black boxes behind traits.
//! In-process reference implementations live here too; they back the CLI
//! and the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::error::{ReferralError, Result};
use crate::events::ReferralEvent;

/// ISO 3166-1 alpha-2 code of the sentinel "worldwide" country.
pub const WORLDWIDE_CODE_ALPHA2: &str = "WW";

/// The acting user, as established by the (out-of-scope) API layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub admin: bool,
}

impl Caller {
    #[must_use]
    pub const fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    #[must_use]
    pub const fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}

/// A user as the directory reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub country_id: Option<Uuid>,
    /// Profile-completeness flag; referees must be onboarded to claim
    pub onboarded: bool,
}

impl UserProfile {
    #[must_use]
    pub fn display_name_or_username(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Read-only user directory.
pub trait UserDirectory: Send + Sync {
    fn by_id(&self, id: Uuid) -> Result<UserProfile>;
    fn by_username(&self, username: &str) -> Result<UserProfile>;
}

/// In-process directory backed by a map; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    users: RwLock<HashMap<Uuid, UserProfile>>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: RwLock::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub fn upsert(&self, profile: UserProfile) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.id, profile);
    }

    #[must_use]
    pub fn profiles(&self) -> Vec<UserProfile> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl UserDirectory for StaticDirectory {
    fn by_id(&self, id: Uuid) -> Result<UserProfile> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("User", id))
    }

    fn by_username(&self, username: &str) -> Result<UserProfile> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .cloned()
            .ok_or_else(|| ReferralError::not_found("User", username))
    }
}

/// A country as the lookup reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountryRecord {
    pub id: Uuid,
    pub code_alpha2: String,
    pub name: String,
}

/// Country lookup; must at least resolve the worldwide marker.
pub trait CountryLookup: Send + Sync {
    fn by_code_alpha2(&self, code: &str) -> Result<CountryRecord>;
}

/// In-process country table seeded with the worldwide marker.
#[derive(Debug)]
pub struct StaticCountries {
    countries: RwLock<Vec<CountryRecord>>,
}

impl StaticCountries {
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = CountryRecord>) -> Self {
        Self {
            countries: RwLock::new(records.into_iter().collect()),
        }
    }

    /// A table containing only the worldwide sentinel.
    #[must_use]
    pub fn with_worldwide() -> Self {
        Self {
            countries: RwLock::new(vec![CountryRecord {
                id: Uuid::new_v4(),
                code_alpha2: WORLDWIDE_CODE_ALPHA2.to_string(),
                name: "Worldwide".to_string(),
            }]),
        }
    }

    pub fn insert(&self, country: CountryRecord) {
        self.countries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(country);
    }

    #[must_use]
    pub fn records(&self) -> Vec<CountryRecord> {
        self.countries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CountryLookup for StaticCountries {
    fn by_code_alpha2(&self, code: &str) -> Result<CountryRecord> {
        self.countries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.code_alpha2.eq_ignore_ascii_case(code))
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Country", code))
    }
}

/// A block reason as the lookup reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockReason {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Lookup for administrator block reasons.
pub trait BlockReasonLookup: Send + Sync {
    fn by_id(&self, id: Uuid) -> Result<BlockReason>;
}

#[derive(Debug, Default)]
pub struct StaticBlockReasons {
    reasons: RwLock<HashMap<Uuid, BlockReason>>,
}

impl StaticBlockReasons {
    #[must_use]
    pub fn new(reasons: impl IntoIterator<Item = BlockReason>) -> Self {
        Self {
            reasons: RwLock::new(reasons.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub fn insert(&self, reason: BlockReason) {
        self.reasons
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reason.id, reason);
    }

    #[must_use]
    pub fn records(&self) -> Vec<BlockReason> {
        self.reasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl BlockReasonLookup for StaticBlockReasons {
    fn by_id(&self, id: Uuid) -> Result<BlockReason> {
        self.reasons
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Block reason", id))
    }
}

/// Request handed to the short-link provider at link creation.
#[derive(Clone, Debug)]
pub struct ShortLinkRequest {
    pub title: String,
    pub url: Url,
}

/// A persisted short link, as the provider returns it.
#[derive(Clone, Debug)]
pub struct ShortLink {
    pub link: String,
}

/// External link-shortening collaborator; failure propagates as a creation
/// error.
pub trait ShortLinkProvider: Send + Sync {
    fn shorten(&self, request: &ShortLinkRequest) -> Result<ShortLink>;
}

/// In-process shortener issuing sequential codes under a base URL.
#[derive(Debug)]
pub struct CounterShortLinks {
    base: Url,
    counter: AtomicU64,
}

impl CounterShortLinks {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            base,
            counter: AtomicU64::new(0),
        }
    }
}

impl ShortLinkProvider for CounterShortLinks {
    fn shorten(&self, _request: &ShortLinkRequest) -> Result<ShortLink> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let short = self
            .base
            .join(&format!("{n:06x}"))
            .map_err(|e| ReferralError::ShortLink(e.to_string()))?;
        Ok(ShortLink {
            link: short.to_string(),
        })
    }
}

/// Time source, injectable so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A pinned clock for tests; advance it explicitly.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(by).unwrap_or(*now);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Notification delivery; informed of committed transitions, never part of
/// invariant enforcement.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: &ReferralEvent);
}

/// Default sink: structured log lines only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, event: &ReferralEvent) {
        info!(?event, "referral event");
    }
}

/// Test/diagnostic sink that records every delivered event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RwLock<Vec<ReferralEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn events(&self) -> Vec<ReferralEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, event: &ReferralEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

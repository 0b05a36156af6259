//! Entities and status state machines for the referral engine
//!
//! Statuses are closed tagged enums with an explicit transition table (a set
//! of allowed `(from, to)` pairs) so the legality rule lives in one place.
//! Entities are never physically deleted; `Deleted`, `Cancelled` and
//! `Expired` are logical terminal states.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Program lifecycle.
///
/// Effects per state:
/// - New link?  Can a referrer create new links under this program.
/// - New claim? Can a referee claim an existing link under this program.
/// - Pending usages: what happens to already-claimed, still-pending usages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramStatus {
    /// New link YES, new claim YES, pending usages continue and may complete.
    Active,
    /// Manually paused. New link NO, new claim NO; pending usages continue
    /// (in-flight referees are not punished). Reactivable.
    Inactive,
    /// End date reached. New link NO, new claim NO; active links and pending
    /// usages expire (cascade).
    Expired,
    /// Global completion cap hit; terminal for growth. Pending usages
    /// continue and may complete.
    LimitReached,
    /// Required pathway broken; claims blocked while admins fix or the grace
    /// period runs out.
    UnCompletable,
    /// Terminal.
    Deleted,
}

impl ProgramStatus {
    /// Allowed lifecycle transitions, as explicit pairs.
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Inactive, Self::Active),
        (Self::Inactive, Self::Deleted),
        (Self::Active, Self::Inactive),
        (Self::Active, Self::Expired),
        (Self::Active, Self::LimitReached),
        (Self::Active, Self::UnCompletable),
        (Self::Active, Self::Deleted),
        (Self::UnCompletable, Self::Active),
        (Self::UnCompletable, Self::Expired),
        (Self::UnCompletable, Self::LimitReached),
        (Self::UnCompletable, Self::Deleted),
        (Self::Expired, Self::Deleted),
        (Self::LimitReached, Self::Deleted),
    ];

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Expired => "Expired",
            Self::LimitReached => "LimitReached",
            Self::UnCompletable => "UnCompletable",
            Self::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// Link lifecycle (per referrer). `Active` is the only state accepting new
/// claims; the other three are final for the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkStatus {
    Active,
    /// Manual/admin cancellation, referrer block, or program deletion.
    Cancelled,
    /// Per-referrer or global completion cap hit.
    LimitReached,
    /// Program expired.
    Expired,
}

impl LinkStatus {
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Active, Self::Cancelled),
        (Self::Active, Self::LimitReached),
        (Self::Active, Self::Expired),
    ];

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Cancelled => "Cancelled",
            Self::LimitReached => "LimitReached",
            Self::Expired => "Expired",
        };
        f.write_str(name)
    }
}

/// Usage lifecycle (per referee claim).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageStatus {
    /// Claimed, awaiting completion of the program's criteria.
    Pending,
    /// Criteria satisfied; rewards allocated at completion time. Terminal.
    Completed,
    /// Completion window elapsed or program/link expired. Terminal.
    Expired,
}

impl UsageStatus {
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Pending, Self::Completed),
        (Self::Pending, Self::Expired),
    ];

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        Self::TRANSITIONS.contains(&(self, next))
    }
}

impl fmt::Display for UsageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Expired => "Expired",
        };
        f.write_str(name)
    }
}

/// A time-boxed referral campaign with limits, rewards, and eligibility
/// rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    /// Unique, case-insensitive
    pub name: String,
    pub description: String,
    pub image_url: Option<Url>,
    /// Days a claim has to complete before the expiry sweep picks it up
    pub completion_window_days: Option<u32>,
    /// Per-link completion cap
    pub completion_limit_referee: Option<u32>,
    /// Global completion cap
    pub completion_limit: Option<u32>,
    /// Completions so far across all links
    pub completion_total: u32,
    /// Referrer payout per completion, in whole Zlto
    pub zlto_reward_referrer: Option<u64>,
    /// Referee payout per completion, in whole Zlto
    pub zlto_reward_referee: Option<u64>,
    /// Budget earmarked for this program
    pub zlto_reward_pool: Option<u64>,
    /// Zlto awarded so far (referrer + referee shares)
    pub zlto_reward_cumulative: u64,
    pub proof_of_personhood_required: bool,
    pub pathway_required: bool,
    /// Whether one referrer may hold more than one active link
    pub multiple_links_allowed: bool,
    pub status: ProgramStatus,
    /// At most one default program system-wide; a default must be worldwide
    pub is_default: bool,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    /// Associated country ids; empty means worldwide
    pub countries: Vec<Uuid>,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl Program {
    /// Remaining allowed completions, when a global limit is configured.
    #[must_use]
    pub fn completion_balance(&self) -> Option<u32> {
        self.completion_limit
            .map(|limit| limit.saturating_sub(self.completion_total))
    }

    /// True when a global limit is configured and the balance is exhausted.
    #[must_use]
    pub fn completion_balance_exhausted(&self) -> bool {
        self.completion_balance() == Some(0)
    }

    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.date_start <= now
    }

    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.date_end.is_some_and(|end| end <= now)
    }

    /// Total payout per completion: referrer plus referee shares.
    #[must_use]
    pub fn reward_per_completion(&self) -> u64 {
        self.zlto_reward_referrer
            .unwrap_or(0)
            .saturating_add(self.zlto_reward_referee.unwrap_or(0))
    }
}

/// A per-referrer, per-program shareable claim target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub id: Uuid,
    /// Unique per user + program, case-insensitive
    pub name: String,
    pub description: Option<String>,
    pub program_id: Uuid,
    /// Owning referrer
    pub user_id: Uuid,
    pub status: LinkStatus,
    /// Canonical claim URL; immutable once set
    pub url: Url,
    /// Externally generated short URL; immutable once set
    pub short_url: String,
    /// Completed usages attributed to this link
    pub completion_total: u32,
    /// Referrer Zlto awarded through this link so far
    pub zlto_reward_cumulative: u64,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// One referee's claim-and-completion record against a link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkUsage {
    pub id: Uuid,
    pub program_id: Uuid,
    pub link_id: Uuid,
    /// Claiming referee
    pub user_id: Uuid,
    /// Owning referrer, denormalised for reporting
    pub user_id_referrer: Uuid,
    pub status: UsageStatus,
    /// Amounts actually awarded, set at completion
    pub zlto_reward_referrer: Option<u64>,
    pub zlto_reward_referee: Option<u64>,
    pub date_claimed: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
    pub date_expired: Option<DateTime<Utc>>,
}

/// An administrator's block on a user's referral participation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    /// Blocked user; at most one active block per user
    pub user_id: Uuid,
    pub reason_id: Uuid,
    pub reason: String,
    pub comment_block: Option<String>,
    pub comment_unblock: Option<String>,
    pub active: bool,
    pub blocked_by: Uuid,
    pub unblocked_by: Option<Uuid>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

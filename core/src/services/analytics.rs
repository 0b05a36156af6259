//! Read-only aggregation over links and usages
//!
//! Reporting only; no invariants of its own. Counts are derived from the
//! stored aggregates at read time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::collaborators::UserDirectory;
use crate::error::Result;
use crate::state::{LinkStatus, UsageStatus};
use crate::store::{MemoryStore, StoreReader};

/// Which side of the referral a report covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipationRole {
    Referrer,
    Referee,
}

/// Per-user aggregate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserAnalytics {
    pub user_id: Uuid,
    pub user_display_name: String,
    pub link_count: usize,
    pub link_count_active: usize,
    pub usage_count_completed: u64,
    pub usage_count_pending: u64,
    pub usage_count_expired: u64,
    pub zlto_reward_total: u64,
}

pub struct AnalyticsService {
    store: Arc<MemoryStore>,
    directory: Arc<dyn UserDirectory>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    pub fn by_user(&self, user_id: Uuid, role: ParticipationRole) -> Result<UserAnalytics> {
        let display_name = self
            .directory
            .by_id(user_id)
            .map(|p| p.display_name_or_username().to_string())?;

        let reader = self.store.read();
        Ok(Self::aggregate(&reader, user_id, display_name, role))
    }

    /// Per-user aggregates ordered by completed count (descending), then
    /// display name, then id — deterministic for consistent pagination.
    #[must_use]
    pub fn leaderboard(&self, role: ParticipationRole, limit: usize) -> Vec<UserAnalytics> {
        let reader = self.store.read();

        let user_ids: BTreeSet<Uuid> = match role {
            ParticipationRole::Referrer => reader.links.values().map(|l| l.user_id).collect(),
            ParticipationRole::Referee => reader.usages.values().map(|u| u.user_id).collect(),
        };

        let mut rows: Vec<UserAnalytics> = user_ids
            .into_iter()
            .map(|user_id| {
                let display_name = self
                    .directory
                    .by_id(user_id)
                    .map_or_else(|_| user_id.to_string(), |p| {
                        p.display_name_or_username().to_string()
                    });
                Self::aggregate(&reader, user_id, display_name, role)
            })
            .collect();

        rows.sort_by(|a, b| {
            b.usage_count_completed
                .cmp(&a.usage_count_completed)
                .then_with(|| a.user_display_name.cmp(&b.user_display_name))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        rows.truncate(limit);
        rows
    }

    fn aggregate(
        reader: &StoreReader<'_>,
        user_id: Uuid,
        display_name: String,
        role: ParticipationRole,
    ) -> UserAnalytics {
        let mut row = UserAnalytics {
            user_id,
            user_display_name: display_name,
            ..UserAnalytics::default()
        };

        match role {
            ParticipationRole::Referrer => {
                for link in reader.links_for_user(user_id) {
                    row.link_count = row.link_count.saturating_add(1);
                    if link.status == LinkStatus::Active {
                        row.link_count_active = row.link_count_active.saturating_add(1);
                    }
                    row.usage_count_completed = row
                        .usage_count_completed
                        .saturating_add(u64::from(link.completion_total));
                    row.zlto_reward_total = row
                        .zlto_reward_total
                        .saturating_add(link.zlto_reward_cumulative);
                }
                for usage in reader.usages.values().filter(|u| u.user_id_referrer == user_id) {
                    match usage.status {
                        UsageStatus::Pending => {
                            row.usage_count_pending = row.usage_count_pending.saturating_add(1);
                        }
                        UsageStatus::Expired => {
                            row.usage_count_expired = row.usage_count_expired.saturating_add(1);
                        }
                        UsageStatus::Completed => {}
                    }
                }
            }
            ParticipationRole::Referee => {
                for usage in reader.usages.values().filter(|u| u.user_id == user_id) {
                    match usage.status {
                        UsageStatus::Pending => {
                            row.usage_count_pending = row.usage_count_pending.saturating_add(1);
                        }
                        UsageStatus::Completed => {
                            row.usage_count_completed =
                                row.usage_count_completed.saturating_add(1);
                            row.zlto_reward_total = row
                                .zlto_reward_total
                                .saturating_add(usage.zlto_reward_referee.unwrap_or(0));
                        }
                        UsageStatus::Expired => {
                            row.usage_count_expired = row.usage_count_expired.saturating_add(1);
                        }
                    }
                }
            }
        }

        row
    }
}

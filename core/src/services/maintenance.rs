//! Bulk and cascading link state changes
//!
//! The single writer for cross-aggregate cascades: referrer blocks and
//! program status changes flip links (and their pending usages) through
//! this narrow interface instead of writing foreign aggregates directly.
//! Every method takes the caller's transaction handle and never begins its
//! own, so a cascade always commits atomically with the transition that
//! triggered it.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{LinkStatus, UsageStatus};
use crate::store::StoreTxn;

#[derive(Debug, Default, Clone, Copy)]
pub struct LinkMaintenanceService;

impl LinkMaintenanceService {
    /// Action upon referrer blocking: cancel all active links of the user.
    /// Returns the number of links cancelled.
    pub fn cancel_by_user(
        self,
        txn: &mut StoreTxn<'_>,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> usize {
        let mut cancelled = 0usize;
        for link in txn
            .links
            .values_mut()
            .filter(|l| l.user_id == user_id && l.status == LinkStatus::Active)
        {
            link.status = LinkStatus::Cancelled;
            link.date_modified = now;
            cancelled = cancelled.saturating_add(1);
            info!(link_id = %link.id, %user_id, "link cancelled: owner blocked");
        }
        cancelled
    }

    /// Action upon program deletion: cancel all active links of the program.
    pub fn cancel_by_program(
        self,
        txn: &mut StoreTxn<'_>,
        program_id: Uuid,
        now: DateTime<Utc>,
    ) -> usize {
        let mut cancelled = 0usize;
        for link in txn
            .links
            .values_mut()
            .filter(|l| l.program_id == program_id && l.status == LinkStatus::Active)
        {
            link.status = LinkStatus::Cancelled;
            link.date_modified = now;
            cancelled = cancelled.saturating_add(1);
            info!(link_id = %link.id, %program_id, "link cancelled: program deleted");
        }
        cancelled
    }

    /// Action upon the global completion cap being hit: flag all active
    /// links of the program as limit-reached. Pending usages continue and
    /// may still complete.
    pub fn limit_reached_by_program(
        self,
        txn: &mut StoreTxn<'_>,
        program_id: Uuid,
        now: DateTime<Utc>,
    ) -> usize {
        let mut flagged = 0usize;
        for link in txn
            .links
            .values_mut()
            .filter(|l| l.program_id == program_id && l.status == LinkStatus::Active)
        {
            link.status = LinkStatus::LimitReached;
            link.date_modified = now;
            flagged = flagged.saturating_add(1);
            info!(link_id = %link.id, %program_id, "link flagged limit-reached: program cap hit");
        }
        if flagged == 0 {
            debug!(%program_id, "no active links to flag for limit-reached program");
        }
        flagged
    }

    /// Action upon program expiration: expire all active links of the
    /// program, and cascade to their still-pending usages.
    pub fn expire_by_program(
        self,
        txn: &mut StoreTxn<'_>,
        program_id: Uuid,
        now: DateTime<Utc>,
    ) -> usize {
        let mut expired_links = Vec::new();
        for link in txn
            .links
            .values_mut()
            .filter(|l| l.program_id == program_id && l.status == LinkStatus::Active)
        {
            link.status = LinkStatus::Expired;
            link.date_modified = now;
            expired_links.push(link.id);
            info!(link_id = %link.id, %program_id, "link expired: program expired");
        }

        for usage in txn.usages.values_mut().filter(|u| {
            expired_links.contains(&u.link_id) && u.status == UsageStatus::Pending
        }) {
            usage.status = UsageStatus::Expired;
            usage.date_expired = Some(now);
            info!(usage_id = %usage.id, "pending usage expired with its link");
        }

        expired_links.len()
    }
}

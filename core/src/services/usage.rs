//! Referee claim flow and completion processing
//!
//! A claim validates against link, program, and prior-usage state before a
//! `Pending` usage is written; validation and the insert share one store
//! transaction so concurrent claims cannot oversell a cap. Completion
//! updates the usage, the owning link's counters, and the program's global
//! counters atomically relative to each other.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::collaborators::{Caller, Clock, NotificationSink, UserDirectory};
use crate::error::{ReferralError, Result, ValidationFailure};
use crate::events::ReferralEvent;
use crate::services::link::LinkService;
use crate::services::program::ProgramService;
use crate::state::{LinkStatus, LinkUsage, ProgramStatus, UsageStatus};
use crate::store::MemoryStore;

pub struct LinkUsageService {
    store: Arc<MemoryStore>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    programs: Arc<ProgramService>,
    links: Arc<LinkService>,
}

impl LinkUsageService {
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        programs: Arc<ProgramService>,
        links: Arc<LinkService>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            notifier,
            programs,
            links,
        }
    }

    /// Claims a link as the acting referee, producing a `Pending` usage.
    ///
    /// Duplicate-claim prevention is program-level, not link-level: one
    /// usage per (referee, program), whatever its state.
    pub fn claim_as_referee(&self, caller: Caller, link_id: Uuid) -> Result<LinkUsage> {
        let user = self.directory.by_id(caller.user_id)?;
        let now = self.clock.now();

        let mut txn = self.store.begin();

        let link = txn
            .links
            .get(&link_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Referral link", link_id))?;
        let program = txn
            .programs
            .get(&link.program_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", link.program_id))?;

        if link.user_id == user.id {
            return Err(ValidationFailure::SelfReferral.into());
        }

        if !user.onboarded {
            return Err(ValidationFailure::ProfileIncomplete.into());
        }

        if let Some(existing) = txn.usage_for(user.id, program.id) {
            return Err(match existing.status {
                UsageStatus::Pending => ValidationFailure::ClaimStillPending {
                    program: program.name,
                },
                UsageStatus::Completed => ValidationFailure::ProgramAlreadyCompleted {
                    program: program.name,
                },
                UsageStatus::Expired => ValidationFailure::PreviousClaimExpired {
                    program: program.name,
                    date: existing
                        .date_expired
                        .unwrap_or(existing.date_claimed)
                        .date_naive(),
                },
            }
            .into());
        }

        // Blocks apply to referrers, not referees: a blocked referrer's
        // links are already cancelled and fail the link-status check below.

        if program.status != ProgramStatus::Active {
            return Err(ValidationFailure::ProgramNotClaimable {
                name: program.name,
                status: program.status,
            }
            .into());
        }

        // Fallback guards in case the start/expiry sweeps haven't run yet
        if !program.has_started(now) {
            return Err(ValidationFailure::ProgramStartsOn {
                name: program.name,
                date: program.date_start.date_naive(),
            }
            .into());
        }
        if program.has_ended(now) {
            return Err(ValidationFailure::ProgramExpiredOn {
                name: program.name,
                date: program
                    .date_end
                    .map_or_else(|| now.date_naive(), |end| end.date_naive()),
            }
            .into());
        }

        if program.completion_balance_exhausted() {
            return Err(ValidationFailure::CompletionLimitReached {
                name: program.name,
            }
            .into());
        }

        if link.status != LinkStatus::Active {
            return Err(ValidationFailure::LinkNotClaimable {
                name: link.name,
                status: link.status,
            }
            .into());
        }

        if program
            .completion_limit_referee
            .is_some_and(|cap| link.completion_total >= cap)
        {
            return Err(ValidationFailure::CompletionLimitReached {
                name: program.name,
            }
            .into());
        }

        let usage = LinkUsage {
            id: Uuid::new_v4(),
            program_id: program.id,
            link_id: link.id,
            user_id: user.id,
            user_id_referrer: link.user_id,
            status: UsageStatus::Pending,
            zlto_reward_referrer: None,
            zlto_reward_referee: None,
            date_claimed: now,
            date_completed: None,
            date_expired: None,
        };

        txn.usages.insert(usage.id, usage.clone());
        drop(txn);

        info!(
            usage_id = %usage.id,
            link_id = %link.id,
            user_id = %user.id,
            "referral link claimed"
        );
        self.notifier.deliver(&ReferralEvent::UsageClaimed {
            usage_id: usage.id,
            link_id: link.id,
            program_id: program.id,
            user_id: user.id,
        });
        Ok(usage)
    }

    /// Completes a pending usage once the referee's criteria are externally
    /// satisfied: rewards are assigned from the program's configured
    /// amounts, then link and program counters advance inside the same
    /// transaction (the program side may cascade `LimitReached`).
    pub fn process_completion(&self, usage_id: Uuid) -> Result<LinkUsage> {
        let now = self.clock.now();
        let mut txn = self.store.begin();

        let usage = txn
            .usages
            .get(&usage_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Referral link usage", usage_id))?;

        if usage.status != UsageStatus::Pending {
            return Err(ValidationFailure::UsageNotPending {
                status: usage.status,
            }
            .into());
        }

        // Snapshot before counters move: the link-level flip logic keys off
        // the program state as of this completion.
        let program = txn
            .programs
            .get(&usage.program_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", usage.program_id))?;

        // Pre-validate everything that can fail before the first write; the
        // in-memory transaction has no rollback, so a partial completion
        // must be impossible.
        if program.completion_balance_exhausted() {
            return Err(ValidationFailure::CompletionLimitReached {
                name: program.name,
            }
            .into());
        }
        if !txn.links.contains_key(&usage.link_id) {
            return Err(ReferralError::not_found("Referral link", usage.link_id));
        }

        let reward_referrer = program.zlto_reward_referrer.unwrap_or(0);
        let reward_referee = program.zlto_reward_referee.unwrap_or(0);

        let completed = {
            let stored = txn
                .usages
                .get_mut(&usage_id)
                .ok_or_else(|| ReferralError::not_found("Referral link usage", usage_id))?;
            stored.status = UsageStatus::Completed;
            stored.date_completed = Some(now);
            stored.zlto_reward_referrer = Some(reward_referrer);
            stored.zlto_reward_referee = Some(reward_referee);
            stored.clone()
        };

        self.links
            .process_completion(&mut txn, &program, usage.link_id, reward_referrer, now)?;
        self.programs.process_completion(
            &mut txn,
            usage.program_id,
            reward_referrer.saturating_add(reward_referee),
            now,
        )?;

        drop(txn);

        info!(
            usage_id = %usage_id,
            link_id = %usage.link_id,
            program_id = %usage.program_id,
            "referral usage completed"
        );
        self.notifier.deliver(&ReferralEvent::UsageCompleted {
            usage_id,
            link_id: usage.link_id,
            program_id: usage.program_id,
            zlto_reward_referrer: reward_referrer,
            zlto_reward_referee: reward_referee,
        });
        Ok(completed)
    }

    /// Expires a pending usage; invoked by the external completion-window
    /// sweep. Fails when the usage is no longer pending.
    pub fn process_expiration(&self, usage_id: Uuid) -> Result<LinkUsage> {
        let now = self.clock.now();
        let mut txn = self.store.begin();

        let usage = txn
            .usages
            .get_mut(&usage_id)
            .ok_or_else(|| ReferralError::not_found("Referral link usage", usage_id))?;

        if usage.status != UsageStatus::Pending {
            return Err(ValidationFailure::UsageNotPending {
                status: usage.status,
            }
            .into());
        }

        usage.status = UsageStatus::Expired;
        usage.date_expired = Some(now);
        let expired = usage.clone();
        drop(txn);

        info!(usage_id = %usage_id, "referral usage expired");
        Ok(expired)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<LinkUsage> {
        self.store
            .read()
            .usages
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Referral link usage", id))
    }

    /// The caller's usage for a program, as referee.
    pub fn get_by_program_as_referee(&self, caller: Caller, program_id: Uuid) -> Result<LinkUsage> {
        self.store
            .read()
            .usage_for(caller.user_id, program_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Referral link usage", program_id))
    }

    #[must_use]
    pub fn list_by_referee(&self, user_id: Uuid) -> Vec<LinkUsage> {
        let reader = self.store.read();
        let mut usages: Vec<LinkUsage> = reader
            .usages
            .values()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect();
        usages.sort_by_key(|u| (u.date_claimed, u.id));
        usages
    }

    #[must_use]
    pub fn list_by_referrer(&self, user_id: Uuid) -> Vec<LinkUsage> {
        let reader = self.store.read();
        let mut usages: Vec<LinkUsage> = reader
            .usages
            .values()
            .filter(|u| u.user_id_referrer == user_id)
            .cloned()
            .collect();
        usages.sort_by_key(|u| (u.date_claimed, u.id));
        usages
    }
}

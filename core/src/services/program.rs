//! Program lifecycle, completion-cap bookkeeping, and default designation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::collaborators::{
    Caller, Clock, CountryLookup, NotificationSink, UserDirectory, WORLDWIDE_CODE_ALPHA2,
};
use crate::error::{ReferralError, Result, ValidationFailure};
use crate::events::ReferralEvent;
use crate::policy;
use crate::services::maintenance::LinkMaintenanceService;
use crate::state::{Program, ProgramStatus};
use crate::store::{MemoryStore, StoreTxn};

/// Payload for creating a program.
#[derive(Clone, Debug)]
pub struct ProgramRequest {
    pub name: String,
    pub description: String,
    pub image_url: Option<Url>,
    pub completion_window_days: Option<u32>,
    pub completion_limit_referee: Option<u32>,
    pub completion_limit: Option<u32>,
    pub zlto_reward_referrer: Option<u64>,
    pub zlto_reward_referee: Option<u64>,
    pub zlto_reward_pool: Option<u64>,
    pub proof_of_personhood_required: bool,
    pub pathway_required: bool,
    pub multiple_links_allowed: bool,
    /// Start life in `Active` instead of `Inactive`
    pub pre_activated: bool,
    pub is_default: bool,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub countries: Vec<Uuid>,
}

/// Filter for program search; `None` members match everything the caller
/// may see.
#[derive(Clone, Debug, Default)]
pub struct ProgramSearchFilter {
    pub statuses: Option<Vec<ProgramStatus>>,
    pub countries: Option<Vec<Uuid>>,
    pub name_contains: Option<String>,
}

/// Owns program status transitions and the program-level completion
/// counter. The counter mutation path requires the caller's lock handle so
/// cap checks and writes share one critical section.
pub struct ProgramService {
    store: Arc<MemoryStore>,
    directory: Arc<dyn UserDirectory>,
    countries: Arc<dyn CountryLookup>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    maintenance: LinkMaintenanceService,
}

impl ProgramService {
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        directory: Arc<dyn UserDirectory>,
        countries: Arc<dyn CountryLookup>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            directory,
            countries,
            clock,
            notifier,
            maintenance: LinkMaintenanceService,
        }
    }

    pub fn create(&self, caller: Caller, request: ProgramRequest) -> Result<Program> {
        let now = self.clock.now();
        let worldwide_id = self.countries.by_code_alpha2(WORLDWIDE_CODE_ALPHA2)?.id;

        let mut txn = self.store.begin();

        if txn.program_by_name(&request.name).is_some() {
            return Err(ValidationFailure::ProgramNameExists { name: request.name }.into());
        }

        if request.is_default
            && !policy::default_program_is_worldwide(worldwide_id, Some(&request.countries))
        {
            return Err(ValidationFailure::DefaultProgramNotWorldwide { name: request.name }.into());
        }

        let status = if request.pre_activated {
            ProgramStatus::Active
        } else {
            ProgramStatus::Inactive
        };

        let program = Program {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            image_url: request.image_url,
            completion_window_days: request.completion_window_days,
            completion_limit_referee: request.completion_limit_referee,
            completion_limit: request.completion_limit,
            completion_total: 0,
            zlto_reward_referrer: request.zlto_reward_referrer,
            zlto_reward_referee: request.zlto_reward_referee,
            zlto_reward_pool: request.zlto_reward_pool,
            zlto_reward_cumulative: 0,
            proof_of_personhood_required: request.proof_of_personhood_required,
            pathway_required: request.pathway_required,
            multiple_links_allowed: request.multiple_links_allowed,
            status,
            is_default: false, // set below, under the default-uniqueness invariant
            date_start: request.date_start,
            date_end: request.date_end,
            countries: request.countries,
            created_by: caller.user_id,
            modified_by: caller.user_id,
            date_created: now,
            date_modified: now,
        };

        let id = program.id;
        txn.programs.insert(id, program);

        if request.is_default {
            Self::flip_default(&mut txn, id, caller.user_id, now);
        }

        let created = txn
            .programs
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", id))?;
        drop(txn);

        info!(program_id = %id, name = %created.name, "program created");
        Ok(created)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<Program> {
        self.store
            .read()
            .programs
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", id))
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Program> {
        self.store.read().program_by_name(name).cloned()
    }

    /// The current default program, if any. More than one default is a
    /// stored-invariant breach and surfaces as a data-inconsistency error.
    pub fn get_default(&self) -> Result<Option<Program>> {
        let reader = self.store.read();
        let defaults = reader.default_programs();
        if defaults.len() > 1 {
            return Err(ReferralError::DataInconsistency(
                "Multiple programs are marked as default".to_string(),
            ));
        }
        Ok(defaults.first().map(|p| (*p).clone()))
    }

    /// Country- and status-filtered listing. The effective country filter is
    /// resolved through the eligibility policy, so non-admin callers can
    /// never widen their visibility past `[own country, worldwide]`.
    pub fn search(&self, caller: Option<Caller>, filter: &ProgramSearchFilter) -> Result<Vec<Program>> {
        let worldwide_id = self.countries.by_code_alpha2(WORLDWIDE_CODE_ALPHA2)?.id;
        let is_admin = caller.is_some_and(|c| c.admin);
        let user_country = match caller {
            Some(c) => self.directory.by_id(c.user_id)?.country_id,
            None => None,
        };

        let countries = policy::resolve_available_countries(
            worldwide_id,
            caller.is_some(),
            is_admin,
            user_country,
            filter.countries.clone(),
        );

        // Non-admins only ever see active programs.
        let statuses = if is_admin {
            filter.statuses.clone()
        } else {
            Some(vec![ProgramStatus::Active])
        };

        let reader = self.store.read();
        let mut results: Vec<Program> = reader
            .programs
            .values()
            .filter(|p| {
                statuses
                    .as_ref()
                    .is_none_or(|wanted| wanted.contains(&p.status))
            })
            .filter(|p| {
                countries.as_ref().is_none_or(|filter_set| {
                    p.countries.is_empty() || p.countries.iter().any(|c| filter_set.contains(c))
                })
            })
            .filter(|p| {
                filter.name_contains.as_ref().is_none_or(|needle| {
                    p.name.to_lowercase().contains(&needle.to_lowercase())
                })
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(results)
    }

    /// Applies a status transition after validating it against the
    /// transition table. Link-invalidating transitions cascade through the
    /// maintenance service within the same transaction.
    pub fn update_status(
        &self,
        caller: Caller,
        id: Uuid,
        new_status: ProgramStatus,
    ) -> Result<Program> {
        let now = self.clock.now();
        let mut txn = self.store.begin();

        let from = {
            let program = txn
                .programs
                .get_mut(&id)
                .ok_or_else(|| ReferralError::not_found("Program", id))?;

            let from = program.status;
            if !from.can_transition_to(new_status) {
                return Err(ValidationFailure::InvalidProgramTransition {
                    from,
                    to: new_status,
                }
                .into());
            }

            program.status = new_status;
            program.modified_by = caller.user_id;
            program.date_modified = now;
            from
        };

        match new_status {
            ProgramStatus::Deleted => {
                let cancelled = self.maintenance.cancel_by_program(&mut txn, id, now);
                info!(program_id = %id, cancelled, "program deleted; active links cancelled");
            }
            ProgramStatus::Expired => {
                let expired = self.maintenance.expire_by_program(&mut txn, id, now);
                info!(program_id = %id, expired, "program expired; links and pending usages expired");
            }
            ProgramStatus::LimitReached => {
                let flagged = self.maintenance.limit_reached_by_program(&mut txn, id, now);
                info!(program_id = %id, flagged, "program limit-reached; links flagged");
            }
            _ => {}
        }

        let updated = txn
            .programs
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", id))?;
        drop(txn);

        info!(program_id = %id, %from, to = %new_status, "program status updated");
        self.notifier.deliver(&ReferralEvent::ProgramStatusChanged {
            program_id: id,
            from,
            to: new_status,
        });
        Ok(updated)
    }

    /// Advances the program-level completion counter under the caller's
    /// lock. Fails without writing when the configured global limit is
    /// already exhausted — the lock spans check and write, so the counter
    /// can never be oversold. When the limit is newly reached the program
    /// flips to `LimitReached` and the link-level cascade runs inside the
    /// same transaction.
    pub fn process_completion(
        &self,
        txn: &mut StoreTxn<'_>,
        program_id: Uuid,
        reward_amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Program> {
        let (newly_reached, snapshot) = {
            let program = txn
                .programs
                .get_mut(&program_id)
                .ok_or_else(|| ReferralError::not_found("Program", program_id))?;

            if program.completion_balance_exhausted() {
                return Err(ValidationFailure::CompletionLimitReached {
                    name: program.name.clone(),
                }
                .into());
            }

            program.completion_total = program.completion_total.saturating_add(1);
            program.zlto_reward_cumulative =
                program.zlto_reward_cumulative.saturating_add(reward_amount);
            program.date_modified = now;

            let cap_hit = program
                .completion_limit
                .is_some_and(|limit| program.completion_total >= limit);
            let newly_reached =
                cap_hit && program.status.can_transition_to(ProgramStatus::LimitReached);
            if newly_reached {
                program.status = ProgramStatus::LimitReached;
            } else {
                debug!(
                    program_id = %program.id,
                    total = program.completion_total,
                    "program completion recorded"
                );
            }
            (newly_reached, program.clone())
        };

        if newly_reached {
            info!(
                %program_id,
                total = snapshot.completion_total,
                "program completion limit reached; cascading to links"
            );
            self.maintenance
                .limit_reached_by_program(txn, program_id, now);
            self.notifier
                .deliver(&ReferralEvent::ProgramLimitReached { program_id });
        }

        Ok(snapshot)
    }

    /// Designates the program as the system default. The program must be
    /// worldwide-accessible; any prior default is cleared in the same
    /// transaction, preserving the at-most-one-default invariant.
    pub fn set_as_default(&self, caller: Caller, id: Uuid) -> Result<Program> {
        let now = self.clock.now();
        let worldwide_id = self.countries.by_code_alpha2(WORLDWIDE_CODE_ALPHA2)?.id;

        let mut txn = self.store.begin();

        {
            let program = txn
                .programs
                .get(&id)
                .ok_or_else(|| ReferralError::not_found("Program", id))?;
            if !policy::default_program_is_worldwide(worldwide_id, Some(&program.countries)) {
                return Err(ValidationFailure::DefaultProgramNotWorldwide {
                    name: program.name.clone(),
                }
                .into());
            }
        }

        Self::flip_default(&mut txn, id, caller.user_id, now);

        let updated = txn
            .programs
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", id))?;
        drop(txn);

        info!(program_id = %id, "program set as default");
        Ok(updated)
    }

    /// Clears any prior default and flags `id`, all under the held lock.
    fn flip_default(txn: &mut StoreTxn<'_>, id: Uuid, actor: Uuid, now: DateTime<Utc>) {
        for program in txn.programs.values_mut() {
            let should_be_default = program.id == id;
            if program.is_default != should_be_default {
                program.is_default = should_be_default;
                program.modified_by = actor;
                program.date_modified = now;
            }
        }
    }
}

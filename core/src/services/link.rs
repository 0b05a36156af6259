//! Referral link creation, cancellation, and completion bookkeeping

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::collaborators::{
    Caller, Clock, CountryLookup, NotificationSink, ShortLinkProvider, ShortLinkRequest,
    UserDirectory, WORLDWIDE_CODE_ALPHA2,
};
use crate::error::{ReferralError, Result, ValidationFailure};
use crate::events::ReferralEvent;
use crate::policy;
use crate::state::{Link, LinkStatus, Program, ProgramStatus};
use crate::store::{MemoryStore, StoreTxn};

/// Payload for creating a link.
#[derive(Clone, Debug)]
pub struct LinkRequest {
    pub program_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Owns link creation and cancellation. Creation enforces program state,
/// country eligibility, and the per-user link-limit rules before anything
/// is written; the whole rule chain runs inside one store transaction.
pub struct LinkService {
    store: Arc<MemoryStore>,
    directory: Arc<dyn UserDirectory>,
    countries: Arc<dyn CountryLookup>,
    shortener: Arc<dyn ShortLinkProvider>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    /// Application base URL the canonical claim URL hangs off
    base_url: Url,
}

impl LinkService {
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        directory: Arc<dyn UserDirectory>,
        countries: Arc<dyn CountryLookup>,
        shortener: Arc<dyn ShortLinkProvider>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        base_url: Url,
    ) -> Self {
        Self {
            store,
            directory,
            countries,
            shortener,
            clock,
            notifier,
            base_url,
        }
    }

    pub fn create(&self, caller: Caller, request: LinkRequest) -> Result<Link> {
        let user = self.directory.by_id(caller.user_id)?;
        let worldwide_id = self.countries.by_code_alpha2(WORLDWIDE_CODE_ALPHA2)?.id;
        let now = self.clock.now();

        let mut txn = self.store.begin();

        let program = txn
            .programs
            .get(&request.program_id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Program", request.program_id))?;

        if program.status != ProgramStatus::Active || !program.has_started(now) {
            return Err(ValidationFailure::ProgramNotActiveOrNotStarted {
                name: program.name,
            }
            .into());
        }

        // Fallback guard in case the program expiration sweep hasn't run yet
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

        if !policy::program_accessible_to_user(
            worldwide_id,
            user.country_id,
            Some(&program.countries),
        ) {
            return Err(ValidationFailure::NotAvailableInCountry {
                name: program.name,
            }
            .into());
        }

        if !program.multiple_links_allowed
            && txn.active_link_for(user.id, program.id).is_some()
        {
            return Err(ValidationFailure::MultipleLinksNotAllowed {
                name: program.name,
            }
            .into());
        }

        if txn
            .link_by_name(user.id, program.id, &request.name)
            .is_some()
        {
            return Err(ValidationFailure::LinkNameExists { name: request.name }.into());
        }

        let id = Uuid::new_v4();
        let url = self.claim_url(id)?;
        let short = self.shortener.shorten(&ShortLinkRequest {
            title: request.name.clone(),
            url: url.clone(),
        })?;

        let link = Link {
            id,
            name: request.name,
            description: request.description,
            program_id: program.id,
            user_id: user.id,
            status: LinkStatus::Active,
            url,
            short_url: short.link,
            completion_total: 0,
            zlto_reward_cumulative: 0,
            date_created: now,
            date_modified: now,
        };

        txn.links.insert(id, link.clone());
        drop(txn);

        info!(link_id = %id, program_id = %program.id, user_id = %user.id, "referral link created");
        self.notifier.deliver(&ReferralEvent::LinkCreated {
            link_id: id,
            program_id: program.id,
            user_id: user.id,
        });
        Ok(link)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<Link> {
        self.store
            .read()
            .links
            .get(&id)
            .cloned()
            .ok_or_else(|| ReferralError::not_found("Referral link", id))
    }

    /// The link, with ownership enforced: the caller must own it or carry
    /// the admin override.
    pub fn get_owned(&self, caller: Caller, id: Uuid) -> Result<Link> {
        let link = self.get_by_id(id)?;
        if link.user_id != caller.user_id && !caller.admin {
            return Err(ReferralError::Unauthorized);
        }
        Ok(link)
    }

    #[must_use]
    pub fn list_by_user(&self, user_id: Uuid) -> Vec<Link> {
        let reader = self.store.read();
        let mut links: Vec<Link> = reader.links_for_user(user_id).cloned().collect();
        links.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        links
    }

    /// Cancels the caller's link. Cancelling an already-cancelled link is an
    /// idempotent no-op returning the current state without a write.
    pub fn cancel(&self, caller: Caller, id: Uuid) -> Result<Link> {
        let now = self.clock.now();
        let mut txn = self.store.begin();

        let link = txn
            .links
            .get_mut(&id)
            .ok_or_else(|| ReferralError::not_found("Referral link", id))?;

        if link.user_id != caller.user_id && !caller.admin {
            return Err(ReferralError::Unauthorized);
        }

        if link.status == LinkStatus::Cancelled {
            return Ok(link.clone());
        }

        if !link.status.can_transition_to(LinkStatus::Cancelled) {
            return Err(ValidationFailure::LinkNotCancellable {
                status: link.status,
            }
            .into());
        }

        link.status = LinkStatus::Cancelled;
        link.date_modified = now;
        let cancelled = link.clone();
        drop(txn);

        info!(link_id = %id, "referral link cancelled");
        self.notifier.deliver(&ReferralEvent::LinkCancelled {
            link_id: id,
            user_id: cancelled.user_id,
        });
        Ok(cancelled)
    }

    /// Advances the link-level completion counter under the caller's lock.
    ///
    /// The total always increments; the link only flips to `LimitReached`
    /// when it is still active and either the per-referrer cap is hit or
    /// the owning program has already reached its global cap.
    pub fn process_completion(
        &self,
        txn: &mut StoreTxn<'_>,
        program: &Program,
        link_id: Uuid,
        reward_amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Link> {
        let link = txn
            .links
            .get_mut(&link_id)
            .ok_or_else(|| ReferralError::not_found("Referral link", link_id))?;

        link.completion_total = link.completion_total.saturating_add(1);
        link.zlto_reward_cumulative = link.zlto_reward_cumulative.saturating_add(reward_amount);
        link.date_modified = now;

        let per_referrer_cap_hit = program
            .completion_limit_referee
            .is_some_and(|cap| link.completion_total >= cap);
        let program_cap_hit = program.status == ProgramStatus::LimitReached;

        if link.status == LinkStatus::Active && (per_referrer_cap_hit || program_cap_hit) {
            info!(
                link_id = %link.id,
                total = link.completion_total,
                per_referrer_cap_hit,
                program_cap_hit,
                "link flipped to limit-reached"
            );
            link.status = LinkStatus::LimitReached;
        } else {
            debug!(
                link_id = %link.id,
                total = link.completion_total,
                status = %link.status,
                "link completion recorded"
            );
        }

        Ok(link.clone())
    }

    fn claim_url(&self, link_id: Uuid) -> Result<Url> {
        self.base_url
            .join(&format!("referral/claim/{link_id}"))
            .map_err(|e| ReferralError::ShortLink(format!("cannot build claim URL: {e}")))
    }
}

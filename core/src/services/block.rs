//! Blocking and unblocking a user's referral participation
//!
//! Block and unblock are find-or-create / find-or-noop, not exception-based
//! control flow: blocking an already-blocked user returns the existing
//! block unchanged, and unblocking a never-blocked user performs no write.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::collaborators::{BlockReasonLookup, Caller, Clock, NotificationSink, UserDirectory};
use crate::error::{ReferralError, Result};
use crate::events::ReferralEvent;
use crate::services::maintenance::LinkMaintenanceService;
use crate::state::Block;
use crate::store::MemoryStore;

/// Payload for blocking a user.
#[derive(Clone, Debug)]
pub struct BlockRequest {
    pub user_id: Uuid,
    pub reason_id: Uuid,
    pub comment: Option<String>,
    /// Also cancel all of the user's active links
    pub cancel_links: bool,
}

pub struct BlockService {
    store: Arc<MemoryStore>,
    directory: Arc<dyn UserDirectory>,
    reasons: Arc<dyn BlockReasonLookup>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    maintenance: LinkMaintenanceService,
}

impl BlockService {
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        directory: Arc<dyn UserDirectory>,
        reasons: Arc<dyn BlockReasonLookup>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            directory,
            reasons,
            clock,
            notifier,
            maintenance: LinkMaintenanceService,
        }
    }

    /// The user's active block, if any. More than one active block is a
    /// stored-invariant breach.
    pub fn get_by_user(&self, user_id: Uuid) -> Result<Option<Block>> {
        let reader = self.store.read();
        let blocks = reader.active_blocks_for(user_id);
        if blocks.len() > 1 {
            return Err(ReferralError::DataInconsistency(format!(
                "Multiple active blocks found for user '{user_id}'"
            )));
        }
        Ok(blocks.first().map(|b| (*b).clone()))
    }

    pub fn block(&self, actor: Caller, request: BlockRequest) -> Result<Block> {
        let user = self.directory.by_id(request.user_id)?;
        let now = self.clock.now();

        let mut txn = self.store.begin();

        if let Some(existing) = txn
            .blocks
            .values()
            .find(|b| b.user_id == user.id && b.active)
        {
            // User is already blocked
            return Ok(existing.clone());
        }

        let reason = self.reasons.by_id(request.reason_id)?;

        let block = Block {
            id: Uuid::new_v4(),
            user_id: user.id,
            reason_id: reason.id,
            reason: reason.name,
            comment_block: request.comment,
            comment_unblock: None,
            active: true,
            blocked_by: actor.user_id,
            unblocked_by: None,
            date_created: now,
            date_modified: now,
        };

        txn.blocks.insert(block.id, block.clone());

        if request.cancel_links {
            let cancelled = self.maintenance.cancel_by_user(&mut txn, user.id, now);
            info!(user_id = %user.id, cancelled, "blocked user's active links cancelled");
        }

        drop(txn);

        info!(block_id = %block.id, user_id = %user.id, reason = %block.reason, "user blocked");
        self.notifier.deliver(&ReferralEvent::UserBlocked {
            block_id: block.id,
            user_id: user.id,
            reason: block.reason.clone(),
        });
        Ok(block)
    }

    /// Lifts the user's active block. Returns `None` without writing when
    /// no active block exists.
    pub fn unblock(
        &self,
        actor: Caller,
        user_id: Uuid,
        comment: Option<String>,
    ) -> Result<Option<Block>> {
        let user = self.directory.by_id(user_id)?;
        let now = self.clock.now();

        let mut txn = self.store.begin();

        let Some(block) = txn
            .blocks
            .values_mut()
            .find(|b| b.user_id == user.id && b.active)
        else {
            // User is not blocked
            return Ok(None);
        };

        block.active = false;
        block.comment_unblock = comment;
        block.unblocked_by = Some(actor.user_id);
        block.date_modified = now;
        let unblocked = block.clone();
        drop(txn);

        info!(block_id = %unblocked.id, user_id = %user.id, "user unblocked");
        self.notifier.deliver(&ReferralEvent::UserUnblocked {
            block_id: unblocked.id,
            user_id: user.id,
        });
        Ok(Some(unblocked))
    }
}

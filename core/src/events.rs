//! Engine events handed to the notification collaborator
//!
//! Events describe state transitions after they have been committed. They
//! play no role in invariant enforcement; a sink that fails is logged and
//! otherwise ignored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::ProgramStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralEvent {
    LinkCreated {
        link_id: Uuid,
        program_id: Uuid,
        user_id: Uuid,
    },
    LinkCancelled {
        link_id: Uuid,
        user_id: Uuid,
    },
    UsageClaimed {
        usage_id: Uuid,
        link_id: Uuid,
        program_id: Uuid,
        user_id: Uuid,
    },
    UsageCompleted {
        usage_id: Uuid,
        link_id: Uuid,
        program_id: Uuid,
        zlto_reward_referrer: u64,
        zlto_reward_referee: u64,
    },
    ProgramStatusChanged {
        program_id: Uuid,
        from: ProgramStatus,
        to: ProgramStatus,
    },
    /// Emitted once, when the global completion cap is first reached.
    ProgramLimitReached {
        program_id: Uuid,
    },
    UserBlocked {
        block_id: Uuid,
        user_id: Uuid,
        reason: String,
    },
    UserUnblocked {
        block_id: Uuid,
        user_id: Uuid,
    },
}

//! Laurel - referral-rewards engine
//!
//! Organizations define time-boxed [`Program`]s that reward a referrer for
//! recruiting a referee who completes an onboarding/task pathway. Referrers
//! obtain a shareable [`Link`]; a referee claims a link, producing a
//! [`LinkUsage`] that tracks pending-to-completed progress and reward
//! payout. Administrators can [`Block`] a user from referral participation,
//! forcibly cancelling their links.
//!
//! The crate owns the Program / Link / LinkUsage lifecycle state machines
//! and their eligibility/limit policies. Transport, storage technology,
//! pathway evaluation, and notification delivery are collaborator traits
//! (see [`collaborators`]); in-process reference implementations back the
//! CLI and tests.
//!
//! # Example
//!
//! ```
//! use laurel_core::{Caller, Engine, LinkRequest, ProgramRequest};
//! use laurel_core::collaborators::{StaticDirectory, UserProfile};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # fn main() -> laurel_core::Result<()> {
//! let admin = Uuid::new_v4();
//! let referrer = Uuid::new_v4();
//! let directory = Arc::new(StaticDirectory::new([
//!     UserProfile { id: admin, username: "admin".into(), display_name: None, country_id: None, onboarded: true },
//!     UserProfile { id: referrer, username: "ref".into(), display_name: None, country_id: None, onboarded: true },
//! ]));
//! let engine = Engine::builder().directory(directory).build();
//!
//! let program = engine.programs.create(Caller::admin(admin), ProgramRequest {
//!     name: "Spring Drive".into(),
//!     description: String::new(),
//!     image_url: None,
//!     completion_window_days: None,
//!     completion_limit_referee: None,
//!     completion_limit: Some(100),
//!     zlto_reward_referrer: Some(50),
//!     zlto_reward_referee: Some(25),
//!     zlto_reward_pool: None,
//!     proof_of_personhood_required: false,
//!     pathway_required: false,
//!     multiple_links_allowed: true,
//!     pre_activated: true,
//!     is_default: false,
//!     date_start: chrono::Utc::now(),
//!     date_end: None,
//!     countries: Vec::new(),
//! })?;
//!
//! let link = engine.links.create(Caller::user(referrer), LinkRequest {
//!     program_id: program.id,
//!     name: "My Link".into(),
//!     description: None,
//! })?;
//! assert!(!link.short_url.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod collaborators;
pub mod engine;
pub mod error;
pub mod events;
pub mod policy;
pub mod services;
pub mod state;
pub mod store;

// Re-export commonly used items
pub use collaborators::Caller;
pub use engine::{Engine, EngineBuilder};
pub use error::{ReferralError, Result, ValidationFailure};
pub use events::ReferralEvent;
pub use services::{
    AnalyticsService, BlockRequest, BlockService, LinkRequest, LinkService, LinkUsageService,
    ParticipationRole, ProgramRequest, ProgramSearchFilter, ProgramService, UserAnalytics,
};
pub use state::{
    Block, Link, LinkStatus, LinkUsage, Program, ProgramStatus, UsageStatus,
};
pub use store::{MemoryStore, StoreState, StoreTxn};

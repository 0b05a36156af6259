//! Error types for the Laurel referral engine
//!
//! Business-rule violations are modelled as enum-keyed reasons
//! ([`ValidationFailure`]) rather than free text: callers can match on the
//! variant, while `Display` renders the stable human-readable message for
//! each rule. Message rendering is therefore a separate concern from rule
//! identity, and tests match reasons by substring without being coupled to
//! exact phrasing of unrelated rules.

use chrono::NaiveDate;
use thiserror::Error;

use crate::state::{LinkStatus, ProgramStatus, UsageStatus};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ReferralError>;

/// Error types that can occur when operating the referral engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferralError {
    /// A business rule was violated; no state was written
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Requested entity does not resolve
    #[error("{entity} with id '{id}' does not exist")]
    NotFound { entity: &'static str, id: String },

    /// A stored invariant no longer holds (e.g. two default programs)
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    /// The short-link provider failed; propagated as a creation error
    #[error("short-link provider error: {0}")]
    ShortLink(String),

    /// Caller does not own the entity and has no admin override
    #[error("Unauthorized")]
    Unauthorized,
}

impl ReferralError {
    /// Shorthand for a [`ReferralError::NotFound`] with a displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Enum-keyed business-rule violations.
///
/// Each variant carries the offending rule's context; the rendered message
/// names the rule and, where applicable, the current state value verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Program is not in `Active` status, or its start date lies in the future
    #[error("Referral program '{name}' is not active or has not started")]
    ProgramNotActiveOrNotStarted { name: String },

    /// Program end date has passed (fallback guard ahead of the expiry sweep)
    #[error("Referral program '{name}' expired on '{date}'")]
    ProgramExpiredOn { name: String, date: NaiveDate },

    /// Global completion balance is exhausted
    #[error("Referral program '{name}' has reached its completion limit")]
    CompletionLimitReached { name: String },

    /// Caller's country is outside the program's country set
    #[error("Referral program '{name}' is not available in your country")]
    NotAvailableInCountry { name: String },

    /// Program forbids a second active link per referrer
    #[error("Multiple active referral links are not allowed for program '{name}'")]
    MultipleLinksNotAllowed { name: String },

    /// Link name is taken for this user and program
    #[error("A referral link with the name '{name}' already exists for the current user")]
    LinkNameExists { name: String },

    /// Program name is taken
    #[error("Program with the specified name '{name}' already exists")]
    ProgramNameExists { name: String },

    /// Link is in a state that cannot be cancelled
    #[error("Referral link cannot be cancelled (current status '{status}'). Required state 'Active'")]
    LinkNotCancellable { status: LinkStatus },

    /// Referee and referrer are the same user
    #[error("You cannot claim your own referral link")]
    SelfReferral,

    /// Referee has not completed onboarding
    #[error("You must complete your profile before claiming a referral link")]
    ProfileIncomplete,

    /// Referee already holds a pending claim for this program
    #[error("You have already claimed a link for program '{program}' and it is still pending")]
    ClaimStillPending { program: String },

    /// Referee already completed this program
    #[error("You have already completed program '{program}' and cannot claim again")]
    ProgramAlreadyCompleted { program: String },

    /// Referee's earlier claim for this program expired; one claim per program
    #[error("Your claim for program '{program}' expired on '{date}' and cannot be claimed again")]
    PreviousClaimExpired { program: String, date: NaiveDate },

    /// Program is not claimable; reports the current status verbatim
    #[error("Program '{name}' status is '{status}'")]
    ProgramNotClaimable { name: String, status: ProgramStatus },

    /// Program has not started yet (claim-time guard)
    #[error("Program '{name}' only starts on '{date}'")]
    ProgramStartsOn { name: String, date: NaiveDate },

    /// Link is not claimable; reports the current status verbatim
    #[error("Referral link '{name}' status is '{status}'")]
    LinkNotClaimable { name: String, status: LinkStatus },

    /// Requested program status transition is not an allowed pair
    #[error("invalid program status transition from '{from}' to '{to}'")]
    InvalidProgramTransition {
        from: ProgramStatus,
        to: ProgramStatus,
    },

    /// Usage is not in `Pending` status and cannot be completed
    #[error("Referral link usage cannot be completed (current status '{status}')")]
    UsageNotPending { status: UsageStatus },

    /// Default program must be worldwide-accessible
    #[error("Default program '{name}' must be available world-wide")]
    DefaultProgramNotWorldwide { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Messages are the stable contract callers match by substring; pin the
    /// load-bearing fragments for each rule.
    #[test]
    fn validation_messages_carry_rule_fragments() {
        let cases: &[(ValidationFailure, &str)] = &[
            (
                ValidationFailure::ProgramNotActiveOrNotStarted {
                    name: "Spring Drive".into(),
                },
                "not active or has not started",
            ),
            (
                ValidationFailure::CompletionLimitReached {
                    name: "Spring Drive".into(),
                },
                "completion limit",
            ),
            (
                ValidationFailure::NotAvailableInCountry {
                    name: "Spring Drive".into(),
                },
                "not available in your country",
            ),
            (
                ValidationFailure::MultipleLinksNotAllowed {
                    name: "Spring Drive".into(),
                },
                "Multiple active referral links are not allowed",
            ),
            (
                ValidationFailure::LinkNameExists {
                    name: "My Link".into(),
                },
                "already exists",
            ),
            (ValidationFailure::SelfReferral, "cannot claim your own referral link"),
            (
                ValidationFailure::ProfileIncomplete,
                "must complete your profile",
            ),
            (
                ValidationFailure::ClaimStillPending {
                    program: "Spring Drive".into(),
                },
                "still pending",
            ),
            (
                ValidationFailure::ProgramAlreadyCompleted {
                    program: "Spring Drive".into(),
                },
                "already completed",
            ),
        ];

        for (failure, fragment) in cases {
            let rendered = failure.to_string();
            assert!(
                rendered.contains(fragment),
                "message '{rendered}' should contain '{fragment}'"
            );
        }
    }

    #[test]
    fn status_values_are_reported_verbatim() {
        let failure = ValidationFailure::ProgramNotClaimable {
            name: "Spring Drive".into(),
            status: ProgramStatus::Inactive,
        };
        assert_eq!(
            failure.to_string(),
            "Program 'Spring Drive' status is 'Inactive'"
        );

        let failure = ValidationFailure::LinkNotClaimable {
            name: "My Link".into(),
            status: LinkStatus::Cancelled,
        };
        assert_eq!(
            failure.to_string(),
            "Referral link 'My Link' status is 'Cancelled'"
        );
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = ReferralError::not_found("Referral link", "1234");
        assert_eq!(
            err.to_string(),
            "Referral link with id '1234' does not exist"
        );
    }
}

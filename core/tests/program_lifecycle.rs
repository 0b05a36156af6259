//! Program lifecycle: creation, status transitions, cascades, and the
//! default-program designation.

mod common;

use common::{assert_err_contains, fixture};
use laurel_core::{
    Caller, LinkStatus, ProgramStatus, ReferralError, UsageStatus, ValidationFailure,
};

#[test]
fn programs_start_inactive_unless_pre_activated() {
    let fx = fixture();

    let mut request = fx.program_request("Draft");
    request.pre_activated = false;
    let program = fx.create_program(request);
    assert_eq!(program.status, ProgramStatus::Inactive);

    let program = fx.create_active_program("Live");
    assert_eq!(program.status, ProgramStatus::Active);
    assert_eq!(program.completion_total, 0);
    assert!(!program.is_default);
}

#[test]
fn duplicate_program_name_is_rejected() {
    let fx = fixture();
    fx.create_active_program("Spring Drive");

    let result = fx
        .engine
        .programs
        .create(Caller::admin(fx.admin), fx.program_request("Spring Drive"));
    assert_err_contains(result, "already exists");
}

#[test]
fn invalid_transitions_fail_naming_the_pair() {
    let fx = fixture();
    let mut request = fx.program_request("Draft");
    request.pre_activated = false;
    let program = fx.create_program(request);

    let result = fx.engine.programs.update_status(
        Caller::admin(fx.admin),
        program.id,
        ProgramStatus::Expired,
    );
    match result {
        Err(ReferralError::Validation(ValidationFailure::InvalidProgramTransition {
            from,
            to,
        })) => {
            assert_eq!(from, ProgramStatus::Inactive);
            assert_eq!(to, ProgramStatus::Expired);
        }
        other => panic!("expected InvalidProgramTransition, got {other:?}"),
    }

    // The message names both states of the rejected pair.
    let result = fx.engine.programs.update_status(
        Caller::admin(fx.admin),
        program.id,
        ProgramStatus::LimitReached,
    );
    assert_err_contains(result, "'Inactive' to 'LimitReached'");
}

#[test]
fn pause_and_reactivate_round_trip() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");

    let paused = fx
        .engine
        .programs
        .update_status(Caller::admin(fx.admin), program.id, ProgramStatus::Inactive)
        .expect("pause should be allowed");
    assert_eq!(paused.status, ProgramStatus::Inactive);

    let reactivated = fx
        .engine
        .programs
        .update_status(Caller::admin(fx.admin), program.id, ProgramStatus::Active)
        .expect("reactivation should be allowed");
    assert_eq!(reactivated.status, ProgramStatus::Active);
}

#[test]
fn deletion_cancels_active_links_and_is_terminal() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");
    let link = fx.create_link(fx.referrer, program.id, "My Link");

    let deleted = fx
        .engine
        .programs
        .update_status(Caller::admin(fx.admin), program.id, ProgramStatus::Deleted)
        .expect("deletion should be allowed");
    assert_eq!(deleted.status, ProgramStatus::Deleted);

    let link = fx.engine.links.get_by_id(link.id).expect("link should remain stored");
    assert_eq!(link.status, LinkStatus::Cancelled);

    // Terminal: nothing leaves Deleted.
    for next in [
        ProgramStatus::Active,
        ProgramStatus::Inactive,
        ProgramStatus::Expired,
    ] {
        let result = fx
            .engine
            .programs
            .update_status(Caller::admin(fx.admin), program.id, next);
        assert!(result.is_err(), "Deleted -> {next} should be rejected");
    }
}

#[test]
fn expiry_cascades_to_links_and_pending_usages() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");
    let link = fx.create_link(fx.referrer, program.id, "My Link");
    let usage = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), link.id)
        .expect("claim should succeed");

    fx.engine
        .programs
        .update_status(Caller::admin(fx.admin), program.id, ProgramStatus::Expired)
        .expect("expiry should be allowed");

    let link = fx.engine.links.get_by_id(link.id).expect("link should exist");
    assert_eq!(link.status, LinkStatus::Expired);

    let usage = fx.engine.usages.get_by_id(usage.id).expect("usage should exist");
    assert_eq!(usage.status, UsageStatus::Expired);
    assert!(usage.date_expired.is_some());
}

#[test]
fn completed_usages_survive_program_expiry() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");
    let link = fx.create_link(fx.referrer, program.id, "My Link");
    let usage = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), link.id)
        .expect("claim should succeed");
    fx.engine
        .usages
        .process_completion(usage.id)
        .expect("completion should succeed");

    fx.engine
        .programs
        .update_status(Caller::admin(fx.admin), program.id, ProgramStatus::Expired)
        .expect("expiry should be allowed");

    let usage = fx.engine.usages.get_by_id(usage.id).expect("usage should exist");
    assert_eq!(usage.status, UsageStatus::Completed, "completed records are immutable");
}

#[test]
fn set_as_default_requires_worldwide_countries() {
    let fx = fixture();

    let mut request = fx.program_request("South Africa Only");
    request.countries = vec![fx.home_country_id];
    let regional = fx.create_program(request);

    let result = fx
        .engine
        .programs
        .set_as_default(Caller::admin(fx.admin), regional.id);
    assert_err_contains(result, "world-wide");

    // Implicit worldwide (no countries) qualifies.
    let worldwide = fx.create_active_program("Everywhere");
    let updated = fx
        .engine
        .programs
        .set_as_default(Caller::admin(fx.admin), worldwide.id)
        .expect("set_as_default should succeed");
    assert!(updated.is_default);

    // Explicit worldwide marker qualifies too.
    let mut request = fx.program_request("Explicitly Everywhere");
    request.countries = vec![fx.home_country_id, fx.worldwide_id];
    let explicit = fx.create_program(request);
    fx.engine
        .programs
        .set_as_default(Caller::admin(fx.admin), explicit.id)
        .expect("set_as_default should succeed");
}

#[test]
fn default_designation_is_exclusive() {
    let fx = fixture();
    let first = fx.create_active_program("First");
    let second = fx.create_active_program("Second");

    fx.engine
        .programs
        .set_as_default(Caller::admin(fx.admin), first.id)
        .expect("ok");
    fx.engine
        .programs
        .set_as_default(Caller::admin(fx.admin), second.id)
        .expect("ok");

    let default = fx
        .engine
        .programs
        .get_default()
        .expect("no inconsistency")
        .expect("a default exists");
    assert_eq!(default.id, second.id);

    let first = fx.engine.programs.get_by_id(first.id).expect("exists");
    assert!(!first.is_default, "prior default must be cleared");
}

#[test]
fn create_can_designate_the_default_directly() {
    let fx = fixture();
    let mut request = fx.program_request("Default From Birth");
    request.is_default = true;
    let program = fx.create_program(request);
    assert!(program.is_default);

    // A non-worldwide default is rejected at creation.
    let mut request = fx.program_request("Regional Default");
    request.is_default = true;
    request.countries = vec![fx.home_country_id];
    let result = fx.engine.programs.create(Caller::admin(fx.admin), request);
    assert_err_contains(result, "world-wide");
}

#[test]
fn update_status_on_unknown_program_is_not_found() {
    let fx = fixture();
    let result = fx.engine.programs.update_status(
        Caller::admin(fx.admin),
        uuid::Uuid::new_v4(),
        ProgramStatus::Active,
    );
    assert!(matches!(result, Err(ReferralError::NotFound { .. })));
}

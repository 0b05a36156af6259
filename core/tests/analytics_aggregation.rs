//! Read-only analytics aggregation over links and usages

mod common;

use common::fixture;
use laurel_core::{Caller, ParticipationRole};

#[test]
fn referrer_aggregates_cover_links_and_usages() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");
    let link = fx.create_link(fx.referrer, program.id, "First");
    let second_link = fx.create_link(fx.referrer, program.id, "Second");

    // One completed, one pending, one expired usage against the first link.
    let completed = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), link.id)
        .expect("claim");
    fx.engine.usages.process_completion(completed.id).expect("complete");

    let pending_user = fx.add_user("pending-referee");
    fx.engine
        .usages
        .claim_as_referee(Caller::user(pending_user), link.id)
        .expect("claim");

    let expired_user = fx.add_user("expired-referee");
    let expired = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(expired_user), second_link.id)
        .expect("claim");
    fx.engine.usages.process_expiration(expired.id).expect("expire");

    // Cancel the second link so the active count differs from the total.
    fx.engine
        .links
        .cancel(Caller::user(fx.referrer), second_link.id)
        .expect("cancel");

    let report = fx
        .engine
        .analytics
        .by_user(fx.referrer, ParticipationRole::Referrer)
        .expect("report");

    assert_eq!(report.user_display_name, "Ruth Referrer");
    assert_eq!(report.link_count, 2);
    assert_eq!(report.link_count_active, 1);
    assert_eq!(report.usage_count_completed, 1);
    assert_eq!(report.usage_count_pending, 1);
    assert_eq!(report.usage_count_expired, 1);
    assert_eq!(report.zlto_reward_total, 50, "referrer share of one completion");
}

#[test]
fn referee_aggregates_count_own_usages() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");
    let other_program = fx.create_active_program("Autumn Drive");
    let link = fx.create_link(fx.referrer, program.id, "First");
    let other_link = fx.create_link(fx.referrer, other_program.id, "Second");

    let completed = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), link.id)
        .expect("claim");
    fx.engine.usages.process_completion(completed.id).expect("complete");

    // A second program may be claimed; dedup is per program.
    fx.engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), other_link.id)
        .expect("claim");

    let report = fx
        .engine
        .analytics
        .by_user(fx.referee, ParticipationRole::Referee)
        .expect("report");

    assert_eq!(report.usage_count_completed, 1);
    assert_eq!(report.usage_count_pending, 1);
    assert_eq!(report.usage_count_expired, 0);
    assert_eq!(report.zlto_reward_total, 25, "referee share of one completion");
    assert_eq!(report.link_count, 0, "link columns are referrer-side only");
}

#[test]
fn user_with_no_activity_reports_zeroes() {
    let fx = fixture();
    let report = fx
        .engine
        .analytics
        .by_user(fx.referee, ParticipationRole::Referee)
        .expect("report");
    assert_eq!(report.usage_count_completed, 0);
    assert_eq!(report.zlto_reward_total, 0);
}

#[test]
fn leaderboard_orders_by_completions_then_name() {
    let fx = fixture();
    let program = fx.create_active_program("Spring Drive");

    let busy = fx.add_user("busy-referrer");
    let busy_link = fx.create_link(busy, program.id, "Busy Link");
    let quiet_link = fx.create_link(fx.referrer, program.id, "Quiet Link");

    // Two completions for the busy referrer, one for the quiet one.
    for username in ["a-referee", "b-referee"] {
        let referee = fx.add_user(username);
        let usage = fx
            .engine
            .usages
            .claim_as_referee(Caller::user(referee), busy_link.id)
            .expect("claim");
        fx.engine.usages.process_completion(usage.id).expect("complete");
    }
    let usage = fx
        .engine
        .usages
        .claim_as_referee(Caller::user(fx.referee), quiet_link.id)
        .expect("claim");
    fx.engine.usages.process_completion(usage.id).expect("complete");

    let board = fx.engine.analytics.leaderboard(ParticipationRole::Referrer, 10);
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, busy);
    assert_eq!(board[0].usage_count_completed, 2);
    assert_eq!(board[1].user_id, fx.referrer);
    assert_eq!(board[1].usage_count_completed, 1);

    // The limit truncates.
    let board = fx.engine.analytics.leaderboard(ParticipationRole::Referrer, 1);
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].user_id, busy);
}

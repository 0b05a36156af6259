//! Shared fixtures for the engine test suites
//!
//! Builds an engine against a pinned clock, a recording notification sink,
//! and a seeded user directory / country table, so scenarios can reason
//! about dates and delivered events deterministically.

#![allow(dead_code)] // each suite uses the subset of helpers it needs

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use laurel_core::collaborators::{
    BlockReason, CountryLookup, CountryRecord, FixedClock, RecordingSink, StaticBlockReasons,
    StaticCountries, StaticDirectory, UserProfile, WORLDWIDE_CODE_ALPHA2,
};
use laurel_core::{
    Caller, Engine, Link, LinkRequest, Program, ProgramRequest,
};
use uuid::Uuid;

/// The pinned "now" every suite starts from.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().expect("valid timestamp")
}

pub struct Fixture {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
    pub sink: Arc<RecordingSink>,
    pub directory: Arc<StaticDirectory>,
    pub countries: Arc<StaticCountries>,
    /// Administrator acting on programs and blocks
    pub admin: Uuid,
    /// A referrer with a country on file
    pub referrer: Uuid,
    /// An onboarded referee with a country on file
    pub referee: Uuid,
    pub worldwide_id: Uuid,
    /// The referrer/referee's home country ("ZA")
    pub home_country_id: Uuid,
    /// A country none of the seeded users live in ("BR")
    pub elsewhere_country_id: Uuid,
    pub block_reason_id: Uuid,
}

pub fn fixture() -> Fixture {
    let admin = Uuid::new_v4();
    let referrer = Uuid::new_v4();
    let referee = Uuid::new_v4();

    let countries = Arc::new(StaticCountries::with_worldwide());
    let worldwide_id = countries
        .by_code_alpha2(WORLDWIDE_CODE_ALPHA2)
        .expect("worldwide seeded")
        .id;
    let home_country_id = Uuid::new_v4();
    countries.insert(CountryRecord {
        id: home_country_id,
        code_alpha2: "ZA".into(),
        name: "South Africa".into(),
    });
    let elsewhere_country_id = Uuid::new_v4();
    countries.insert(CountryRecord {
        id: elsewhere_country_id,
        code_alpha2: "BR".into(),
        name: "Brazil".into(),
    });

    let directory = Arc::new(StaticDirectory::new([
        UserProfile {
            id: admin,
            username: "admin".into(),
            display_name: Some("Admin".into()),
            country_id: None,
            onboarded: true,
        },
        UserProfile {
            id: referrer,
            username: "referrer".into(),
            display_name: Some("Ruth Referrer".into()),
            country_id: Some(home_country_id),
            onboarded: true,
        },
        UserProfile {
            id: referee,
            username: "referee".into(),
            display_name: Some("Rex Referee".into()),
            country_id: Some(home_country_id),
            onboarded: true,
        },
    ]));

    let block_reason_id = Uuid::new_v4();
    let reasons = Arc::new(StaticBlockReasons::new([BlockReason {
        id: block_reason_id,
        name: "Abuse".into(),
        description: Some("Fraudulent referral activity".into()),
    }]));

    let clock = Arc::new(FixedClock::new(now()));
    let sink = Arc::new(RecordingSink::default());

    let engine = Engine::builder()
        .directory(Arc::clone(&directory) as _)
        .countries(Arc::clone(&countries) as _)
        .block_reasons(reasons as _)
        .clock(Arc::clone(&clock) as _)
        .notifier(Arc::clone(&sink) as _)
        .build();

    Fixture {
        engine,
        clock,
        sink,
        directory,
        countries,
        admin,
        referrer,
        referee,
        worldwide_id,
        home_country_id,
        elsewhere_country_id,
        block_reason_id,
    }
}

impl Fixture {
    /// A request for a worldwide program that went live 7 days ago, with
    /// rewards configured and no caps.
    pub fn program_request(&self, name: &str) -> ProgramRequest {
        ProgramRequest {
            name: name.into(),
            description: "Bring a friend".into(),
            image_url: None,
            completion_window_days: Some(30),
            completion_limit_referee: None,
            completion_limit: None,
            zlto_reward_referrer: Some(50),
            zlto_reward_referee: Some(25),
            zlto_reward_pool: None,
            proof_of_personhood_required: false,
            pathway_required: false,
            multiple_links_allowed: true,
            pre_activated: true,
            is_default: false,
            date_start: now() - Duration::days(7),
            date_end: None,
            countries: Vec::new(),
        }
    }

    pub fn create_program(&self, request: ProgramRequest) -> Program {
        self.engine
            .programs
            .create(Caller::admin(self.admin), request)
            .expect("program creation should succeed")
    }

    pub fn create_active_program(&self, name: &str) -> Program {
        self.create_program(self.program_request(name))
    }

    pub fn create_link(&self, user_id: Uuid, program_id: Uuid, name: &str) -> Link {
        self.engine
            .links
            .create(
                Caller::user(user_id),
                LinkRequest {
                    program_id,
                    name: name.into(),
                    description: None,
                },
            )
            .expect("link creation should succeed")
    }

    /// Registers another onboarded user living in the home country.
    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.upsert(UserProfile {
            id,
            username: username.into(),
            display_name: None,
            country_id: Some(self.home_country_id),
            onboarded: true,
        });
        id
    }

    /// Registers a user who has not completed onboarding.
    pub fn add_unonboarded_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.upsert(UserProfile {
            id,
            username: username.into(),
            display_name: None,
            country_id: Some(self.home_country_id),
            onboarded: false,
        });
        id
    }

    /// Directly sets a program's completion counter, as test arrangement.
    pub fn force_program_total(&self, program_id: Uuid, total: u32) {
        let mut txn = self.engine.store.begin();
        let program = txn
            .programs
            .get_mut(&program_id)
            .expect("program should exist");
        program.completion_total = total;
    }

    /// Directly sets a link's completion counter, as test arrangement.
    pub fn force_link_total(&self, link_id: Uuid, total: u32) {
        let mut txn = self.engine.store.begin();
        let link = txn.links.get_mut(&link_id).expect("link should exist");
        link.completion_total = total;
    }
}

/// Asserts that `result` failed with a message containing `fragment`.
pub fn assert_err_contains<T: std::fmt::Debug>(
    result: laurel_core::Result<T>,
    fragment: &str,
) {
    match result {
        Ok(value) => panic!("expected error containing '{fragment}', got Ok({value:?})"),
        Err(err) => {
            let rendered = err.to_string();
            assert!(
                rendered.contains(fragment),
                "error '{rendered}' should contain '{fragment}'"
            );
        }
    }
}

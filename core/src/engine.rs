//! Engine assembly
//!
//! Wires the services against one shared store and a set of collaborators.
//! The builder defaults every collaborator to its in-process reference
//! implementation, so `Engine::builder().build()` yields a working engine
//! for tests and tooling.

use std::sync::Arc;

use url::Url;

use crate::collaborators::{
    BlockReasonLookup, Clock, CounterShortLinks, CountryLookup, NotificationSink,
    ShortLinkProvider, StaticBlockReasons, StaticCountries, StaticDirectory, SystemClock,
    TracingSink, UserDirectory,
};
use crate::services::{
    AnalyticsService, BlockService, LinkService, LinkUsageService, ProgramService,
};
use crate::store::MemoryStore;

const DEFAULT_BASE_URL: &str = "https://app.example.org/";
const DEFAULT_SHORT_BASE_URL: &str = "https://go.example.org/";

/// All services, wired and shared.
pub struct Engine {
    pub store: Arc<MemoryStore>,
    pub programs: Arc<ProgramService>,
    pub links: Arc<LinkService>,
    pub usages: Arc<LinkUsageService>,
    pub blocks: Arc<BlockService>,
    pub analytics: Arc<AnalyticsService>,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Collaborator-by-collaborator engine construction; unset collaborators
/// fall back to the in-process reference implementations.
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<MemoryStore>>,
    directory: Option<Arc<dyn UserDirectory>>,
    countries: Option<Arc<dyn CountryLookup>>,
    reasons: Option<Arc<dyn BlockReasonLookup>>,
    shortener: Option<Arc<dyn ShortLinkProvider>>,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    base_url: Option<Url>,
}

impl EngineBuilder {
    #[must_use]
    pub fn store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    #[must_use]
    pub fn countries(mut self, countries: Arc<dyn CountryLookup>) -> Self {
        self.countries = Some(countries);
        self
    }

    #[must_use]
    pub fn block_reasons(mut self, reasons: Arc<dyn BlockReasonLookup>) -> Self {
        self.reasons = Some(reasons);
        self
    }

    #[must_use]
    pub fn shortener(mut self, shortener: Arc<dyn ShortLinkProvider>) -> Self {
        self.shortener = Some(shortener);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        let store = self.store.unwrap_or_default();
        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(StaticDirectory::default()));
        let countries = self
            .countries
            .unwrap_or_else(|| Arc::new(StaticCountries::with_worldwide()));
        let reasons = self
            .reasons
            .unwrap_or_else(|| Arc::new(StaticBlockReasons::default()));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier: Arc<dyn NotificationSink> =
            self.notifier.unwrap_or_else(|| Arc::new(TracingSink));
        let base_url = self
            .base_url
            .unwrap_or_else(|| parse_static_url(DEFAULT_BASE_URL));
        let shortener = self.shortener.unwrap_or_else(|| {
            Arc::new(CounterShortLinks::new(parse_static_url(
                DEFAULT_SHORT_BASE_URL,
            )))
        });

        let programs = Arc::new(ProgramService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&countries),
            Arc::clone(&clock),
            Arc::clone(&notifier),
        ));
        let links = Arc::new(LinkService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&countries),
            shortener,
            Arc::clone(&clock),
            Arc::clone(&notifier),
            base_url,
        ));
        let usages = Arc::new(LinkUsageService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&clock),
            Arc::clone(&notifier),
            Arc::clone(&programs),
            Arc::clone(&links),
        ));
        let blocks = Arc::new(BlockService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            reasons,
            Arc::clone(&clock),
            Arc::clone(&notifier),
        ));
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
        ));

        Engine {
            store,
            programs,
            links,
            usages,
            blocks,
            analytics,
        }
    }
}

fn parse_static_url(value: &str) -> Url {
    // Only called with compile-time constants that are valid absolute URLs.
    value.parse().unwrap_or_else(|e| {
        unreachable!("static URL '{value}' must parse: {e}");
    })
}

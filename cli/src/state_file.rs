//! JSON-file-backed state for the CLI
//!
//! The CLI operates an in-process engine: it loads a snapshot (store plus
//! directory/lookup seeds), runs one command against it, and saves the
//! snapshot back. A missing file yields a freshly seeded state.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use laurel_core::collaborators::{
    BlockReason, CounterShortLinks, CountryRecord, StaticBlockReasons, StaticCountries,
    StaticDirectory, UserProfile, WORLDWIDE_CODE_ALPHA2,
};
use laurel_core::{Engine, MemoryStore, StoreState};

use crate::config::CliConfig;

/// Everything the CLI persists between invocations.
#[derive(Debug, Serialize, Deserialize)]
pub struct CliState {
    pub store: StoreState,
    pub users: Vec<UserProfile>,
    pub countries: Vec<CountryRecord>,
    pub block_reasons: Vec<BlockReason>,
}

impl CliState {
    /// A fresh state seeded with the worldwide country and a default block
    /// reason.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            store: StoreState::default(),
            users: Vec::new(),
            countries: vec![CountryRecord {
                id: Uuid::new_v4(),
                code_alpha2: WORLDWIDE_CODE_ALPHA2.to_string(),
                name: "Worldwide".to_string(),
            }],
            block_reasons: vec![BlockReason {
                id: Uuid::new_v4(),
                name: "Other".to_string(),
                description: None,
            }],
        }
    }
}

/// Loads the snapshot, or seeds a fresh one when the file does not exist.
pub fn load(path: &Path) -> Result<CliState> {
    if !path.exists() {
        return Ok(CliState::seeded());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read state file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("state file '{}' is not valid", path.display()))
}

pub fn save(path: &Path, state: &CliState) -> Result<()> {
    let raw = serde_json::to_string_pretty(state).context("cannot serialize state")?;
    fs::write(path, raw)
        .with_context(|| format!("cannot write state file '{}'", path.display()))
}

/// The engine plus the seed collaborators the commands mutate directly.
pub struct CliEngine {
    pub engine: Engine,
    pub directory: Arc<StaticDirectory>,
    pub countries: Arc<StaticCountries>,
    pub block_reasons: Arc<StaticBlockReasons>,
}

impl CliEngine {
    /// Re-snapshots the engine and seeds into a persistable state.
    #[must_use]
    pub fn snapshot(&self) -> CliState {
        CliState {
            store: self.engine.store.snapshot(),
            users: self.directory.profiles(),
            countries: self.countries.records(),
            block_reasons: self.block_reasons.records(),
        }
    }
}

/// Wires an engine over the loaded state.
pub fn build_engine(state: CliState, config: &CliConfig) -> Result<CliEngine> {
    let base_url: Url = config
        .base_url
        .parse()
        .with_context(|| format!("invalid base URL '{}'", config.base_url))?;
    let short_base_url: Url = config
        .short_base_url
        .parse()
        .with_context(|| format!("invalid short base URL '{}'", config.short_base_url))?;

    let directory = Arc::new(StaticDirectory::new(state.users));
    let countries = Arc::new(StaticCountries::new(state.countries));
    let block_reasons = Arc::new(StaticBlockReasons::new(state.block_reasons));

    let engine = Engine::builder()
        .store(Arc::new(MemoryStore::from_state(state.store)))
        .directory(Arc::clone(&directory) as _)
        .countries(Arc::clone(&countries) as _)
        .block_reasons(Arc::clone(&block_reasons) as _)
        .shortener(Arc::new(CounterShortLinks::new(short_base_url)))
        .base_url(base_url)
        .build();

    Ok(CliEngine {
        engine,
        directory,
        countries,
        block_reasons,
    })
}

//! Configuration management for the Laurel CLI
//!
//! Centralizes the values that would otherwise be hardcoded, making them
//! configurable via environment variables with sensible defaults.

use std::env;

/// Centralized configuration for the Laurel CLI
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path of the JSON state snapshot the CLI loads and saves
    pub state_path: String,

    /// Application base URL canonical claim URLs hang off
    pub base_url: String,

    /// Base URL of the in-process short-link provider
    pub short_base_url: String,

    /// Default output format for CLI commands
    pub default_output_format: String,
}

impl CliConfig {
    /// Create a new configuration instance with values from environment
    /// variables or sensible defaults if not set
    #[must_use]
    pub fn new() -> Self {
        Self {
            state_path: env::var("LAUREL_STATE_PATH")
                .unwrap_or_else(|_| "laurel-state.json".to_string()),

            base_url: env::var("LAUREL_BASE_URL")
                .unwrap_or_else(|_| "https://app.example.org/".to_string()),

            short_base_url: env::var("LAUREL_SHORT_BASE_URL")
                .unwrap_or_else(|_| "https://go.example.org/".to_string()),

            default_output_format: env::var("LAUREL_DEFAULT_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "human".to_string()),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

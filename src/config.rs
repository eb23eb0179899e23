//! Explicit run configuration.
//!
//! Everything the pipeline needs is resolved once at startup and passed
//! down; no stage performs ambient environment lookups of its own.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

/// Environment variable carrying the narrative API credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Default chat-completions endpoint base.
pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model requested for narrative generation.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Resolved configuration for one report run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input spreadsheet (CSV with a header row).
    pub input_path: PathBuf,
    /// Logo image file, or a directory scanned for the first image.
    pub logo_path: PathBuf,
    /// Pre-authored boilerplate template consumed by the composer.
    pub template_path: PathBuf,
    /// Output DOCX path.
    pub output_path: PathBuf,
    /// Narrative API endpoint base (joined with `/chat/completions`).
    pub api_base_url: String,
    /// Model identifier sent with the narrative request.
    pub api_model: String,
    /// Bearer credential; `None` disables the remote call entirely.
    pub api_key: Option<String>,
    /// Bound on the single outbound narrative call.
    pub api_timeout: Duration,
}

impl Config {
    /// Build a configuration from resolved paths plus the environment.
    ///
    /// Loads an optional `.env` file first, then reads the API key from
    /// the process environment. An absent or empty key leaves the
    /// narrative stage in fallback mode; it never fails the run.
    pub fn resolve(
        input_path: PathBuf,
        logo_path: PathBuf,
        template_path: PathBuf,
        output_path: PathBuf,
    ) -> Config {
        // Missing .env is the normal case, not an error.
        let _ = dotenvy::dotenv();

        let api_key = env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            debug!("{} not set; narrative generation will use the fallback text", API_KEY_ENV);
        }

        Config {
            input_path,
            logo_path,
            template_path,
            output_path,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_model: DEFAULT_MODEL.to_string(),
            api_key,
            api_timeout: Duration::from_secs(30),
        }
    }
}

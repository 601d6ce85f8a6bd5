//! Environment-driven settings shared by the scheduler, ingestor and worker
//! binaries, loaded exactly once per process.
//!
//! Each binary still defines its own `clap::Parser` for flags that are unique
//! to it (see the `cmd/*` crates); this module covers the union of
//! environment variables in common across components, loaded idempotently
//! the same way the original implementation loaded its settings once at
//! startup and handed out a shared reference afterwards.

use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidVar(&'static str, String),
}

/// Settings common to every component that talks to the broker and/or the
/// scheduler RPC endpoint.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub nats_url: String,
    pub scheduler_url: String,
    pub reply_timeout: Duration,
    pub keep_warm: Duration,
    pub deprovision_after: Duration,
}

static CORE: OnceLock<CoreSettings> = OnceLock::new();

fn env_var(name: &'static str, default: Option<&str>) -> Result<String, SettingsError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => default
            .map(str::to_owned)
            .ok_or(SettingsError::MissingVar(name)),
    }
}

fn env_secs(name: &'static str, default_secs: u64) -> Result<Duration, SettingsError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| SettingsError::InvalidVar(name, e.to_string())),
        _ => Ok(Duration::from_secs(default_secs)),
    }
}

impl CoreSettings {
    fn load() -> Result<Self, SettingsError> {
        Ok(Self {
            nats_url: env_var("NATS_URL", Some("nats://127.0.0.1:4222"))?,
            scheduler_url: env_var("OPERATOR_URL", Some("http://127.0.0.1:50051"))?,
            reply_timeout: {
                let ms = match std::env::var("REPLY_TIMEOUT") {
                    Ok(v) if !v.is_empty() => v
                        .parse::<u64>()
                        .map_err(|e| SettingsError::InvalidVar("REPLY_TIMEOUT", e.to_string()))?,
                    _ => 500,
                };
                Duration::from_millis(ms)
            },
            keep_warm: env_secs("KEEP_WARM_DURATION", 300)?,
            deprovision_after: env_secs("DEPROVISION_DURATION", 900)?,
        })
    }

    /// Returns the process-wide settings, parsing the environment the first
    /// time this is called and reusing the result afterwards.
    pub fn get() -> &'static CoreSettings {
        CORE.get_or_init(|| Self::load().expect("invalid environment configuration"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_timeout_defaults_to_500ms() {
        // only valid to assert defaults when the var is unset; best-effort check
        if std::env::var("REPLY_TIMEOUT").is_err() {
            let settings = CoreSettings::load().unwrap();
            assert_eq!(settings.reply_timeout, Duration::from_millis(500));
        }
    }
}

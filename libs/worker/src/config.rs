//! Startup settings for a Runtime Worker process, loaded once from the
//! environment and failed fast on anything required but missing, mirroring
//! `litefunctions_common::settings::CoreSettings`'s load-once discipline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// One worker process's identity and connection settings. `name` is present
/// for a per-function (compiled-language) deployment and absent for a shared
/// dynamic-language worker, which instead infers the function name from each
/// exec subject it receives.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub project: String,
    pub name: Option<String>,
    pub language: String,
    pub nats_url: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub http_port: Option<u16>,
}

impl WorkerConfig {
    /// Loads settings for a per-function worker: PROJECT, NAME, LANGUAGE and
    /// NATS_URL are required; DATABASE_URL, REDIS_URL and HTTP_PORT are not.
    pub fn from_env_per_function() -> Result<Self, ConfigError> {
        Ok(Self {
            project: required("PROJECT")?,
            name: Some(required("NAME")?),
            language: required("LANGUAGE")?,
            nats_url: required("NATS_URL")?,
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            http_port: optional("HTTP_PORT").and_then(|p| p.parse().ok()),
        })
    }

    /// Loads settings for a shared dynamic-language worker: NAME is never
    /// read, since the function is inferred per message.
    pub fn from_env_shared() -> Result<Self, ConfigError> {
        Ok(Self {
            project: required("PROJECT")?,
            name: None,
            language: required("LANGUAGE")?,
            nats_url: required("NATS_URL")?,
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            http_port: optional("HTTP_PORT").and_then(|p| p.parse().ok()),
        })
    }

    pub fn is_shared(&self) -> bool {
        self.name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // env::set_var mutates process-global state; serialize the two tests
    // that touch it so they don't race under cargo's parallel test runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_required_var_fails_fast() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("PROJECT");
        let err = WorkerConfig::from_env_per_function().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("PROJECT")));
    }

    #[test]
    fn shared_worker_does_not_require_name() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PROJECT", "alpha");
        std::env::set_var("LANGUAGE", "python");
        std::env::set_var("NATS_URL", "nats://127.0.0.1:4222");
        let cfg = WorkerConfig::from_env_shared().unwrap();
        assert!(cfg.is_shared());
        std::env::remove_var("PROJECT");
        std::env::remove_var("LANGUAGE");
        std::env::remove_var("NATS_URL");
    }
}

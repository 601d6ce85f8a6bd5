//! Provisioner-wide settings loaded once from the environment, mirroring the
//! original `operator/internal/controller/settings.go` `Settings` struct and
//! its `sync.Once`-guarded `LoadCfg`.

use std::sync::OnceLock;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Image registry, pull secret and datastore connection settings injected
/// into every deployment the provisioner creates.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub registry: String,
    pub registry_user: String,
    pub pull_secret: String,
    pub db_secret_name: String,
    pub db_secret_key: String,
    pub redis_url: String,
    pub nats_url: String,
}

static CONFIG: OnceLock<ProvisionerConfig> = OnceLock::new();

impl ProvisionerConfig {
    fn load() -> Self {
        Self {
            registry: env_or("REGISTRY", "ghcr.io"),
            registry_user: env_or("REGISTRY_USER", "litefunctions"),
            pull_secret: env_or("PULL_SECRET", "ghcr-secret"),
            db_secret_name: env_or("DB_SECRET_NAME", "litefunctions-pguser-litefunctions"),
            db_secret_key: env_or("DB_SECRET_KEY", "pgbouncer-uri"),
            redis_url: env_or("REDIS_URL", "redis://litefunctions-redis-cluster:6379"),
            nats_url: env_or("NATS_URL", "nats://litefunctions-nats:4222"),
        }
    }

    /// Returns the process-wide configuration, reading the environment the
    /// first time this is called and reusing the result afterwards.
    pub fn get() -> &'static ProvisionerConfig {
        CONFIG.get_or_init(Self::load)
    }
}

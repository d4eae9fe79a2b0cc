use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cluster_secrets::SecretsBackend;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REPOSITORY: &str = "mmortari/orastest";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
pub const DEFAULT_SWAGGER_DIR: &str = "dist";

/// Environment-driven configuration for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub pod_namespace: Option<String>,
    pub secrets_backend: SecretsBackend,
    pub registry: Option<RegistrySettings>,
    pub max_upload_bytes: usize,
    pub swagger_dir: PathBuf,
}

/// Target of `/upload-oras` pushes.
#[derive(Clone)]
pub struct RegistrySettings {
    pub host: String,
    pub repository: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub plain_http: bool,
}

impl GatewayConfig {
    /// Build a [`GatewayConfig`] from the documented process variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = var("PORT")
            .map(|raw| raw.trim().parse::<u16>())
            .transpose()
            .context("PORT must be a valid TCP port")?
            .unwrap_or(DEFAULT_PORT);

        let secrets_backend = SecretsBackend::from_env(var("SECRETS_BACKEND"))?;

        let registry = var("REGISTRY")
            .map(|host| -> Result<RegistrySettings> {
                Ok(RegistrySettings {
                    host: host.trim().trim_end_matches('/').to_string(),
                    repository: var("ORAS_REPOSITORY")
                        .map(|repo| repo.trim().trim_matches('/').to_string())
                        .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
                    username: var("USERNAME"),
                    password: var("PASSWORD"),
                    plain_http: var("REGISTRY_PLAIN_HTTP")
                        .map(|raw| parse_bool(&raw))
                        .transpose()
                        .context("REGISTRY_PLAIN_HTTP must be a boolean")?
                        .unwrap_or(false),
                })
            })
            .transpose()?;

        let max_upload_bytes = var("UPLOAD_MAX_BYTES")
            .map(|raw| raw.trim().parse::<usize>())
            .transpose()
            .context("UPLOAD_MAX_BYTES must be a byte count")?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let swagger_dir = var("SWAGGER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SWAGGER_DIR));

        Ok(Self {
            port,
            pod_namespace: var("POD_NAMESPACE"),
            secrets_backend,
            registry,
            max_upload_bytes,
            swagger_dir,
        })
    }
}

impl std::fmt::Debug for RegistrySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySettings")
            .field("host", &self.host)
            .field("repository", &self.repository)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("plain_http", &self.plain_http)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("`{other}` is not a boolean"),
    }
}

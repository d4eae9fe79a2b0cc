//! Credential lookup for the upload gateway.
//!
//! Object-storage credentials live in a cluster `Secret` whose name is chosen
//! per request. The [`SecretStore`] trait hides where the secret actually comes
//! from so the HTTP layer can be exercised against in-memory fakes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use tracing::info;

mod cluster;
mod credentials;
mod env;

pub use cluster::KubeSecretStore;
pub use credentials::{
    ACCESS_KEY_ID, BUCKET, DEFAULT_REGION, ENDPOINT, S3Credentials, SECRET_ACCESS_KEY,
};
pub use env::EnvSecretStore;

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("secret '{name}' not found in namespace '{namespace}'")]
    NotFound { name: String, namespace: String },

    #[error("secret '{name}' is missing required key {key}")]
    MissingKey { name: String, key: &'static str },

    #[error("secret backend unavailable: {reason}")]
    Backend { reason: String },
}

pub type SecretsResult<T> = Result<T, SecretsError>;

/// Source of per-request storage credentials.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn s3_credentials(&self, name: &str) -> SecretsResult<S3Credentials>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecretsBackend {
    Kube,
    Env,
}

impl SecretsBackend {
    pub fn from_env(env_value: Option<String>) -> anyhow::Result<Self> {
        match env_value {
            Some(raw) => raw.parse(),
            None => Ok(SecretsBackend::Kube),
        }
    }
}

impl FromStr for SecretsBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kube" | "k8s" | "kubernetes" | "" => Ok(SecretsBackend::Kube),
            "env" => Ok(SecretsBackend::Env),
            other => bail!("unsupported secrets backend `{other}`"),
        }
    }
}

impl fmt::Display for SecretsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsBackend::Kube => write!(f, "kube"),
            SecretsBackend::Env => write!(f, "env"),
        }
    }
}

/// Builds the requested secrets backend. `namespace` overrides the namespace
/// inferred from the cluster configuration and is ignored by the env backend.
pub async fn init(
    backend: SecretsBackend,
    namespace: Option<String>,
) -> SecretsResult<Arc<dyn SecretStore>> {
    match backend {
        SecretsBackend::Kube => {
            let store = KubeSecretStore::connect(namespace).await?;
            info!(namespace = %store.namespace(), "secrets backend=kube");
            Ok(Arc::new(store))
        }
        SecretsBackend::Env => {
            info!("secrets backend=env (environment variables)");
            Ok(Arc::new(EnvSecretStore::new()))
        }
    }
}

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client, Config};
use tracing::debug;

use crate::{S3Credentials, SecretStore, SecretsError, SecretsResult};

/// Reads credentials from `Secret` resources through the Kubernetes API.
///
/// The cluster configuration is inferred the usual way: the in-cluster service
/// account first, then the local kubeconfig.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    namespace: String,
}

impl KubeSecretStore {
    /// Connects to the cluster. When `namespace` is `None` the namespace comes
    /// from the inferred configuration (the kubeconfig context, or `default`).
    pub async fn connect(namespace: Option<String>) -> SecretsResult<Self> {
        let config = Config::infer().await.map_err(|err| SecretsError::Backend {
            reason: format!("failed to infer cluster config: {err}"),
        })?;
        let namespace = resolve_namespace(namespace, &config.default_namespace);
        let client = Client::try_from(config).map_err(|err| SecretsError::Backend {
            reason: format!("failed to build cluster client: {err}"),
        })?;
        Ok(Self::new(client, namespace))
    }

    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn s3_credentials(&self, name: &str) -> SecretsResult<S3Credentials> {
        debug!(secret = name, namespace = %self.namespace, "fetching secret");
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        let secret = api
            .get_opt(name)
            .await
            .map_err(|err| SecretsError::Backend {
                reason: err.to_string(),
            })?
            .ok_or_else(|| SecretsError::NotFound {
                name: name.to_string(),
                namespace: self.namespace.clone(),
            })?;
        credentials_from_secret(name, &secret)
    }
}

/// An explicit, non-blank namespace wins over the one inferred from the
/// cluster configuration.
fn resolve_namespace(explicit: Option<String>, inferred: &str) -> String {
    explicit
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| inferred.to_string())
}

fn credentials_from_secret(name: &str, secret: &Secret) -> SecretsResult<S3Credentials> {
    S3Credentials::from_lookup(name, |key| {
        secret
            .data
            .as_ref()
            .and_then(|data| data.get(key))
            .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
    })
}

use async_trait::async_trait;

use crate::{S3Credentials, SecretStore, SecretsResult};

/// Development backend that reads credentials from process environment.
///
/// For a secret named `minio` the key `AWS_S3_BUCKET` is looked up as
/// `MINIO_AWS_S3_BUCKET` first and then as plain `AWS_S3_BUCKET`.
#[derive(Clone, Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn s3_credentials(&self, name: &str) -> SecretsResult<S3Credentials> {
        let prefix = env_prefix(name);
        S3Credentials::from_lookup(name, |key| {
            std::env::var(format!("{prefix}_{key}"))
                .or_else(|_| std::env::var(key))
                .ok()
        })
    }
}

fn env_prefix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

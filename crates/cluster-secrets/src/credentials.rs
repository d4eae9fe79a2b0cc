use std::fmt;

use crate::{SecretsError, SecretsResult};

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const BUCKET: &str = "AWS_S3_BUCKET";
pub const ENDPOINT: &str = "AWS_S3_ENDPOINT";
pub const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Credential bundle for an S3-compatible store, held for a single request.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
}

impl S3Credentials {
    /// Assembles credentials from a key lookup. Values are trimmed since secrets
    /// created from files usually carry a trailing newline. Bucket and endpoint
    /// are required; the remaining keys fall back to empty strings.
    pub fn from_lookup<F>(name: &str, mut lookup: F) -> SecretsResult<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut field = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };
        let access_key_id = field(ACCESS_KEY_ID);
        let secret_access_key = field(SECRET_ACCESS_KEY);
        let bucket = field(BUCKET);
        let endpoint = field(ENDPOINT);
        let region = field(DEFAULT_REGION);

        for (key, value) in [(BUCKET, &bucket), (ENDPOINT, &endpoint)] {
            if value.is_empty() {
                return Err(SecretsError::MissingKey {
                    name: name.to_string(),
                    key,
                });
            }
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            bucket,
            endpoint,
            region,
        })
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish()
    }
}

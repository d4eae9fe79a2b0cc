use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation,
};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use cluster_secrets::S3Credentials;

use super::{ObjectUploader, StorageError, StoredObject};
use crate::staging::StagedFile;

pub const OBJECT_CONTENT_TYPE: &str = "application/octet-stream";

const DEFAULT_REGION: &str = "us-east-1";
const CREDENTIALS_PROVIDER: &str = "cluster-secret";

/// Builds an S3 client from each request's credentials and puts the staged
/// file under its original name.
#[derive(Debug, Clone, Default)]
pub struct S3Uploader;

impl S3Uploader {
    pub fn new() -> Self {
        Self
    }

    fn client(credentials: &S3Credentials) -> Client {
        let region = if credentials.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            credentials.region.clone()
        };
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .endpoint_url(endpoint_url(&credentials.endpoint))
            .credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER,
            ))
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();
        Client::from_conf(config)
    }
}

#[async_trait]
impl ObjectUploader for S3Uploader {
    async fn upload(
        &self,
        credentials: &S3Credentials,
        file: &StagedFile,
    ) -> Result<StoredObject, StorageError> {
        let body = ByteStream::from_path(file.path())
            .await
            .map_err(|err| StorageError::Io(std::io::Error::other(err)))?;

        let output = Self::client(credentials)
            .put_object()
            .bucket(&credentials.bucket)
            .key(file.file_name())
            .content_type(OBJECT_CONTENT_TYPE)
            .content_length(file.size() as i64)
            .body(body)
            .send()
            .await
            .map_err(|err| StorageError::Upload {
                target: "s3",
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        tracing::info!(
            bucket = %credentials.bucket,
            key = %file.file_name(),
            size = file.size(),
            "uploaded object"
        );

        Ok(StoredObject {
            bucket: credentials.bucket.clone(),
            key: file.file_name().to_string(),
            size: file.size(),
            etag: output.e_tag().map(str::to_string),
        })
    }
}

/// Turns the endpoint stored in the secret into a URL. Bare `host:port`
/// values are plain HTTP.
pub fn endpoint_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

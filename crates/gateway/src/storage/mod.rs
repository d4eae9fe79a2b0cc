use async_trait::async_trait;
use cluster_secrets::S3Credentials;
use thiserror::Error;

use crate::staging::StagedFile;

mod oras;
mod s3;

pub use oras::{
    ARTIFACT_TYPE, EMPTY_CONFIG_MEDIA_TYPE, LAYER_MEDIA_TYPE, OrasPusher, PackedArtifact,
    TITLE_ANNOTATION, pack_artifact,
};
pub use s3::{OBJECT_CONTENT_TYPE, S3Uploader, endpoint_url};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{target} upload failed: {reason}")]
    Upload { target: &'static str, reason: String },

    #[error("invalid artifact reference: {reason}")]
    InvalidReference { reason: String },

    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an object landed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
}

/// A pushed artifact, as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedArtifact {
    pub reference: String,
    pub manifest_url: String,
}

/// Uploads staged files to an S3-compatible store with per-request credentials.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(
        &self,
        credentials: &S3Credentials,
        file: &StagedFile,
    ) -> Result<StoredObject, StorageError>;
}

/// Packs a staged file as an OCI artifact and pushes it under `tag`.
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    async fn push(&self, tag: &str, file: &StagedFile) -> Result<PushedArtifact, StorageError>;
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use oci_client::client::{ClientConfig, ClientProtocol, Config, ImageLayer};
use oci_client::manifest::OciImageManifest;
use oci_client::secrets::RegistryAuth;
use oci_client::{Client, Reference};

use super::{ArtifactRegistry, PushedArtifact, StorageError};
use crate::config::RegistrySettings;
use crate::staging::StagedFile;

pub const LAYER_MEDIA_TYPE: &str = "application/vnd.test.file";
pub const ARTIFACT_TYPE: &str = "application/vnd.test.artifact";
pub const EMPTY_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.empty.v1+json";
pub const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

const EMPTY_CONFIG: &[u8] = b"{}";

/// Layers, config blob and manifest of a single-file artifact.
pub struct PackedArtifact {
    pub layers: Vec<ImageLayer>,
    pub config: Config,
    pub manifest: OciImageManifest,
}

/// Packs `data` as the only layer of an artifact manifest. The layer is titled
/// with `file_name` so pull tools restore the original name.
pub fn pack_artifact(file_name: &str, data: Vec<u8>) -> PackedArtifact {
    let annotations = BTreeMap::from([(TITLE_ANNOTATION.to_string(), file_name.to_string())]);
    let layers = vec![ImageLayer::new(
        data,
        LAYER_MEDIA_TYPE.to_string(),
        Some(annotations),
    )];
    let config = Config::new(
        EMPTY_CONFIG.to_vec(),
        EMPTY_CONFIG_MEDIA_TYPE.to_string(),
        None,
    );
    let mut manifest = OciImageManifest::build(&layers, &config, None);
    manifest.artifact_type = Some(ARTIFACT_TYPE.to_string());
    PackedArtifact {
        layers,
        config,
        manifest,
    }
}

/// Pushes artifacts to `<host>/<repository>:<tag>`.
pub struct OrasPusher {
    client: Client,
    host: String,
    repository: String,
    auth: RegistryAuth,
}

impl OrasPusher {
    pub fn new(settings: &RegistrySettings) -> Self {
        let protocol = if settings.plain_http {
            ClientProtocol::Http
        } else {
            ClientProtocol::Https
        };
        let client = Client::new(ClientConfig {
            protocol,
            ..Default::default()
        });
        let auth = match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                RegistryAuth::Basic(username.clone(), password.clone())
            }
            _ => RegistryAuth::Anonymous,
        };
        Self {
            client,
            host: settings.host.clone(),
            repository: settings.repository.clone(),
            auth,
        }
    }

    /// Resolves the push target for `tag`, refusing anything that parses as
    /// more than a plain tag.
    pub fn reference(&self, tag: &str) -> Result<Reference, StorageError> {
        let raw = format!("{}/{}:{}", self.host, self.repository, tag);
        let reference = raw
            .parse::<Reference>()
            .map_err(|err| StorageError::InvalidReference {
                reason: format!("{raw}: {err}"),
            })?;
        if reference.tag() != Some(tag) || reference.digest().is_some() {
            return Err(StorageError::InvalidReference {
                reason: format!("`{tag}` is not a valid tag"),
            });
        }
        Ok(reference)
    }
}

#[async_trait]
impl ArtifactRegistry for OrasPusher {
    async fn push(&self, tag: &str, file: &StagedFile) -> Result<PushedArtifact, StorageError> {
        let reference = self.reference(tag)?;
        let data = tokio::fs::read(file.path()).await?;
        let packed = pack_artifact(file.file_name(), data);
        tracing::debug!(
            reference = %reference,
            layers = packed.layers.len(),
            "packed artifact manifest"
        );

        let response = self
            .client
            .push(
                &reference,
                &packed.layers,
                packed.config,
                &self.auth,
                Some(packed.manifest),
            )
            .await
            .map_err(|err| StorageError::Upload {
                target: "registry",
                reason: err.to_string(),
            })?;

        tracing::info!(
            reference = %reference,
            manifest = %response.manifest_url,
            "pushed artifact"
        );
        Ok(PushedArtifact {
            reference: reference.whole(),
            manifest_url: response.manifest_url,
        })
    }
}

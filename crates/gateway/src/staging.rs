//! Multipart intake.
//!
//! The uploaded part is streamed into a private temporary directory before any
//! storage client touches it. The directory lives as long as the
//! [`StagedFile`] and is removed on drop.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::GatewayError;

/// Name of the text field carrying the secret name or tag.
pub const VALUE_FIELD: &str = "var1";
/// Name of the file field.
pub const FILE_FIELD: &str = "fileName";

const STAGING_PREFIX: &str = "upload-gateway-";
/// On-disk name of the staged part. The client name is kept separately so it
/// never has to be a valid local file name.
const STAGED_NAME: &str = "upload";

#[derive(Debug)]
pub struct UploadForm {
    pub value: String,
    pub file: StagedFile,
}

#[derive(Debug)]
pub struct StagedFile {
    dir: TempDir,
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Client-supplied file name, reduced to its final path component.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Reads the whole form. Fields may arrive in any order; unknown fields are
/// skipped.
pub async fn stage_form(mut multipart: Multipart) -> Result<UploadForm, GatewayError> {
    let mut value = None;
    let mut file = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(VALUE_FIELD) => {
                if value.is_some() {
                    return Err(GatewayError::bad_form(format!(
                        "field `{VALUE_FIELD}` given more than once"
                    )));
                }
                value = Some(field.text().await?);
            }
            Some(FILE_FIELD) => {
                if file.is_some() {
                    return Err(GatewayError::bad_form(format!(
                        "field `{FILE_FIELD}` given more than once"
                    )));
                }
                let file_name = field
                    .file_name()
                    .and_then(sanitize_file_name)
                    .ok_or_else(|| {
                        GatewayError::bad_form(format!("field `{FILE_FIELD}` has no file name"))
                    })?;

                let dir = tempfile::Builder::new()
                    .prefix(STAGING_PREFIX)
                    .tempdir()?;
                let path = dir.path().join(STAGED_NAME);
                let mut out = File::create(&path).await?;
                let mut size = 0u64;
                while let Some(chunk) = field.chunk().await? {
                    out.write_all(&chunk).await?;
                    size += chunk.len() as u64;
                }
                out.flush().await?;

                tracing::debug!(
                    file_name = %file_name,
                    size,
                    dir = %dir.path().display(),
                    "staged upload"
                );
                file = Some(StagedFile {
                    dir,
                    path,
                    file_name,
                    size,
                });
            }
            other => {
                tracing::debug!(field = ?other, "ignoring unexpected form field");
            }
        }
    }

    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::bad_form(format!("field `{VALUE_FIELD}` is required")))?;
    let file =
        file.ok_or_else(|| GatewayError::bad_form(format!("field `{FILE_FIELD}` is required")))?;

    Ok(UploadForm { value, file })
}

/// Keeps the last path component of a client-supplied name. Returns `None`
/// when nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

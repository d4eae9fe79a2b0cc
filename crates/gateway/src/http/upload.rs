use axum::Json;
use axum::extract::{Multipart, State};

use super::{MessageResponse, ServerState};
use crate::error::GatewayError;
use crate::staging::{FILE_FIELD, stage_form};

pub const S3_DONE_MESSAGE: &str = "Done uploading with S3";
pub const ORAS_DONE_MESSAGE: &str = "Done uploading with ORAS";

/// `var1` names the cluster secret holding the bucket credentials.
pub async fn upload_s3(
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, GatewayError> {
    let form = stage_form(multipart).await?;
    tracing::info!(
        secret = %form.value,
        file_name = %form.file.file_name(),
        size = form.file.size(),
        "received s3 upload"
    );

    let credentials = state.secrets.s3_credentials(&form.value).await?;
    tracing::debug!(?credentials, "resolved storage credentials");

    let stored = state.objects.upload(&credentials, &form.file).await?;
    tracing::info!(
        bucket = %stored.bucket,
        key = %stored.key,
        size = stored.size,
        etag = stored.etag.as_deref().unwrap_or("-"),
        "done uploading with s3"
    );
    Ok(Json(MessageResponse::new(S3_DONE_MESSAGE)))
}

/// `var1` is the tag the artifact is pushed under.
pub async fn upload_oras(
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, GatewayError> {
    let registry = state
        .registry
        .clone()
        .ok_or(GatewayError::NotConfigured {
            feature: "REGISTRY",
        })?;

    let form = stage_form(multipart).await?;
    tracing::info!(
        tag = %form.value,
        file_name = %form.file.file_name(),
        size = form.file.size(),
        "received oras upload"
    );
    if form.file.size() == 0 {
        return Err(GatewayError::bad_form(format!(
            "field `{FILE_FIELD}` is empty; artifact layers need content"
        )));
    }

    let pushed = registry.push(&form.value, &form.file).await?;
    tracing::info!(
        reference = %pushed.reference,
        manifest = %pushed.manifest_url,
        "done uploading with oras"
    );
    Ok(Json(MessageResponse::new(ORAS_DONE_MESSAGE)))
}

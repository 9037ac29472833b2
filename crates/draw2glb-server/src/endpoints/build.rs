use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::error::ApiError;
use crate::extract::ApiJson;

pub const GLB_MEDIA_TYPE: &str = "model/gltf-binary";

/// `POST /build`: spec JSON in, binary glTF out.
pub async fn build(ApiJson(spec): ApiJson<Value>) -> Result<Response, ApiError> {
    let glb = tokio::task::spawn_blocking(move || draw2glb_core::build_glb_from_spec(&spec))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| {
            tracing::warn!(error = %e, "build rejected");
            ApiError::BuildFailed(e.to_string())
        })?;

    tracing::info!(bytes = glb.len(), "model built");
    Ok((
        [
            (CONTENT_TYPE, GLB_MEDIA_TYPE),
            (CONTENT_DISPOSITION, "attachment; filename=\"model.glb\""),
            (CACHE_CONTROL, "no-store"),
        ],
        glb,
    )
        .into_response())
}

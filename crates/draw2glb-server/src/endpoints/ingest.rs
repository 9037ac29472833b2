use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Storage;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub file_id: String,
}

/// `POST /ingest` with a multipart `file` field.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        let size = bytes.len();
        let suffix = Storage::suffix_for(filename.as_deref());
        let storage = state.storage.clone();
        let file_id = tokio::task::spawn_blocking(move || storage.put(&bytes, &suffix))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;

        tracing::info!(
            file_id = %file_id,
            filename = filename.as_deref().unwrap_or(""),
            size,
            "drawing stored"
        );
        return Ok(Json(IngestResponse { file_id }));
    }

    Err(ApiError::BadRequest("file field required".into()))
}

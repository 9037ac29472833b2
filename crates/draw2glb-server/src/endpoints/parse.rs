use std::time::Instant;

use axum::extract::State;
use axum::Json;
use draw2glb_core::model::ParseResponse;
use draw2glb_import::DrawingFormat;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub file_id: Option<String>,
}

/// `POST /parse`
///
/// Extraction runs on the blocking pool under the configured time limit.
/// Past the limit the request answers with the default dimensions and a
/// `parse_timeout` warning; the detached task is left to finish on its own.
pub async fn parse(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ParseRequest>,
) -> Result<Json<ParseResponse>, ApiError> {
    let file_id = req
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("file_id required".into()))?;

    let path = state.storage.path_for(&file_id)?;
    let format = DrawingFormat::from_path(&path);
    let bytes = state.storage.read(&file_id)?;

    let started = Instant::now();
    let parser = state.parser.clone();
    let task = tokio::task::spawn_blocking(move || parser.parse(format, &bytes));

    let resp = match tokio::time::timeout(state.parse_time_limit, task).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(join_err)) => {
            tracing::error!(file_id = %file_id, error = %join_err, "parser task failed");
            state
                .parser
                .fallback("extract_failed", "parser task did not complete")
        }
        Err(_) => {
            tracing::warn!(
                file_id = %file_id,
                limit_s = state.parse_time_limit.as_secs_f64(),
                "parse timed out"
            );
            state.parser.fallback(
                "parse_timeout",
                format!(
                    "parsing exceeded {:.0}s, using default dimensions",
                    state.parse_time_limit.as_secs_f64()
                ),
            )
        }
    };

    tracing::info!(
        file_id = %file_id,
        format = format.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        width = resp.dims.width,
        depth = resp.dims.depth,
        height = resp.dims.height,
        confidence = resp.confidence,
        "parse finished"
    );
    Ok(Json(resp))
}

//! HTTP surface of the drawing service.
//!
//! `/` and `/health` are always open; ingest/parse/build sit behind the
//! optional API key. CORS, request tracing and the upload size limit wrap
//! everything.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::ServerConfig;
use crate::endpoints;
use crate::state::AppState;

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let protected = Router::new()
        .route("/ingest", post(endpoints::ingest::upload))
        .route("/parse", post(endpoints::parse::parse))
        .route("/build", post(endpoints::build::build))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    let open = Router::new()
        .route("/", get(endpoints::health::root))
        .route("/health", get(endpoints::health::check));

    Router::new()
        .merge(open)
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(config.allowed_origins.cors_layer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowedOrigins;
    use crate::storage::Storage;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use draw2glb_import::{DrawingParser, OcrEngine};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "draw2glb-test-boundary";

    struct TestApp {
        app: Router,
        _dir: tempfile::TempDir,
    }

    fn test_app_with(config: ServerConfig, parser: DrawingParser) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let state = AppState::new(storage, parser, &config);
        TestApp {
            app: build_router(state, &config),
            _dir: dir,
        }
    }

    fn test_app() -> TestApp {
        test_app_with(ServerConfig::default(), DrawingParser::default())
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/ingest")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn ingest(app: &Router, filename: &str, content: &[u8]) -> String {
        let response = app
            .clone()
            .oneshot(multipart_request("file", filename, content))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["file_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let t = test_app();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = t.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn root_points_at_health() {
        let t = test_app();
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = t.app.oneshot(req).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["service"], "draw2glb-api");
        assert_eq!(json["health"], "/health");
    }

    #[tokio::test]
    async fn ingest_stores_with_lowercase_suffix() {
        let t = test_app();
        let file_id = ingest(&t.app, "Front.SVG", b"<svg/>").await;
        assert!(file_id.ends_with(".svg"));
        assert!(t._dir.path().join(&file_id).is_file());
    }

    #[tokio::test]
    async fn ingest_without_file_field_is_rejected() {
        let t = test_app();
        let response = t
            .app
            .oneshot(multipart_request("attachment", "a.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn parse_requires_file_id() {
        let t = test_app();
        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "file_id required");
    }

    #[tokio::test]
    async fn mistyped_parse_body_gets_error_body() {
        let t = test_app();
        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({ "file_id": 123 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"].as_str().unwrap().contains("invalid type"));
    }

    #[tokio::test]
    async fn malformed_build_body_gets_error_body() {
        let t = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/build")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"bbox\": "))
            .unwrap();
        let response = t.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn build_without_json_content_type_gets_error_body() {
        let t = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/build")
            .body(Body::from("{}"))
            .unwrap();
        let response = t.app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn parse_unknown_file_is_404() {
        let t = test_app();
        let response = t
            .app
            .oneshot(json_request(
                "/parse",
                serde_json::json!({ "file_id": "0123456789abcdef0123456789abcdef.pdf" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["message"], "file not found");
    }

    #[tokio::test]
    async fn parse_rejects_path_traversal() {
        let t = test_app();
        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({ "file_id": "../etc/passwd" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_then_parse_reads_svg_labels() {
        let t = test_app();
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg">
            <text>600</text><text>400</text><text>180</text>
        </svg>"#;
        let file_id = ingest(&t.app, "cabinet.svg", svg).await;

        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({ "file_id": file_id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["dims"]["width"], 400.0);
        assert_eq!(json["dims"]["depth"], 600.0);
        assert_eq!(json["dims"]["height"], 180.0);
        assert_eq!(json["confidence"], 1.0);
    }

    #[tokio::test]
    async fn unsupported_upload_parses_to_defaults() {
        let t = test_app();
        let file_id = ingest(&t.app, "notes.txt", b"100 200 300").await;

        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({ "file_id": file_id })))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["dims"]["width"], 250.0);
        assert_eq!(json["dims"]["height"], 100.0);
        assert_eq!(json["confidence"], 0.1);
        assert_eq!(json["warnings"][0]["code"], "unsupported_format");
    }

    struct SlowOcr;

    impl OcrEngine for SlowOcr {
        fn recognize(&self, _image: &[u8]) -> anyhow::Result<String> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("600 400 200".into())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn slow_parse_times_out_to_defaults() {
        let config = ServerConfig {
            parse_time_limit: Duration::from_millis(20),
            ..ServerConfig::default()
        };
        let t = test_app_with(config, DrawingParser::default().with_ocr(Arc::new(SlowOcr)));
        let file_id = ingest(&t.app, "scan.png", b"\x89PNG\r\n\x1a\n").await;

        let response = t
            .app
            .oneshot(json_request("/parse", serde_json::json!({ "file_id": file_id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["dims"]["depth"], 250.0);
        assert_eq!(json["confidence"], 0.1);
        assert_eq!(json["warnings"][0]["code"], "parse_timeout");
    }

    #[tokio::test]
    async fn build_streams_glb_download() {
        let t = test_app();
        let spec = serde_json::json!({
            "units": "mm",
            "bbox": { "width": 400, "depth": 300, "height": 120 },
            "features": { "frontChamfer": 4.25 }
        });
        let response = t.app.oneshot(json_request("/build", spec)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"model.glb\""
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[0..4], b"glTF");
        let declared = u32::from_le_bytes([body[8], body[9], body[10], body[11]]) as usize;
        assert_eq!(declared, body.len());
    }

    #[tokio::test]
    async fn build_with_bad_spec_is_500() {
        let t = test_app();
        let spec = serde_json::json!({ "bbox": { "width": 400, "depth": 300 } });
        let response = t.app.oneshot(json_request("/build", spec)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BUILD_FAILED");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("build failed: "));
    }

    #[tokio::test]
    async fn api_key_guards_work_routes_only() {
        let config = ServerConfig {
            api_key: Some("s3cret".into()),
            ..ServerConfig::default()
        };
        let t = test_app_with(config, DrawingParser::default());

        let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(t.app.clone().oneshot(health).await.unwrap().status(), StatusCode::OK);

        let anonymous = json_request("/parse", serde_json::json!({}));
        let response = t.app.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut wrong = json_request("/parse", serde_json::json!({}));
        wrong
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert_eq!(
            t.app.clone().oneshot(wrong).await.unwrap().status(),
            StatusCode::UNAUTHORIZED
        );

        let mut authed = json_request("/parse", serde_json::json!({}));
        authed
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        // Past auth, the handler itself rejects the empty body.
        assert_eq!(
            t.app.oneshot(authed).await.unwrap().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn cors_allows_any_origin_by_default() {
        let t = test_app();
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = t.app.oneshot(req).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn cors_list_only_echoes_known_origins() {
        let config = ServerConfig {
            allowed_origins: AllowedOrigins::parse("https://app.example"),
            ..ServerConfig::default()
        };
        let t = test_app_with(config, DrawingParser::default());

        let known = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://app.example")
            .body(Body::empty())
            .unwrap();
        let response = t.app.clone().oneshot(known).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );

        let stranger = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = t.app.oneshot(stranger).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const SERVICE_NAME: &str = "draw2glb-api";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// `*`, an empty string, or only separators mean any origin; otherwise a
    /// comma-separated list.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Self::Any;
        }
        let list: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if list.is_empty() {
            Self::Any
        } else {
            Self::List(list)
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false);
        match self {
            Self::Any => layer.allow_origin(Any),
            Self::List(origins) => {
                let values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match HeaderValue::from_str(o) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect();
                layer.allow_origin(AllowOrigin::list(values))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub storage_dir: PathBuf,
    pub allowed_origins: AllowedOrigins,
    pub parse_time_limit: Duration,
    /// When set, upload/parse/build require `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            storage_dir: PathBuf::from("/tmp/draw2glb"),
            allowed_origins: AllowedOrigins::Any,
            parse_time_limit: Duration::from_secs(20),
            api_key: None,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use draw2glb_import::DrawingParser;

use crate::config::ServerConfig;
use crate::storage::Storage;

/// Shared handler state. Cloned per request, so everything heavy is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub parser: Arc<DrawingParser>,
    pub parse_time_limit: Duration,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(storage: Storage, parser: DrawingParser, config: &ServerConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            parser: Arc::new(parser),
            parse_time_limit: config.parse_time_limit,
            api_key: config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(Arc::from),
        }
    }
}

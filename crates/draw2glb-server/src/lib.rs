pub mod auth;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod router;
pub mod server;
pub mod state;
pub mod storage;

pub use config::{AllowedOrigins, ServerConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::serve;
pub use state::AppState;
pub use storage::{Storage, StorageError};

pub mod build;
pub mod health;
pub mod ingest;
pub mod parse;

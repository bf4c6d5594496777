//! Business logic services.

pub mod ingest;
pub mod projects;
pub mod storage;

pub use ingest::{IngestChain, IngestStrategy, NewProject, RawRequest};
pub use projects::ProjectService;
pub use storage::VideoAssetStore;

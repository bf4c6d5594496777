//! Vista server library.
//!
//! Persistence and ingestion for video transcription projects: SQLite
//! storage with file-based migrations, on-disk video assets, and the HTTP
//! API that creates and serves projects.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

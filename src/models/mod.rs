//! Domain models for the Vista server.

pub mod project;

pub use project::{Project, ProjectListResponse, UpdateProjectRequest};

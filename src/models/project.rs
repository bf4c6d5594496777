//! Project domain models and DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// A transcription project.
///
/// `words` and `config` are produced by the external transcription pipeline
/// and are stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque identifier (UUID v4).
    pub id: String,
    pub title: String,
    /// ISO-8601 creation timestamp (UTC).
    pub created_at: String,
    /// Stored reference of the uploaded video, if any.
    pub video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub words: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub config: Option<JsonValue>,
}

/// Body of `PUT /projects/{id}`.
///
/// Omitted fields are cleared, not preserved.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub words: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub config: Option<JsonValue>,
}

/// Response for the project list endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

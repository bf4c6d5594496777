//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vista Server",
        version = "0.1.0",
        description = "API server for creating and storing video transcription projects"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Project endpoints
        api::projects::create_project,
        api::projects::list_projects,
        api::projects::get_project,
        api::projects::update_project,
        api::projects::get_project_video,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Projects
            models::Project,
            models::ProjectListResponse,
            models::UpdateProjectRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Projects", description = "Project creation, retrieval and updates")
    )
)]
pub struct ApiDoc;

//! Project API handlers.

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Project, ProjectListResponse, UpdateProjectRequest};
use crate::services::{ProjectService, RawRequest};

/// Maximum accepted size of a creation request body, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Create a project.
///
/// Accepts `multipart/form-data` (fields `title` and optional `file`),
/// `application/x-www-form-urlencoded` or a JSON object with a `title`.
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Title is required", body = crate::error::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::error::ErrorResponse),
    )
)]
#[post("/projects")]
pub async fn create_project(
    req: HttpRequest,
    payload: web::Payload,
    limit: web::Data<UploadLimit>,
    service: web::Data<ProjectService>,
) -> AppResult<HttpResponse> {
    let body = read_body(payload, limit.0).await?;
    let raw = RawRequest::from_http(&req, body);

    let project = service.create(&raw).await?;
    Ok(HttpResponse::Created().json(project))
}

/// List projects, newest first.
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "All projects", body = ProjectListResponse),
    )
)]
#[get("/projects")]
pub async fn list_projects(service: web::Data<ProjectService>) -> AppResult<HttpResponse> {
    let projects = service.list()?;
    Ok(HttpResponse::Ok().json(ProjectListResponse { projects }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 400, description = "Missing project id", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/projects/{id}")]
pub async fn get_project(
    path: web::Path<String>,
    service: web::Data<ProjectService>,
) -> AppResult<HttpResponse> {
    let id = require_id(&path)?;
    Ok(HttpResponse::Ok().json(service.get(id)?))
}

/// Replace a project's `words` and `config`.
///
/// Fields left out of the body are cleared. An empty body or `null` counts as `{}`.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    )
)]
#[put("/projects/{id}")]
pub async fn update_project(
    path: web::Path<String>,
    body: web::Bytes,
    service: web::Data<ProjectService>,
) -> AppResult<HttpResponse> {
    let id = require_id(&path)?;

    let request = parse_update_body(&body)?;

    let project = service.update(id, request.words.as_ref(), request.config.as_ref())?;
    Ok(HttpResponse::Ok().json(project))
}

/// Stream back the project's video.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/video",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Video bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Video not found", body = crate::error::ErrorResponse),
    )
)]
#[get("/projects/{id}/video")]
pub async fn get_project_video(
    path: web::Path<String>,
    service: web::Data<ProjectService>,
) -> AppResult<HttpResponse> {
    let id = require_id(&path)?;
    let (data, content_type) = service.video(id).await?;
    Ok(HttpResponse::Ok().content_type(content_type).body(data))
}

/// Empty and `null` bodies mean "no fields"; anything else must be a JSON object.
fn parse_update_body(body: &[u8]) -> AppResult<UpdateProjectRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateProjectRequest::default());
    }
    let invalid = |e: serde_json::Error| AppError::InvalidInput(format!("Invalid JSON body: {}", e));
    match serde_json::from_slice::<JsonValue>(body).map_err(invalid)? {
        JsonValue::Null => Ok(UpdateProjectRequest::default()),
        value @ JsonValue::Object(_) => serde_json::from_value(value).map_err(invalid),
        _ => Err(AppError::InvalidInput(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

fn require_id(path: &str) -> AppResult<&str> {
    let id = path.trim();
    if id.is_empty() {
        return Err(AppError::InvalidInput("Missing project id".to_string()));
    }
    Ok(id)
}

/// Buffer the request body, refusing anything over `limit` bytes.
async fn read_body(mut payload: web::Payload, limit: usize) -> AppResult<web::Bytes> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| AppError::InvalidInput(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "request body exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }

    debug!("Read request body ({} bytes)", body.len());
    Ok(body.freeze())
}

/// Configure project routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_project)
        .service(list_projects)
        .service(get_project_video)
        .service(get_project)
        .service(update_project);
}

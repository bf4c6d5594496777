//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod projects;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use projects::{UploadLimit, configure_routes as configure_project_routes};

use actix_web::web;

/// Mount every route under the `/api` scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(configure_health_routes)
            .configure(configure_project_routes),
    );
}

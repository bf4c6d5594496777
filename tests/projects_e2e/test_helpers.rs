//! Shared test helpers for project E2E tests.

use std::path::{Path, PathBuf};

use actix_web::{App, dev::ServiceResponse, test, web};
use serde_json::Value;
use tempfile::TempDir;
use vista_lib::api::{self, UploadLimit};
use vista_lib::db::{DbPool, MigrationRunner, ProjectStore};
use vista_lib::services::{ProjectService, VideoAssetStore};

/// Upload limit used unless a test asks for a smaller one.
pub const TEST_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub const BOUNDARY: &str = "vista-e2e-boundary";

/// Temporary database and upload directory, removed on drop.
pub struct TestEnv {
    pub dir: TempDir,
    pub pool: DbPool,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pool = DbPool::open(&dir.path().join("database.sqlite"))
            .expect("Failed to open test database");
        migration_runner()
            .apply(&pool)
            .expect("Failed to run migrations");
        Self { dir, pool }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn service(&self) -> ProjectService {
        ProjectService::new(
            ProjectStore::new(self.pool.clone()),
            VideoAssetStore::new(self.upload_dir()),
        )
    }
}

/// Runner over the migrations shipped with the crate.
pub fn migration_runner() -> MigrationRunner {
    MigrationRunner::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
}

/// Create a test app with the default upload limit.
pub async fn create_test_app(
    env: &TestEnv,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    create_test_app_with_limit(env, TEST_UPLOAD_LIMIT).await
}

pub async fn create_test_app_with_limit(
    env: &TestEnv,
    limit: usize,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(env.service()))
            .app_data(web::Data::new(UploadLimit(limit)))
            .app_data(web::PayloadConfig::new(limit))
            .configure(api::configure_api),
    )
    .await
}

/// One multipart part: name, optional file name and content type, payload.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }
}

/// Encode parts as a `multipart/form-data` body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"", part.name).as_bytes(),
        );
        if let Some(filename) = part.filename {
            body.extend_from_slice(format!("; filename=\"{filename}\"").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// POST a creation request with an arbitrary body.
pub async fn create_project_raw<S>(app: &S, content_type: &str, body: Vec<u8>) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// POST a multipart creation request.
pub async fn create_project_multipart<S>(app: &S, parts: &[Part<'_>]) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    create_project_raw(app, &multipart_content_type(), multipart_body(parts)).await
}

pub async fn get_json<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

pub async fn put_raw<S>(app: &S, uri: &str, body: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::put()
        .uri(uri)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

/// Assert the standard error body.
pub fn assert_error(body: &Value, code: &str, message: &str) {
    assert_eq!(body["error"], code, "unexpected error body: {}", body);
    assert_eq!(body["message"], message, "unexpected error body: {}", body);
}

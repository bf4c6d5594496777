//! E2E tests: project creation across request encodings.

use uuid::Uuid;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_multipart_title_is_trimmed_and_stored() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, created) =
        create_project_multipart(&app, &[Part::text("title", "  My Project  ")]).await;

    assert_eq!(status, 201, "unexpected body: {}", created);
    assert_eq!(created["title"], "My Project");
    assert!(created["videoPath"].is_null());
    assert!(Uuid::parse_str(created["id"].as_str().unwrap()).is_ok());

    let (status, fetched) = get_json(&app, &format!("/api/projects/{}", created["id"].as_str().unwrap())).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);
}

#[actix_rt::test]
async fn test_empty_title_is_rejected_without_writes() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, body) = create_project_multipart(
        &app,
        &[
            Part::text("title", "   "),
            Part::file("file", "clip.mp4", "video/mp4", b"0123456789"),
        ],
    )
    .await;

    assert_eq!(status, 400);
    assert_error(&body, "INVALID_INPUT", "Title is required");

    let (_, list) = get_json(&app, "/api/projects").await;
    assert_eq!(list["projects"].as_array().unwrap().len(), 0);
    assert!(!env.upload_dir().exists(), "no asset should be written");
}

#[actix_rt::test]
async fn test_missing_title_is_rejected() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, body) = create_project_raw(&app, "application/json", br#"{"name":"x"}"#.to_vec()).await;
    assert_eq!(status, 400);
    assert_error(&body, "INVALID_INPUT", "Title is required");

    let (status, body) = create_project_raw(&app, "application/json", Vec::new()).await;
    assert_eq!(status, 400);
    assert_error(&body, "INVALID_INPUT", "Title is required");
}

#[actix_rt::test]
async fn test_uploaded_video_is_stored_under_generated_name() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, created) = create_project_multipart(
        &app,
        &[
            Part::text("title", "Interview"),
            Part::file("file", "clip.mp4", "video/mp4", b"0123456789"),
        ],
    )
    .await;
    assert_eq!(status, 201, "unexpected body: {}", created);

    let video_path = created["videoPath"].as_str().unwrap();
    let stem = video_path.strip_suffix(".mp4").expect("extension kept");
    assert!(Uuid::parse_str(stem).is_ok());

    let stored = std::fs::read(env.upload_dir().join(video_path)).unwrap();
    assert_eq!(stored, b"0123456789");
    assert_eq!(std::fs::read_dir(env.upload_dir()).unwrap().count(), 1);
}

#[actix_rt::test]
async fn test_empty_file_input_counts_as_no_video() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, created) = create_project_multipart(
        &app,
        &[
            Part::text("title", "No upload"),
            Part::file("file", "", "application/octet-stream", b""),
        ],
    )
    .await;

    assert_eq!(status, 201, "unexpected body: {}", created);
    assert!(created["videoPath"].is_null());
}

#[actix_rt::test]
async fn test_json_and_urlencoded_bodies_are_accepted() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, from_json) =
        create_project_raw(&app, "application/json", br#"{"title":"Example"}"#.to_vec()).await;
    assert_eq!(status, 201);
    assert_eq!(from_json["title"], "Example");

    let (status, from_form) = create_project_raw(
        &app,
        "application/x-www-form-urlencoded",
        b"title=Example+two".to_vec(),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(from_form["title"], "Example two");

    let (status, from_text) =
        create_project_raw(&app, "text/plain", br#"{"title":"Example three"}"#.to_vec()).await;
    assert_eq!(status, 201);
    assert_eq!(from_text["title"], "Example three");
}

#[actix_rt::test]
async fn test_oversized_body_is_rejected() {
    let env = TestEnv::new();
    let app = create_test_app_with_limit(&env, 64).await;

    let (status, body) = create_project_multipart(
        &app,
        &[
            Part::text("title", "Too big"),
            Part::file("file", "big.mp4", "video/mp4", &[0u8; 256]),
        ],
    )
    .await;

    assert_eq!(status, 413);
    assert_eq!(body["error"], "PAYLOAD_TOO_LARGE");
    assert!(!env.upload_dir().exists());
}

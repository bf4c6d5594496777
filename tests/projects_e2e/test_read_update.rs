//! E2E tests: reading, listing and updating projects.

use serde_json::json;

use super::test_helpers::*;

async fn create<S>(app: &S, title: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let body = serde_json::to_vec(&json!({ "title": title })).unwrap();
    let (status, created) = create_project_raw(app, "application/json", body).await;
    assert_eq!(status, 201, "unexpected body: {}", created);
    created["id"].as_str().unwrap().to_string()
}

#[actix_rt::test]
async fn test_get_unknown_project_is_not_found() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, body) = get_json(&app, "/api/projects/does-not-exist").await;
    assert_eq!(status, 404);
    assert_error(&body, "NOT_FOUND", "Project not found");
}

#[actix_rt::test]
async fn test_blank_id_is_rejected() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, body) = get_json(&app, "/api/projects/%20").await;
    assert_eq!(status, 400);
    assert_error(&body, "INVALID_INPUT", "Missing project id");
}

#[actix_rt::test]
async fn test_update_replaces_words_and_config() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let id = create(&app, "Podcast").await;
    let (_, before) = get_json(&app, &format!("/api/projects/{id}")).await;

    let words = json!([{"text": "hi", "start": 0.0, "end": 0.4}]);
    let config = json!({"subtitle": {"fontSize": 32}});
    let (status, updated) = put_raw(
        &app,
        &format!("/api/projects/{id}"),
        &json!({"words": words, "config": config}).to_string(),
    )
    .await;
    assert_eq!(status, 200, "unexpected body: {}", updated);
    assert_eq!(updated["words"], words);
    assert_eq!(updated["config"], config);

    let (_, after) = get_json(&app, &format!("/api/projects/{id}")).await;
    assert_eq!(after, updated);
    for field in ["id", "title", "createdAt", "videoPath"] {
        assert_eq!(after[field], before[field], "{field} changed");
    }
}

#[actix_rt::test]
async fn test_update_with_empty_body_clears_fields() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let id = create(&app, "Clearing").await;
    let uri = format!("/api/projects/{id}");

    put_raw(&app, &uri, r#"{"words": [1], "config": {"a": 1}}"#).await;
    let (status, cleared) = put_raw(&app, &uri, "").await;

    assert_eq!(status, 200);
    assert!(cleared.get("words").is_none());
    assert!(cleared.get("config").is_none());

    put_raw(&app, &uri, r#"{"words": [2], "config": {"b": 2}}"#).await;
    let (status, cleared) = put_raw(&app, &uri, "null").await;

    assert_eq!(status, 200, "unexpected body: {}", cleared);
    assert!(cleared.get("words").is_none());
    assert!(cleared.get("config").is_none());
}

#[actix_rt::test]
async fn test_update_rejects_bad_json_and_unknown_ids() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    let id = create(&app, "Strict").await;

    let (status, body) = put_raw(&app, &format!("/api/projects/{id}"), "not json").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = put_raw(&app, "/api/projects/missing", "{}").await;
    assert_eq!(status, 404);
    assert_error(&body, "NOT_FOUND", "Project not found");
}

#[actix_rt::test]
async fn test_list_is_newest_first() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let first = create(&app, "first").await;
    let second = create(&app, "second").await;
    let third = create(&app, "third").await;

    let (status, body) = get_json(&app, "/api/projects").await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);
}

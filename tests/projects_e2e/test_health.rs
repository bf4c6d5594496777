//! E2E tests: health and readiness probes.

use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_and_ready() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(&app, "/api/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["database"], "connected");
}

#[actix_rt::test]
async fn test_ready_fails_after_close() {
    let env = TestEnv::new();
    let app = create_test_app(&env).await;
    env.pool.close().unwrap();

    let (status, body) = get_json(&app, "/api/ready").await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], "NOT_READY");
}

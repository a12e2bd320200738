mod common;

use anyhow::Result;
use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use chrono::{Duration, Utc};
use nursery_api::auth::{Identity, TokenService};
use serde_json::json;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/health", None).await?;
    assert_eq!(res.status, StatusCode::OK);

    let body = res.json()?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_issues_a_day_long_token_for_the_new_user() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .post_json(
            "/api/auth/register",
            None,
            &json!({ "email": "demo@test.io", "password": PASSWORD, "name": "Demo" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let body = res.json()?;
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "demo@test.io");
    assert_eq!(user["name"], "Demo");
    assert!(user.get("password_hash").is_none());
    assert_eq!(body["data"]["expires_in"], 86_400);

    let claims = app.tokens.verify(body["data"]["token"].as_str().unwrap())?;
    assert_eq!(claims.sub.to_string(), user["id"].as_str().unwrap());
    assert_eq!(claims.exp - claims.iat, 86_400);
    assert!((claims.exp - (Utc::now().timestamp() + 86_400)).abs() <= 5);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let app = TestApp::new();
    app.register("demo@test.io").await?;

    let res = app
        .post_json(
            "/api/auth/register",
            None,
            &json!({ "email": "Demo@Test.io", "password": "something-else" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()?["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn registration_validates_input() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .post_json("/api/auth/register", None, &json!({ "email": "nope", "password": PASSWORD }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["code"], "VALIDATION_ERROR");

    let res = app
        .post_json("/api/auth/register", None, &json!({ "email": "a@b.io", "password": "short" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()?["field_errors"]["password"].is_string());

    let res = app.post_json("/api/auth/register", None, &json!({ "email": "a@b.io" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn login_succeeds_with_the_registered_password() -> Result<()> {
    let app = TestApp::new();
    let (_, user_id) = app.register("demo@test.io").await?;

    let res = app
        .post_json("/api/auth/login", None, &json!({ "email": "demo@test.io", "password": PASSWORD }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    let body = res.json()?;
    let claims = app.tokens.verify(body["data"]["token"].as_str().unwrap())?;
    assert_eq!(claims.sub, user_id);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_get_the_same_answer() -> Result<()> {
    let app = TestApp::new();
    app.register("demo@test.io").await?;

    let wrong = app
        .post_json("/api/auth/login", None, &json!({ "email": "demo@test.io", "password": "wrong-pass" }))
        .await?;
    let unknown = app
        .post_json("/api/auth/login", None, &json!({ "email": "ghost@test.io", "password": PASSWORD }))
        .await?;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()?["error"], "Invalid email or password");
    assert_eq!(wrong.body, unknown.body);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() -> Result<()> {
    let app = TestApp::new();
    let (_, user_id) = app.register("demo@test.io").await?;

    let missing = app.get("/api/baby", None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json()?["code"], "UNAUTHORIZED");

    let garbage = app.get("/api/baby", Some("not.a.token")).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let identity = Identity {
        user_id,
        email: "demo@test.io".into(),
        name: "demo".into(),
    };
    let forged = TokenService::new("some-other-secret-0123456789abcdef", Duration::hours(24)).issue(&identity);
    assert_eq!(app.get("/api/baby", Some(&forged)).await?.status, StatusCode::UNAUTHORIZED);

    let expired = app.tokens.issue_at(&identity, Utc::now() - Duration::hours(25));
    assert_eq!(app.get("/api/baby", Some(&expired)).await?.status, StatusCode::UNAUTHORIZED);

    // Nothing was provisioned by the rejected calls.
    assert_eq!(app.store.baby_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn me_reports_the_token_identity() -> Result<()> {
    let app = TestApp::new();
    let (token, user_id) = app.register("demo@test.io").await?;

    let res = app.get("/api/me", Some(&token)).await?;
    assert_eq!(res.status, StatusCode::OK);

    let body = res.json()?;
    assert_eq!(body["data"]["id"], user_id.to_string());
    assert_eq!(body["data"]["email"], "demo@test.io");
    Ok(())
}

#[tokio::test]
async fn options_requests_short_circuit_without_auth() -> Result<()> {
    let app = TestApp::new();

    for path in ["/api/events", "/api/documents/123", "/no/such/route"] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(path)
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .body(Body::empty())?;
        let res = app.send(request).await?;

        assert!(res.status.is_success(), "{path}: {}", res.status);
        assert!(res.body.is_empty());
        assert_eq!(res.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        let methods = res.header(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap_or_default();
        assert!(methods.contains("DELETE"), "{path}: {methods}");
        let headers = res
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(headers.contains("authorization"));
    }
    Ok(())
}

#[tokio::test]
async fn error_responses_carry_cors_headers() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/events", None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
    assert!(res.header(header::ACCESS_CONTROL_ALLOW_METHODS).is_some());
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_json_404s() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/nothing-here", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let body = res.json()?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

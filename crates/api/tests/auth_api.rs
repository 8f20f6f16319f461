//! HTTP-level integration tests for signup, login, logout, and session
//! handling.

mod common;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use common::{
    body_json, create_client, get, get_with_cookie, login, post_json, post_json_with_cookie,
    session_cookie, test_config, TEST_PASSWORD,
};
use sqlx::PgPool;
use studio_api::auth::jwt::generate_token;
use studio_db::repositories::{LoyaltyRepo, UserRepo};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn signup_creates_client_with_loyalty_row_and_welcome_email(pool: PgPool) {
    let t = common::build_test_app(pool.clone());
    let body = serde_json::json!({
        "email": "  New.Artist@Example.com ",
        "password": "Mixdown42",
        "name": "New Artist",
    });

    let response = post_json(t.app(), "/api/v1/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(
        response.headers().get(SET_COOKIE).is_none(),
        "signup must not sign the user in"
    );

    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "new.artist@example.com");
    assert_eq!(json["data"]["role"], "client");
    assert!(json["data"].get("password_hash").is_none());

    let user = UserRepo::find_by_email(&pool, "new.artist@example.com")
        .await
        .unwrap()
        .expect("user row must exist");
    let loyalty = LoyaltyRepo::find_by_user(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(loyalty.projects_completed, 0);

    let sent = t.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "new.artist@example.com");
    assert!(sent[0].subject.starts_with("Welcome"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn signup_duplicate_email_returns_409(pool: PgPool) {
    create_client(&pool, "taken@example.com").await;
    let t = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "TAKEN@example.com", "password": "Mixdown42" });
    let response = post_json(t.app(), "/api/v1/auth/signup", body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn signup_rejects_weak_password_and_bad_email(pool: PgPool) {
    let t = common::build_test_app(pool.clone());

    let weak = serde_json::json!({ "email": "a@example.com", "password": "alllowercase1" });
    let response = post_json(t.app(), "/api/v1/auth/signup", weak).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let bad_email = serde_json::json!({ "email": "not-an-email", "password": "Mixdown42" });
    let response = post_json(t.app(), "/api/v1/auth/signup", bad_email).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// ---------------------------------------------------------------------------
// Login / session
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn login_sets_http_only_session_cookie(pool: PgPool) {
    let user = create_client(&pool, "login@example.com").await;
    let t = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "login@example.com", "password": TEST_PASSWORD });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user.id);
    assert!(json.get("token").is_none(), "token must only travel in the cookie");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_wrong_password_returns_401(pool: PgPool) {
    create_client(&pool, "wrongpw@example.com").await;
    let t = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "wrongpw@example.com", "password": "Nope12345" });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let unknown = serde_json::json!({ "email": "ghost@example.com", "password": TEST_PASSWORD });
    let response = post_json(t.app(), "/api/v1/auth/login", unknown).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_reflects_session(pool: PgPool) {
    create_client(&pool, "status@example.com").await;
    let t = common::build_test_app(pool);

    let anonymous = body_json(get(t.app(), "/api/v1/auth/status").await).await;
    assert_eq!(anonymous["data"]["authenticated"], false);
    assert!(anonymous["data"]["user"].is_null());

    let cookie = login(t.app(), "status@example.com").await;
    let json = body_json(get_with_cookie(t.app(), "/api/v1/auth/status", &cookie).await).await;
    assert_eq!(json["data"]["authenticated"], true);
    assert_eq!(json["data"]["user"]["email"], "status@example.com");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_expires_cookie(pool: PgPool) {
    create_client(&pool, "logout@example.com").await;
    let t = common::build_test_app(pool);
    let cookie = login(t.app(), "logout@example.com").await;

    let response =
        post_json_with_cookie(t.app(), "/api/v1/auth/logout", &cookie, serde_json::json!({})).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    assert_eq!(session_cookie(&response).as_deref(), Some("token="));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn protected_route_requires_cookie(pool: PgPool) {
    let user = create_client(&pool, "bearer@example.com").await;
    let t = common::build_test_app(pool);

    let response = get(t.app(), "/api/v1/me/purchases").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A valid token presented as a bearer header is not accepted.
    let token = generate_token(user.id, "client", &test_config().jwt).unwrap();
    let request = Request::builder()
        .uri("/api/v1/me/purchases")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = t.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        get_with_cookie(t.app(), "/api/v1/me/purchases", "token=not.a.jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn login_attempts_are_rate_limited_per_client(pool: PgPool) {
    create_client(&pool, "limited@example.com").await;
    let mut config = test_config();
    config.auth_rate_limit = 2;
    let t = common::build_test_app_with(pool, config);

    let body = serde_json::json!({ "email": "limited@example.com", "password": "Wrong1234" });
    for _ in 0..2 {
        let response = post_json(t.app(), "/api/v1/auth/login", body.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get("retry-after").is_some());
    assert_eq!(body_json(response).await["code"], "RATE_LIMITED");
}

//! Integration tests for project status changes feeding the loyalty engine.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_admin, create_client, login, post_json_with_cookie, put_json_with_cookie,
};
use sqlx::PgPool;
use studio_core::types::DbId;
use studio_db::models::project::CreateProject;
use studio_db::repositories::{LoyaltyRepo, ProjectRepo, VoucherRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_project(pool: &PgPool, user_id: DbId) -> DbId {
    let input = CreateProject {
        user_id,
        title: "Summer EP".to_string(),
        package_name: Some("Big Leagues".to_string()),
    };
    ProjectRepo::create(pool, &input).await.unwrap().id
}

async fn set_completed(pool: &PgPool, user_id: DbId, count: i32) {
    sqlx::query("UPDATE loyalty SET projects_completed = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(count)
        .execute(pool)
        .await
        .unwrap();
}

fn status_uri(project_id: DbId) -> String {
    format!("/api/v1/admin/projects/{project_id}/status")
}

fn delivered() -> serde_json::Value {
    serde_json::json!({ "status": "delivered" })
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn clients_cannot_change_project_status(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "artist@example.com").await;

    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let loyalty = LoyaltyRepo::find_by_user(&pool, client.id).await.unwrap().unwrap();
    assert_eq!(loyalty.projects_completed, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_project_for_existing_user(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    let t = common::build_test_app(pool);
    let cookie = login(t.app(), "admin@example.com").await;

    let body = serde_json::json!({ "user_id": client.id, "title": " Debut Single ", "package_name": "Big Leagues" });
    let response = post_json_with_cookie(t.app(), "/api/v1/admin/projects", &cookie, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Debut Single");
    assert_eq!(json["data"]["status"], "intake");

    let ghost = serde_json::json!({ "user_id": 999_999, "title": "Nobody" });
    let response = post_json_with_cookie(t.app(), "/api/v1/admin/projects", &cookie, ghost).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_status_and_project_are_rejected(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool);
    let cookie = login(t.app(), "admin@example.com").await;

    let bad = serde_json::json!({ "status": "shipped" });
    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, bad).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_with_cookie(t.app(), &status_uri(999_999), &cookie, delivered()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn only_transition_into_delivered_counts(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "admin@example.com").await;

    let mixing = serde_json::json!({ "status": "static_mix" });
    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, mixing).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["loyalty"].is_null());

    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["previous_status"], "static_mix");
    assert_eq!(json["data"]["loyalty"]["projects_completed"], 1);
    assert!(json["data"]["project"]["delivered_at"].is_string());

    // Re-delivering the same project does not count again.
    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;
    assert!(body_json(response).await["data"]["loyalty"].is_null());

    let loyalty = LoyaltyRepo::find_by_user(&pool, client.id).await.unwrap().unwrap();
    assert_eq!(loyalty.projects_completed, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_completions_are_all_counted_and_milestone_granted_once(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    set_completed(&pool, client.id, 5).await;

    let mut uris = Vec::new();
    for _ in 0..6 {
        uris.push(status_uri(new_project(&pool, client.id).await));
    }

    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "admin@example.com").await;

    let requests = uris
        .iter()
        .map(|uri| put_json_with_cookie(t.app(), uri, &cookie, delivered()));
    let mut counts = Vec::new();
    for response in futures::future::join_all(requests).await {
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        counts.push(json["data"]["loyalty"]["projects_completed"].as_i64().unwrap());
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![6, 7, 8, 9, 10, 11]);

    let loyalty = LoyaltyRepo::find_by_user(&pool, client.id).await.unwrap().unwrap();
    assert_eq!(loyalty.projects_completed, 11);

    // Only the 9-project promotion falls inside 6..=11.
    let vouchers = VoucherRepo::list_for_user(&pool, client.id).await.unwrap();
    assert_eq!(vouchers.len(), 1);
    assert_eq!(vouchers[0].milestone_count, 9);
    assert!(vouchers[0].code.starts_with("FRESH9-"));
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn reaching_milestone_grants_one_voucher_and_one_email(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    set_completed(&pool, client.id, 8).await;
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "admin@example.com").await;

    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["loyalty"]["projects_completed"], 9);
    assert_eq!(json["data"]["vouchers_granted"].as_array().unwrap().len(), 1);

    let vouchers = VoucherRepo::list_for_user(&pool, client.id).await.unwrap();
    assert_eq!(vouchers.len(), 1);
    let voucher = &vouchers[0];
    assert!(voucher.code.starts_with(&format!("FRESH9-{}-", client.id)));
    assert!(voucher.description.contains("So Fresh & So Clean"));
    assert!(!voucher.is_redeemed);
    let validity = voucher.expires_at - voucher.created_at;
    assert!((364..=365).contains(&validity.num_days()));

    let sent = t.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "artist@example.com");
    assert_eq!(sent[0].subject, "You've earned a reward!");
    assert!(sent[0].body.contains(&voucher.code));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn no_matching_promotion_only_moves_counter(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    set_completed(&pool, client.id, 8).await;
    sqlx::query("UPDATE promotions SET is_active = FALSE")
        .execute(&pool)
        .await
        .unwrap();
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "admin@example.com").await;

    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let loyalty = LoyaltyRepo::find_by_user(&pool, client.id).await.unwrap().unwrap();
    assert_eq!(loyalty.projects_completed, 9);
    assert!(VoucherRepo::list_for_user(&pool, client.id).await.unwrap().is_empty());
    assert!(t.mailer.wait_for(1).await.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn promotions_sharing_a_milestone_are_all_granted(pool: PgPool) {
    let client = create_client(&pool, "artist@example.com").await;
    create_admin(&pool, "admin@example.com").await;
    set_completed(&pool, client.id, 8).await;
    sqlx::query(
        "INSERT INTO promotions (type, name, project_milestone_count, voucher_code_prefix, description)
         VALUES ('project_milestone', 'Bonus stems', 9, 'STEMS9', 'Free stem export')",
    )
    .execute(&pool)
    .await
    .unwrap();
    let project_id = new_project(&pool, client.id).await;
    let t = common::build_test_app(pool.clone());
    let cookie = login(t.app(), "admin@example.com").await;

    let response = put_json_with_cookie(t.app(), &status_uri(project_id), &cookie, delivered()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let vouchers = VoucherRepo::list_for_user(&pool, client.id).await.unwrap();
    let codes: Vec<&str> = vouchers.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes.len(), 2);
    assert!(codes[0].starts_with("FRESH9-"));
    assert!(codes[1].starts_with("STEMS9-"));
    assert_eq!(t.mailer.wait_for(2).await.len(), 2);
}

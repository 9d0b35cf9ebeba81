//! HTTP-level tests driving the router in process, mostly against the in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;
use shipway::auth::{generate_token, session};

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/spaces", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    let token = generate_token(9);
    session::create_or_update(
        app.store.as_ref(),
        9,
        &token,
        Utc::now() - Duration::minutes(5),
    )
    .unwrap();

    let (status, body) = app.get("/api/v1/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_reissue_invalidates_previous_token() {
    let app = TestApp::new();
    let first = app.token_for(3);
    let second = app.token_for(3);

    let (status, _) = app.get("/api/v1/me", &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/v1/me", &second).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], 3);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    let token = app.token_for(4);

    let (status, _) = app.send(Method::POST, "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/v1/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_space_name_conflict_and_exists() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let id = app.create_space(&token, "payments").await;

    let (status, body) = app
        .post("/api/v1/spaces", &token, json!({ "name": "payments" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "app");

    let (_, body) = app
        .get("/api/v1/spaces/exists?keyword=payments", &token)
        .await;
    assert_eq!(body["data"]["exists"], true);

    let (_, body) = app
        .get(&format!("/api/v1/spaces/exists?keyword=payments&id={id}"), &token)
        .await;
    assert_eq!(body["data"]["exists"], false);
}

#[tokio::test]
async fn test_empty_space_name_is_param_error() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let (status, body) = app
        .post("/api/v1/spaces", &token, json!({ "name": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "param");
}

#[tokio::test]
async fn test_space_list_only_shows_memberships() {
    let app = TestApp::new();
    let alice = app.token_for(1);
    let bob = app.token_for(2);
    let space = app.create_space(&alice, "web").await;
    app.create_space(&bob, "data").await;

    let (_, body) = app.get("/api/v1/spaces", &alice).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["name"], "web");
    assert_eq!(body["data"]["list"][0]["have_project"], false);

    let (status, _) = app.get(&format!("/api/v1/spaces/{space}"), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/api/v1/spaces/{space}/members"),
            &alice,
            json!({ "user_id": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/v1/spaces", &bob).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_space_with_project_cannot_be_deleted() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;

    let (_, body) = app.get("/api/v1/spaces", &token).await;
    assert_eq!(body["data"]["list"][0]["have_project"], true);

    let uri = format!("/api/v1/spaces/{space}");
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let project_uri = format!("/api/v1/projects/{project}");
    let (status, _) = app
        .send(Method::DELETE, &project_uri, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_project_update_is_partial() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let (_, created) = app
        .post(
            "/api/v1/projects",
            &token,
            json!({ "space_id": space, "name": "frontend", "description": "spa" }),
        )
        .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/projects/{id}"),
            Some(&token),
            Some(json!({ "name": "storefront" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "storefront");
    assert_eq!(body["data"]["description"], "spa");
}

#[tokio::test]
async fn test_apply_requires_space_membership() {
    let app = TestApp::new();
    let alice = app.token_for(1);
    let mallory = app.token_for(66);
    let space = app.create_space(&alice, "web").await;
    let project = app.create_project(&alice, space, "frontend").await;

    let (status, _) = app
        .post(
            "/api/v1/applies",
            &mallory,
            json!({ "project_id": project, "name": "sneaky" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_apply_lifecycle_through_deploy() {
    lifecycle_through_deploy(TestApp::new()).await;
}

#[tokio::test]
async fn test_apply_lifecycle_through_deploy_on_sqlite() {
    lifecycle_through_deploy(TestApp::sqlite()).await;
}

async fn lifecycle_through_deploy(app: TestApp) {
    let token = app.token_for(1);
    let auditor = app.token_for(2);
    let space = app.create_space(&token, "web").await;
    app.post(
        &format!("/api/v1/spaces/{space}/members"),
        &token,
        json!({ "user_id": 2 }),
    )
    .await;
    let project = app.create_project(&token, space, "frontend").await;
    let id = app.create_apply(&token, project, "release-1").await;

    let (_, body) = app.get(&format!("/api/v1/applies/{id}"), &token).await;
    assert_eq!(body["data"]["status"], "AUDIT_PENDING");
    assert_eq!(body["data"]["space_id"], space);
    assert_eq!(body["data"]["repo_data"]["repo_tag"], "v1.0.0");

    let (status, body) = app
        .post(
            &format!("/api/v1/applies/{id}/audit"),
            &auditor,
            json!({ "pass": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "AUDIT_PASS");
    assert_eq!(app.outbox.sent.lock().unwrap().len(), 1);

    let status_uri = format!("/api/v1/applies/{id}/status");
    let (status, _) = app
        .post(&status_uri, &token, json!({ "status": "DEPLOY_ING" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            &status_uri,
            &token,
            json!({ "status": "DEPLOY_FAILED", "error_log": "health check timed out" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "DEPLOY_FAILED");
    assert_eq!(body["data"]["error_log"], "health check timed out");

    // Terminal: nothing further is accepted.
    let (status, _) = app
        .post(&format!("/api/v1/applies/{id}/drop"), &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_illegal_transition_is_conflict() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;
    let id = app.create_apply(&token, project, "release-1").await;

    let (status, _) = app
        .post(
            &format!("/api/v1/applies/{id}/status"),
            &token,
            json!({ "status": "DEPLOY_SUCCESS" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            &format!("/api/v1/applies/{id}/status"),
            &token,
            json!({ "status": "AUDIT_PASS" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "param");
}

#[tokio::test]
async fn test_apply_edit_rules() {
    let app = TestApp::new();
    let alice = app.token_for(1);
    let bob = app.token_for(2);
    let space = app.create_space(&alice, "web").await;
    app.post(
        &format!("/api/v1/spaces/{space}/members"),
        &alice,
        json!({ "user_id": 2 }),
    )
    .await;
    let project = app.create_project(&alice, space, "frontend").await;
    let id = app.create_apply(&alice, project, "release-1").await;
    let uri = format!("/api/v1/applies/{id}");
    let edit = json!({ "name": "release-1b", "repo_data": { "repo_url": "u", "repo_branch": "main" } });

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&bob), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&alice), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "release-1b");
    assert_eq!(body["data"]["repo_data"]["repo_mode"], "branch");

    app.post(&format!("{uri}/audit"), &bob, json!({ "pass": false, "reason": "no ticket" }))
        .await;
    let (status, _) = app.send(Method::PUT, &uri, Some(&alice), Some(edit)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_apply_list_filters() {
    let app = TestApp::new();
    let alice = app.token_for(1);
    let bob = app.token_for(2);
    let space = app.create_space(&alice, "web").await;
    app.post(
        &format!("/api/v1/spaces/{space}/members"),
        &alice,
        json!({ "user_id": 2 }),
    )
    .await;
    let project = app.create_project(&alice, space, "frontend").await;
    let first = app.create_apply(&alice, project, "hotfix-login").await;
    app.create_apply(&bob, project, "feature-cart").await;
    app.post(&format!("/api/v1/applies/{first}/drop"), &alice, json!({}))
        .await;

    let (_, body) = app.get("/api/v1/applies", &alice).await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = app.get("/api/v1/applies?mine=true", &bob).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["name"], "feature-cart");

    let (_, body) = app.get("/api/v1/applies?status=DROP", &alice).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["id"], first);

    let (_, body) = app.get(&format!("/api/v1/applies?keyword={first}"), &alice).await;
    assert_eq!(body["data"]["total"], 1);

    let (_, body) = app.get("/api/v1/applies?keyword=CART", &alice).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app.get("/api/v1/applies?status=bogus", &alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let outsider = app.token_for(77);
    let (_, body) = app.get("/api/v1/applies", &outsider).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_project_with_pending_apply_cannot_be_deleted() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;
    app.create_apply(&token, project, "release-1").await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/projects/{project}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submitter_cannot_audit_own_apply() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;
    let id = app.create_apply(&token, project, "release-1").await;

    let (status, _) = app
        .post(
            &format!("/api/v1/applies/{id}/audit"),
            &token,
            json!({ "pass": true }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get(&format!("/api/v1/applies/{id}"), &token).await;
    assert_eq!(body["data"]["status"], "AUDIT_PENDING");
    assert!(app.outbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_positive_ctime_is_ignored() {
    let app = TestApp::new();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;
    app.create_apply(&token, project, "release-1").await;

    let (status, body) = app.get("/api/v1/applies?ctime=-100", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let future = Utc::now().timestamp() + 3600;
    let (_, body) = app
        .get(&format!("/api/v1/applies?ctime={future}"), &token)
        .await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_token_refresh_replaces_token() {
    let app = TestApp::new();
    let old = app.token_for(5);

    let (status, body) = app
        .send(Method::POST, "/api/v1/token/refresh", Some(&old), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["token"].as_str().unwrap().to_string();
    assert!(fresh.starts_with("shipway_5_"));

    // Default configured lifetime is seven days.
    let expire: chrono::DateTime<Utc> =
        serde_json::from_value(body["data"]["expire_time"].clone()).unwrap();
    assert!(expire > Utc::now() + Duration::days(6));

    let (status, _) = app.get("/api/v1/me", &old).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/v1/me", &fresh).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_keyword_search_on_sqlite_folds_case() {
    let app = TestApp::sqlite();
    let token = app.token_for(1);
    let space = app.create_space(&token, "web").await;
    let project = app.create_project(&token, space, "frontend").await;
    app.create_apply(&token, project, "Émission-Prod").await;
    app.create_apply(&token, project, "billing").await;

    let (_, body) = app
        .get("/api/v1/applies?keyword=%C3%A9mission", &token)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["name"], "Émission-Prod");
}

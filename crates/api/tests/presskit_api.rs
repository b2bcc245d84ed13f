//! Integration tests for presskit share links.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, manager, organizer, token_from_url, TestApp};
use serde_json::json;

/// Issue a link as the manager and return `(link id, token)`.
async fn issue(app: &TestApp, body: serde_json::Value) -> (i64, String) {
    let response = app
        .post(
            &format!("/presskits/{}/generate-link", app.presskit_id),
            Some(&manager()),
            body,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let url = json["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://backstage.test/presskit/"));
    assert!(json["data"]["link"].get("token").is_none());
    (
        json["data"]["link"]["id"].as_i64().unwrap(),
        token_from_url(url),
    )
}

// ---------------------------------------------------------------------------
// Test: only staff can generate links
// ---------------------------------------------------------------------------

#[tokio::test]
async fn organizer_cannot_generate_link() {
    let app = common::build_test_app();

    let response = app
        .post(
            &format!("/presskits/{}/generate-link", app.presskit_id),
            Some(&organizer()),
            json!({}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: view quota is enforced and reported
// ---------------------------------------------------------------------------

#[tokio::test]
async fn view_quota_is_enforced() {
    let app = common::build_test_app();
    let (_, token) = issue(&app, json!({ "maxViews": 2, "watermarkText": "For Harbour" })).await;
    let uri = format!("/public/presskits/{token}");

    let first = body_json(app.get(&uri, None).await).await;
    assert_eq!(first["data"]["title"], "Night Owls EPK");
    assert_eq!(first["data"]["watermarkText"], "For Harbour");
    assert_eq!(first["data"]["remainingViews"], 1);

    let second = app.get(&uri, None).await;
    assert_eq!(second.status(), StatusCode::OK);

    let third = app.get(&uri, None).await;
    assert_eq!(third.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: revoked links stop working on every public route
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revoked_link_is_forbidden() {
    let app = common::build_test_app();
    let (link_id, token) = issue(&app, json!({ "allowDownload": true })).await;

    let revoked = app
        .patch(
            &format!("/presskits/{}/links/{link_id}/revoke", app.presskit_id),
            Some(&manager()),
            json!({}),
        )
        .await;
    assert_eq!(revoked.status(), StatusCode::OK);
    assert_eq!(body_json(revoked).await["data"]["isRevoked"], true);

    let view = app.get(&format!("/public/presskits/{token}"), None).await;
    assert_eq!(view.status(), StatusCode::FORBIDDEN);

    let download = app.get(&format!("/public/presskits/{token}/download"), None).await;
    assert_eq!(download.status(), StatusCode::FORBIDDEN);

    let track = app
        .post(
            &format!("/public/presskits/{token}/track"),
            None,
            json!({ "action": "section_view", "sectionId": "bio" }),
        )
        .await;
    assert_eq!(track.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: download honours allowDownload and serves watermarked HTML
// ---------------------------------------------------------------------------

#[tokio::test]
async fn download_requires_permission() {
    let app = common::build_test_app();
    let (_, blocked) = issue(&app, json!({})).await;
    let (_, allowed) = issue(&app, json!({ "allowDownload": true, "watermarkText": "Harbour" })).await;

    let denied = app.get(&format!("/public/presskits/{blocked}/download"), None).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let response = app.get(&format!("/public/presskits/{allowed}/download"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment"));

    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Harbour"));
}

// ---------------------------------------------------------------------------
// Test: tracking does not consume views and lands in the access log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tracking_is_logged_without_consuming_views() {
    let app = common::build_test_app();
    let (link_id, token) = issue(&app, json!({ "maxViews": 1 })).await;

    let tracked = app
        .post(
            &format!("/public/presskits/{token}/track"),
            None,
            json!({ "action": "section_view", "sectionId": "bio", "duration": 42 }),
        )
        .await;
    assert_eq!(tracked.status(), StatusCode::NO_CONTENT);

    let view = app.get(&format!("/public/presskits/{token}"), None).await;
    assert_eq!(view.status(), StatusCode::OK);

    let logs = app
        .get(
            &format!("/presskits/{}/links/{link_id}/logs", app.presskit_id),
            Some(&manager()),
        )
        .await;
    assert_eq!(logs.status(), StatusCode::OK);
    let logs = body_json(logs).await;
    let entries = logs["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["ipAddress"] == "203.0.113.9"));
    assert!(entries.iter().any(|e| e["action"] == "section_view"));
}

// ---------------------------------------------------------------------------
// Test: link listing shows issued links
// ---------------------------------------------------------------------------

#[tokio::test]
async fn links_are_listed_for_staff() {
    let app = common::build_test_app();
    issue(&app, json!({})).await;
    issue(&app, json!({ "maxViews": 5 })).await;

    let response = app
        .get(&format!("/presskits/{}/links", app.presskit_id), Some(&manager()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Test: a garbage token is forbidden, not a 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn garbage_token_is_forbidden() {
    let app = common::build_test_app();

    let response = app.get("/public/presskits/not-a-token", None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid or expired token");
}

//! Integration tests for sharing and downloads.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

async fn upload_one(app: &helpers::TestApp, token: &str, name: &str, data: &[u8]) -> Uuid {
    let response = app.upload(token, None, &[(name, "text/plain", data)]).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.data()[0]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("Upload returned no id")
}

#[tokio::test]
async fn test_owner_downloads_own_file() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("owner@example.com");
    let file_id = upload_one(&app, &token, "report.txt", b"quarterly numbers").await;

    let (status, bytes) = app
        .fetch(&format!("/api/files/{file_id}/download"), Some(&token))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"quarterly numbers");
}

#[tokio::test]
async fn test_password_link_share() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let file_id = upload_one(&app, &owner, "plan.txt", b"secret plan").await;

    let share = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({ "password": "hunter2" })),
            Some(&owner),
        )
        .await;
    assert_eq!(share.status, StatusCode::CREATED);
    assert_eq!(share.data()["share_type"], "link");
    assert_eq!(share.data()["permission"], "view");
    assert!(share.data().get("password_hash").is_none());
    let share_id = share.id();

    let (status, _) = app
        .fetch(&format!("/api/shares/{share_id}/download"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .fetch(&format!("/api/shares/{share_id}/download?password=wrong"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, bytes) = app
        .fetch(
            &format!("/api/shares/{share_id}/download?password=hunter2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"secret plan");

    let shares = app
        .request(
            "GET",
            &format!("/api/files/{file_id}/shares"),
            None,
            Some(&owner),
        )
        .await;
    assert_eq!(shares.data()[0]["download_count"], 1);
}

#[tokio::test]
async fn test_user_share_grants_recipient_only() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let (friend_id, friend) = app.sign_in("friend@example.com");
    let (_, stranger) = app.sign_in("stranger@example.com");
    app.request("GET", "/api/auth/user", None, Some(&friend)).await;

    let file_id = upload_one(&app, &owner, "photo.txt", b"pixels").await;
    let share = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({ "sharedWith": friend_id, "permission": "edit" })),
            Some(&owner),
        )
        .await;
    assert_eq!(share.status, StatusCode::CREATED);
    assert_eq!(share.data()["share_type"], "user");

    let shared = app
        .request("GET", "/api/files/shared", None, Some(&friend))
        .await;
    assert_eq!(shared.data().as_array().unwrap().len(), 1);
    assert_eq!(shared.data()[0]["id"], file_id.to_string());

    let download = format!("/api/files/{file_id}/download");
    let (status, bytes) = app.fetch(&download, Some(&friend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"pixels");

    let (status, _) = app.fetch(&download, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A user share is not a public link.
    let (status, _) = app
        .fetch(&format!("/api/shares/{}/download", share.id()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_share_to_unknown_user_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let file_id = upload_one(&app, &owner, "a.txt", b"a").await;

    let response = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({ "sharedWith": Uuid::new_v4() })),
            Some(&owner),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folder_cannot_be_shared() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let folder = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "album" })),
            Some(&owner),
        )
        .await
        .id();

    let response = app
        .request(
            "POST",
            &format!("/api/files/{folder}/shares"),
            Some(json!({})),
            Some(&owner),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_share_is_rejected_at_creation() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let file_id = upload_one(&app, &owner, "a.txt", b"a").await;

    let response = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({ "expiresAt": "2000-01-01T00:00:00Z" })),
            Some(&owner),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_share() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let (_, stranger) = app.sign_in("stranger@example.com");
    let file_id = upload_one(&app, &owner, "a.txt", b"a").await;

    let share_id = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({})),
            Some(&owner),
        )
        .await
        .id();
    let path = format!("/api/shares/{share_id}");

    let response = app.request("DELETE", &path, None, Some(&stranger)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("DELETE", &path, None, Some(&owner)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("DELETE", &path, None, Some(&owner)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let (status, _) = app.fetch(&format!("{path}/download"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trashed_file_is_hidden_from_link() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let file_id = upload_one(&app, &owner, "a.txt", b"a").await;
    let share_id = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/shares"),
            Some(json!({})),
            Some(&owner),
        )
        .await
        .id();

    app.request("DELETE", &format!("/api/files/{file_id}"), None, Some(&owner))
        .await;

    let (status, _) = app
        .fetch(&format!("/api/shares/{share_id}/download"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

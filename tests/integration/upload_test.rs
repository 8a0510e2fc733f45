//! Integration tests for batch upload and quota enforcement.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use filehub_database::UserStore;
use filehub_entity::user::plan::Plan;

#[tokio::test]
async fn test_batch_upload_into_folder() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");
    let folder = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "inbox" })),
            Some(&token),
        )
        .await
        .id();

    let response = app
        .upload(
            &token,
            Some(folder),
            &[
                ("a.txt", "text/plain", &b"alpha"[..]),
                ("b.json", "application/json", &b"{}"[..]),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let created = response.data().as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["parent_id"], folder.to_string());
    assert_eq!(created[0]["size_bytes"], 5);
    assert_eq!(created[1]["mime_type"], "application/json");
    assert!(created[0].get("blob_ref").is_none());

    let usage = app
        .request("GET", "/api/storage/usage", None, Some(&token))
        .await;
    assert_eq!(usage.data()["used_bytes"], 7);
    assert_eq!(usage.data()["plan"], "free");

    let listing = app
        .request(
            "GET",
            &format!("/api/files?folderId={folder}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(listing.data()["files"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_too_many_files_is_bad_request() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let response = app
        .upload(
            &token,
            None,
            &[
                ("1.txt", "text/plain", &b"1"[..]),
                ("2.txt", "text/plain", &b"2"[..]),
                ("3.txt", "text/plain", &b"3"[..]),
                ("4.txt", "text/plain", &b"4"[..]),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let response = app.upload(&token, None, &[]).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_over_size_limit_is_413() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");
    let big = vec![b'x'; 5000];

    let response = app
        .upload(&token, None, &[("big.bin", "application/octet-stream", &big[..])])
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.error_code(), "FILE_TOO_LARGE");
}

#[tokio::test]
async fn test_quota_exceeded_leaves_nothing_behind() {
    let app = helpers::TestApp::new().await;
    let (user_id, token) = app.sign_in("ana@example.com");
    app.request("GET", "/api/auth/user", None, Some(&token)).await;

    let limit = Plan::Free.storage_limit_bytes();
    UserStore::adjust_storage(app.db.as_ref(), user_id, limit - 10)
        .await
        .unwrap();

    let response = app
        .upload(
            &token,
            None,
            &[
                ("a.txt", "text/plain", &b"123456"[..]),
                ("b.txt", "text/plain", &b"123456"[..]),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::INSUFFICIENT_STORAGE);
    assert_eq!(response.error_code(), "QUOTA_EXCEEDED");

    let root = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(root.data()["files"], json!([]));
    let usage = app
        .request("GET", "/api/storage/usage", None, Some(&token))
        .await;
    assert_eq!(usage.data()["used_bytes"], limit - 10);
}

#[tokio::test]
async fn test_upload_into_missing_folder_is_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let response = app
        .upload(
            &token,
            Some(uuid::Uuid::new_v4()),
            &[("a.txt", "text/plain", &b"a"[..])],
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

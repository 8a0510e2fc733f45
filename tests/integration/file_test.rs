//! Integration tests for the file tree and trash lifecycle.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_list_files_unauthenticated() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/files", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/files", None, Some("not.a.token"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_request_creates_the_user() {
    let app = helpers::TestApp::new().await;
    let (user_id, token) = app.sign_in("ana@example.com");

    let response = app.request("GET", "/api/auth/user", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["id"], user_id.to_string());
    assert_eq!(response.data()["plan"], "free");
    assert_eq!(response.data()["storage_used"], 0);
}

#[tokio::test]
async fn test_folder_tree_listing_and_breadcrumb() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let a = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "A" })),
            Some(&token),
        )
        .await;
    assert_eq!(a.status, StatusCode::CREATED);
    let a_id = a.id();

    let b = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "  B  ", "parentId": a_id })),
            Some(&token),
        )
        .await;
    assert_eq!(b.status, StatusCode::CREATED);
    assert_eq!(b.data()["name"], "B");
    let b_id = b.id();

    let listing = app
        .request(
            "GET",
            &format!("/api/files?folderId={b_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.data()["files"], json!([]));
    let crumbs = listing.data()["breadcrumb"].as_array().unwrap();
    let names: Vec<_> = crumbs.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A", "B"]);

    let root = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(root.data()["files"].as_array().unwrap().len(), 1);
    assert_eq!(root.data()["breadcrumb"], json!([]));
}

#[tokio::test]
async fn test_empty_folder_name_is_bad_request() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let response = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "   " })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_file_not_found() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let response = app
        .request(
            "GET",
            "/api/files/00000000-0000-0000-0000-999999999999",
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_file_is_forbidden() {
    let app = helpers::TestApp::new().await;
    let (_, owner) = app.sign_in("owner@example.com");
    let (_, stranger) = app.sign_in("stranger@example.com");

    let folder = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "private" })),
            Some(&owner),
        )
        .await;
    let path = format!("/api/files/{}", folder.id());

    let response = app.request("GET", &path, None, Some(&stranger)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("PATCH", &path, Some(json!({ "name": "mine" })), Some(&stranger))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_patch_rename_star_and_move_to_root() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let parent = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "parent" })),
            Some(&token),
        )
        .await
        .id();
    let child = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "child", "parentId": parent })),
            Some(&token),
        )
        .await
        .id();
    let path = format!("/api/files/{child}");

    let renamed = app
        .request(
            "PATCH",
            &path,
            Some(json!({ "name": "kid", "isStarred": true })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.data()["name"], "kid");
    assert_eq!(renamed.data()["is_starred"], true);
    assert_eq!(renamed.data()["parent_id"], parent.to_string());

    let moved = app
        .request("PATCH", &path, Some(json!({ "parentId": null })), Some(&token))
        .await;
    assert_eq!(moved.status, StatusCode::OK);
    assert!(moved.data()["parent_id"].is_null());

    let starred = app
        .request("GET", "/api/files/starred", None, Some(&token))
        .await;
    assert_eq!(starred.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_move_into_own_descendant_is_rejected() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let a = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "A" })),
            Some(&token),
        )
        .await
        .id();
    let b = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "B", "parentId": a })),
            Some(&token),
        )
        .await
        .id();

    let response = app
        .request(
            "PATCH",
            &format!("/api/files/{a}"),
            Some(json!({ "parentId": b })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trash_restore_and_purge() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    let uploaded = app
        .upload(&token, None, &[("notes.txt", "text/plain", &b"hello world"[..])])
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED);
    let file_id = uploaded.data()[0]["id"].as_str().unwrap().to_string();

    let trashed = app
        .request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(trashed.status, StatusCode::OK);
    assert_eq!(trashed.data()["is_trashed"], true);

    let root = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(root.data()["files"], json!([]));
    let trash = app.request("GET", "/api/files/trash", None, Some(&token)).await;
    assert_eq!(trash.data().as_array().unwrap().len(), 1);

    // Trashed bytes still count against the quota.
    let usage = app
        .request("GET", "/api/storage/usage", None, Some(&token))
        .await;
    assert_eq!(usage.data()["used_bytes"], 11);

    let restored = app
        .request(
            "POST",
            &format!("/api/files/{file_id}/restore"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.data()["is_trashed"], false);

    app.request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    let emptied = app
        .request("DELETE", "/api/files/trash/empty", None, Some(&token))
        .await;
    assert_eq!(emptied.status, StatusCode::OK);
    assert_eq!(emptied.data()["nodes_removed"], 1);
    assert_eq!(emptied.data()["bytes_reclaimed"], 11);
    assert_eq!(emptied.data()["storage_used"], 0);

    let gone = app
        .request("GET", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_permanent_delete_of_non_empty_folder_is_rejected() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");
    let folder = app
        .request(
            "POST",
            "/api/files/folder",
            Some(json!({ "name": "keep" })),
            Some(&token),
        )
        .await
        .id();
    app.upload(&token, Some(folder), &[("a.txt", "text/plain", &b"abc"[..])])
        .await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/files/{folder}/permanent"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");

    let listing = app
        .request(
            "GET",
            &format!("/api/files?folderId={folder}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(listing.data()["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_activity_feed_records_actions() {
    let app = helpers::TestApp::new().await;
    let (_, token) = app.sign_in("ana@example.com");

    app.request(
        "POST",
        "/api/files/folder",
        Some(json!({ "name": "Docs" })),
        Some(&token),
    )
    .await;
    app.upload(&token, None, &[("a.txt", "text/plain", &b"a"[..])])
        .await;

    let feed = app.request("GET", "/api/activities", None, Some(&token)).await;
    assert_eq!(feed.status, StatusCode::OK);
    let actions: Vec<_> = feed
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, vec!["upload", "create_folder"]);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["storage"], "available");
    assert_eq!(response.data()["database"], "in-memory");
}

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tennis_notes::entity::{NewNote, Note, NotesState, ProgressCategory};
use tennis_notes::server::{router, AppState, AuthGate, FETCH_FAILED, SAVE_FAILED};
use tennis_notes::storage::{LocalStore, NoteStore, RemoteStore, StorageMode};
use tennis_notes::{NoteRepository, Result, TrackerError};

/// Remote store that rejects every write, and every read unless `readable`.
struct BrokenStore {
    readable: bool,
}

impl NoteStore for BrokenStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }

    fn load(&self, _user_id: &str) -> Result<NotesState> {
        if self.readable {
            Ok(NotesState::new())
        } else {
            Err(TrackerError::RemoteRead("connection refused".to_string()))
        }
    }

    fn insert(&self, _note: NewNote) -> Result<Note> {
        Err(TrackerError::RemoteWrite("connection refused".to_string()))
    }

    fn update_category(&self, _: &str, _: &str, _: ProgressCategory) -> Result<()> {
        Err(TrackerError::RemoteWrite("connection refused".to_string()))
    }

    fn update_text(&self, _: &str, _: &str, _: &str) -> Result<()> {
        Err(TrackerError::RemoteWrite("connection refused".to_string()))
    }

    fn delete(&self, _: &str, _: &str) -> Result<()> {
        Err(TrackerError::RemoteWrite("connection refused".to_string()))
    }

    fn upsert(&self, _: &str, _: &[Note]) -> Result<usize> {
        Err(TrackerError::RemoteWrite("connection refused".to_string()))
    }

    fn persist(&self, _state: &NotesState) -> Result<()> {
        Ok(())
    }
}

fn setup_app() -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    let local = LocalStore::open(tmp.path()).unwrap();
    let remote = RemoteStore::open(&tmp.path().join("notes.db")).unwrap();
    let repository = Arc::new(NoteRepository::new(local, remote));
    let app = router(AppState::new(repository, AuthGate::default()));
    (app, tmp)
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_home_is_public_and_reports_storage_mode() {
    let (app, _tmp) = setup_app();

    let (status, body) = send(&app, request(Method::GET, "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signed_in"], false);
    assert_eq!(body["storage"], "local");
    assert!(body["banner"].as_str().unwrap().contains("stored locally"));

    let (status, body) = send(&app, request(Method::GET, "/", Some("user_a"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signed_in"], true);
    assert_eq!(body["storage"], "remote");
    assert!(body["banner"].is_null());
}

#[tokio::test]
async fn test_ignored_route_needs_no_identity() {
    let (app, _tmp) = setup_app();

    let (status, body) = send(&app, request(Method::GET, "/api/public/shots", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    let shots = body.as_array().unwrap();
    assert_eq!(shots.len(), 3);
    assert_eq!(shots[2]["key"], "serve");
    assert_eq!(shots[2]["types"], json!(["Flat", "Slice", "Kick", "Second"]));
}

#[tokio::test]
async fn test_sign_in_entry_point_is_public() {
    let (app, _tmp) = setup_app();

    let (status, body) = send(&app, request(Method::GET, "/sign-in", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity_header"], "x-user-id");
}

#[tokio::test]
async fn test_protected_api_rejects_anonymous() {
    let (app, _tmp) = setup_app();

    let (status, _) = send(&app, request(Method::GET, "/api/notes", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request(Method::GET, "/api/notes", Some("   "), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_page_redirects_to_sign_in() {
    let (app, _tmp) = setup_app();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/tracker", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/sign-in");
}

#[tokio::test]
async fn test_note_lifecycle_over_http() {
    let (app, _tmp) = setup_app();
    let user = Some("user_a");

    // Add
    let (status, note) = send(
        &app,
        request(
            Method::POST,
            "/api/notes/items",
            user,
            Some(json!({"text": "Racquet back early", "shot_category": "forehand", "shot_type": "Approach"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["category"], "toWorkOn");
    assert_eq!(note["user_id"], "user_a");
    let id = note["id"].as_str().unwrap().to_string();

    // Move
    let (status, moved) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/notes/items/{}", id),
            user,
            Some(json!({"category": "currentFocus"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["category"], "currentFocus");

    // Edit
    let (status, edited) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/notes/items/{}", id),
            user,
            Some(json!({"text": "Racquet back before the bounce"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "Racquet back before the bounce");
    assert_eq!(edited["category"], "currentFocus");
    assert_eq!(edited["date"], note["date"]);

    // Grouped view
    let (status, groups) = send(&app, request(Method::GET, "/api/notes/groups", user, None)).await;
    assert_eq!(status, StatusCode::OK);
    let group = &groups["forehand-Approach"];
    assert_eq!(group["currentFocus"].as_array().unwrap().len(), 1);
    assert_eq!(group["toWorkOn"].as_array().unwrap().len(), 0);
    assert_eq!(group["mastered"].as_array().unwrap().len(), 0);

    // Other users see nothing
    let (_, rows) = send(&app, request(Method::GET, "/api/notes", Some("user_b"), None)).await;
    assert!(rows.as_array().unwrap().is_empty());

    // Delete is idempotent
    let uri = format!("/api/notes/items/{}", id);
    let (status, _) = send(&app, request(Method::DELETE, &uri, user, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::DELETE, &uri, user, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, rows) = send(&app, request(Method::GET, "/api/notes", user, None)).await;
    assert!(rows.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_rejects_blank_text_and_bad_shot() {
    let (app, _tmp) = setup_app();

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/notes/items",
            Some("user_a"),
            Some(json!({"text": "  ", "shot_category": "serve", "shot_type": "Flat"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/notes/items",
            Some("user_a"),
            Some(json!({"text": "Toss", "shot_category": "serve", "shot_type": "Volley"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_upsert_forces_caller_ownership() {
    let (app, _tmp) = setup_app();

    let rows = json!([{
        "id": "imported-1",
        "text": "Imported note",
        "date": "2024-03-01T10:00:00.000Z",
        "category": "mastered",
        "shot_category": "backhand",
        "shot_type": "Dropshot",
        "user_id": "someone_else"
    }]);

    let (status, body) = send(&app, request(Method::POST, "/api/notes", Some("user_a"), Some(rows))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, rows) = send(&app, request(Method::GET, "/api/notes", Some("user_a"), None)).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "imported-1");
    assert_eq!(rows[0]["user_id"], "user_a");
    assert_eq!(rows[0]["category"], "mastered");
}

#[tokio::test]
async fn test_update_unknown_note_is_not_found() {
    let (app, _tmp) = setup_app();

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            "/api/notes/items/missing",
            Some("user_a"),
            Some(json!({"category": "mastered"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_rejects_text_and_category_together() {
    let (app, _tmp) = setup_app();
    let user = Some("user_a");

    let (_, note) = send(
        &app,
        request(
            Method::POST,
            "/api/notes/items",
            user,
            Some(json!({"text": "Pronate", "shot_category": "serve", "shot_type": "Flat"})),
        ),
    )
    .await;
    let uri = format!("/api/notes/items/{}", note["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            user,
            Some(json!({"text": "Pronate late", "category": "mastered"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was applied
    let (_, rows) = send(&app, request(Method::GET, "/api/notes", user, None)).await;
    assert_eq!(rows[0]["text"], "Pronate");
    assert_eq!(rows[0]["category"], "toWorkOn");
}

fn broken_app(readable: bool) -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    let local = LocalStore::open(tmp.path()).unwrap();
    let repository = Arc::new(NoteRepository::new(local, BrokenStore { readable }));
    (router(AppState::new(repository, AuthGate::default())), tmp)
}

#[tokio::test]
async fn test_read_failure_reports_fetch_error() {
    let (app, _tmp) = broken_app(false);

    let (status, body) = send_raw(&app, request(Method::GET, "/api/notes", Some("user_a"), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, FETCH_FAILED);

    let (status, body) =
        send_raw(&app, request(Method::GET, "/api/notes/groups", Some("user_a"), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, FETCH_FAILED);
}

#[tokio::test]
async fn test_write_failure_reports_save_error() {
    let (app, _tmp) = broken_app(true);

    let (status, body) = send_raw(
        &app,
        request(
            Method::POST,
            "/api/notes/items",
            Some("user_a"),
            Some(json!({"text": "Toss", "shot_category": "serve", "shot_type": "Kick"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, SAVE_FAILED);
}

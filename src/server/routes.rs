use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    error::{ApiError, SAVE_FAILED},
    gate::{SIGN_IN_PATH, SIGN_UP_PATH},
    AppState,
};
use crate::auth::AuthState;
use crate::entity::{Note, NotesState, ProgressCategory, ShotCategory, ShotKey};
use crate::repository::Outcome;
use crate::tracker::LOCAL_STORAGE_BANNER;

#[derive(Serialize)]
pub struct HomeResponse {
    pub signed_in: bool,
    pub storage: String,
    pub banner: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ShotGroup {
    pub key: ShotCategory,
    pub name: &'static str,
    pub types: Vec<String>,
}

#[derive(Deserialize)]
pub struct AddNoteRequest {
    pub text: String,
    pub shot_category: String,
    pub shot_type: String,
}

#[derive(Deserialize)]
pub struct UpdateNoteRequest {
    pub category: Option<ProgressCategory>,
    pub text: Option<String>,
}

pub async fn home_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
) -> impl IntoResponse {
    let signed_in = auth.is_signed_in();
    Json(HomeResponse {
        signed_in,
        storage: state.repository.mode_for(&auth).to_string(),
        banner: (!signed_in).then_some(LOCAL_STORAGE_BANNER),
    })
}

pub async fn sign_in_handler(State(state): State<AppState>) -> impl IntoResponse {
    entry_point(&state, SIGN_IN_PATH)
}

pub async fn sign_up_handler(State(state): State<AppState>) -> impl IntoResponse {
    entry_point(&state, SIGN_UP_PATH)
}

/// Sign-in and sign-up happen at the identity provider; these only say how it reaches us.
fn entry_point(state: &AppState, path: &str) -> Json<serde_json::Value> {
    Json(json!({
        "path": path,
        "provider": "external",
        "identity_header": state.gate.header(),
    }))
}

pub async fn shots_handler() -> impl IntoResponse {
    let shots: Vec<ShotGroup> = ShotCategory::ALL
        .into_iter()
        .map(|category| ShotGroup {
            key: category,
            name: category.name(),
            types: category.shot_types().iter().map(|t| t.to_string()).collect(),
        })
        .collect();
    Json(shots)
}

pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

pub async fn list_notes_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.repository.try_load_notes(&auth)?;
    Ok(Json(notes.into_notes()))
}

pub async fn upsert_notes_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
    Json(notes): Json<Vec<Note>>,
) -> Result<impl IntoResponse, ApiError> {
    state.repository.upsert_notes(&notes, &auth)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn grouped_notes_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
) -> Result<Json<NotesState>, ApiError> {
    Ok(Json(state.repository.try_load_notes(&auth)?))
}

pub async fn add_note_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
    Json(payload): Json<AddNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shot = ShotKey::parse(&payload.shot_category, &payload.shot_type)?;
    if payload.text.trim().is_empty() {
        return Err(ApiError::MalformedPayload("note text is empty".to_string()));
    }

    let mut notes = state.repository.try_load_notes(&auth)?;
    let note = state
        .repository
        .add_note(&mut notes, &payload.text, shot, &auth)
        .ok_or(ApiError::Internal(SAVE_FAILED))?;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    if payload.category.is_some() == payload.text.is_some() {
        return Err(ApiError::MalformedPayload(
            "expected either a category or text".to_string(),
        ));
    }

    let mut notes = state.repository.try_load_notes(&auth)?;
    let (shot, mut category) = locate(&notes, &id)?;

    if let Some(text) = payload.text.as_deref() {
        if text.trim().is_empty() {
            return Err(ApiError::MalformedPayload("note text is empty".to_string()));
        }
        let outcome = state
            .repository
            .edit_note(&mut notes, shot, &id, category, text, &auth);
        ensure_applied(outcome)?;
    }

    if let Some(to) = payload.category {
        let outcome = state
            .repository
            .move_note(&mut notes, shot, &id, category, to, &auth);
        ensure_applied(outcome)?;
        category = to;
    }

    notes
        .group(&shot)
        .and_then(|g| g.find(category, &id))
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub async fn delete_note_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut notes = state.repository.try_load_notes(&auth)?;
    let Ok((shot, category)) = locate(&notes, &id) else {
        return Ok(StatusCode::NO_CONTENT);
    };

    let outcome = state
        .repository
        .delete_note(&mut notes, shot, &id, category, &auth);
    match outcome {
        Outcome::Failed => Err(ApiError::Internal(SAVE_FAILED)),
        Outcome::Applied | Outcome::NoOp => Ok(StatusCode::NO_CONTENT),
    }
}

/// Exact-id lookup; prefixes are a CLI convenience only.
fn locate(notes: &NotesState, id: &str) -> Result<(ShotKey, ProgressCategory), ApiError> {
    match notes.resolve(id) {
        Ok((shot, category, found)) if found == id => Ok((shot, category)),
        _ => Err(ApiError::NotFound(id.to_string())),
    }
}

fn ensure_applied(outcome: Outcome) -> Result<(), ApiError> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::NoOp => Err(ApiError::MalformedPayload("nothing to change".to_string())),
        Outcome::Failed => Err(ApiError::Internal(SAVE_FAILED)),
    }
}

//! Handlers for presskit link management and public redemption.

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use backstage_core::types::DbId;
use backstage_db::models::presskit::{GenerateLinkRequest, TrackEventRequest};

use crate::error::AppResult;
use crate::middleware::client::ClientContext;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Staff link management
// ---------------------------------------------------------------------------

/// POST /presskits/{id}/generate-link
pub async fn generate_link(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(presskit_id): Path<DbId>,
    Json(input): Json<GenerateLinkRequest>,
) -> AppResult<impl IntoResponse> {
    let issued = state
        .presskits
        .generate_link(presskit_id, input, &staff.actor)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: issued })))
}

/// GET /presskits/{id}/links
pub async fn list_links(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(presskit_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let links = state.presskits.list_links(presskit_id, &staff.actor).await?;
    Ok(Json(DataResponse { data: links }))
}

/// PATCH /presskits/{id}/links/{link_id}/revoke
pub async fn revoke_link(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path((presskit_id, link_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let link = state
        .presskits
        .revoke(presskit_id, link_id, &staff.actor)
        .await?;
    Ok(Json(DataResponse { data: link }))
}

/// GET /presskits/{id}/links/{link_id}/logs
pub async fn access_log(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path((presskit_id, link_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let logs = state
        .presskits
        .access_log(presskit_id, link_id, &staff.actor)
        .await?;
    Ok(Json(DataResponse { data: logs }))
}

// ---------------------------------------------------------------------------
// Public redemption
// ---------------------------------------------------------------------------

/// GET /public/presskits/{token}
///
/// Counts one view against the link's quota.
pub async fn view(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ClientContext(client): ClientContext,
) -> AppResult<impl IntoResponse> {
    let view = state.presskits.view(&token, client).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /public/presskits/{token}/track
pub async fn track(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ClientContext(client): ClientContext,
    Json(input): Json<TrackEventRequest>,
) -> AppResult<impl IntoResponse> {
    state.presskits.track_event(&token, input, client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /public/presskits/{token}/download
pub async fn download(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ClientContext(client): ClientContext,
) -> AppResult<Response> {
    let document = state.presskits.download_document(&token, client).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.filename.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(document.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

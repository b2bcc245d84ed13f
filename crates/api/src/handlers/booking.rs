//! Handlers for booking intake, the staff workflow and contract signing.
//!
//! Public routes (`/public/bookings/...`) take no session; the contract
//! routes there are gated by the capability token in the path instead.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use backstage_core::types::DbId;
use backstage_db::models::booking::{
    CreateCommentRequest, SendContractRequest, SignContractRequest, SubmitBookingRequest,
    UpdateContractRequest, UpdateStatusRequest,
};
use backstage_services::booking::BookingListQuery;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientContext;
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Public intake and signing
// ---------------------------------------------------------------------------

/// POST /public/bookings
///
/// Submit a booking request from the public form.
pub async fn submit_public(
    State(state): State<AppState>,
    ClientContext(client): ClientContext,
    Json(input): Json<SubmitBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .bookings
        .submit(input, client.ip_address, None)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// GET /public/bookings/contracts/{token}
pub async fn contract_summary(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let summary = state.bookings.contract_summary(&token).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /public/bookings/contracts/{token}/sign
pub async fn sign_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<SignContractRequest>,
) -> AppResult<impl IntoResponse> {
    let signed = state
        .bookings
        .sign_by_token(&token, &input.signature)
        .await?;
    Ok(Json(DataResponse { data: signed }))
}

// ---------------------------------------------------------------------------
// Authenticated bookings
// ---------------------------------------------------------------------------

/// POST /bookings
///
/// Submit a booking from a dashboard session.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    ClientContext(client): ClientContext,
    Json(input): Json<SubmitBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .bookings
        .submit(input, client.ip_address, Some(&auth.actor))
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// GET /bookings
///
/// Paginated list, scoped to what the caller may see.
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookingListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = state.bookings.list(params, &auth.actor).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /bookings/{id}
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let booking = state.bookings.get(id, &auth.actor).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// DELETE /bookings/{id}
///
/// Delete a booking with its comments, history and contract. Admin only.
pub async fn delete_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.bookings.delete(id, &admin.actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /bookings/{id}/status
pub async fn update_status(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let booking = state.bookings.update_status(id, input, &staff.actor).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// GET /bookings/{id}/history
pub async fn list_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let history = state.bookings.history(id, &auth.actor).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// GET /bookings/{id}/comments
pub async fn list_comments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let comments = state.bookings.list_comments(id, &auth.actor).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /bookings/{id}/comments
pub async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    let comment = state.bookings.add_comment(id, input, &auth.actor).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// POST /bookings/{id}/send-contract
///
/// Record the quote and email the requester a signing link.
pub async fn send_contract(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendContractRequest>,
) -> AppResult<impl IntoResponse> {
    let link = state.bookings.send_contract(id, input, &staff.actor).await?;
    Ok(Json(DataResponse { data: link }))
}

/// POST /bookings/{id}/sign
pub async fn sign_direct(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SignContractRequest>,
) -> AppResult<impl IntoResponse> {
    let signed = state
        .bookings
        .sign_direct(id, &input.signature, &auth.actor)
        .await?;
    Ok(Json(DataResponse { data: signed }))
}

/// GET /bookings/{id}/contract
pub async fn get_contract(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let contract = state.bookings.contract(id, &auth.actor).await?;
    Ok(Json(DataResponse { data: contract }))
}

/// PATCH /bookings/{id}/contract
pub async fn update_contract(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateContractRequest>,
) -> AppResult<impl IntoResponse> {
    let contract = state
        .bookings
        .update_contract(id, input, &auth.actor)
        .await?;
    Ok(Json(DataResponse { data: contract }))
}

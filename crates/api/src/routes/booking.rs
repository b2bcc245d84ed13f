//! Route definitions for bookings and their contracts.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::booking;
use crate::state::AppState;

/// Routes mounted at `/bookings` (session required).
///
/// ```text
/// GET    /                      -> list_bookings (?status, artistId, limit, offset)
/// POST   /                      -> submit
/// GET    /{id}                  -> get_booking
/// DELETE /{id}                  -> delete_booking (admin)
/// PATCH  /{id}/status           -> update_status (staff)
/// GET    /{id}/history          -> list_history
/// GET    /{id}/comments         -> list_comments
/// POST   /{id}/comments         -> add_comment
/// POST   /{id}/send-contract    -> send_contract (staff)
/// POST   /{id}/sign             -> sign_direct
/// GET    /{id}/contract         -> get_contract
/// PATCH  /{id}/contract         -> update_contract
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(booking::list_bookings).post(booking::submit))
        .route(
            "/{id}",
            get(booking::get_booking).delete(booking::delete_booking),
        )
        .route("/{id}/status", patch(booking::update_status))
        .route("/{id}/history", get(booking::list_history))
        .route(
            "/{id}/comments",
            get(booking::list_comments).post(booking::add_comment),
        )
        .route("/{id}/send-contract", post(booking::send_contract))
        .route("/{id}/sign", post(booking::sign_direct))
        .route(
            "/{id}/contract",
            get(booking::get_contract).patch(booking::update_contract),
        )
}

/// Routes mounted at `/public/bookings` (no session).
///
/// ```text
/// POST   /                          -> submit_public
/// GET    /contracts/{token}         -> contract_summary
/// POST   /contracts/{token}/sign    -> sign_by_token
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", post(booking::submit_public))
        .route("/contracts/{token}", get(booking::contract_summary))
        .route("/contracts/{token}/sign", post(booking::sign_by_token))
}

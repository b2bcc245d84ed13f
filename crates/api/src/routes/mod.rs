pub mod booking;
pub mod health;
pub mod presskit;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings                                  list, submit (session)
/// /bookings/{id}                             get, delete (admin)
/// /bookings/{id}/status                      status change (staff)
/// /bookings/{id}/history                     status history
/// /bookings/{id}/comments                    list, add
/// /bookings/{id}/send-contract               issue signing link (staff)
/// /bookings/{id}/sign                        sign from a session
/// /bookings/{id}/contract                    get, edit
///
/// /presskits/{id}/generate-link              issue share link (staff)
/// /presskits/{id}/links                      list links (staff)
/// /presskits/{id}/links/{link_id}/revoke     revoke (staff)
/// /presskits/{id}/links/{link_id}/logs       access log (staff)
///
/// /public/bookings                           public intake
/// /public/bookings/contracts/{token}         contract summary
/// /public/bookings/contracts/{token}/sign    sign by token
///
/// /public/presskits/{token}                  view
/// /public/presskits/{token}/download         download
/// /public/presskits/{token}/track            engagement event
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking::router())
        .nest("/presskits", presskit::router())
        .nest("/public/bookings", booking::public_router())
        .nest("/public/presskits", presskit::public_router())
}

//! Notification template names.
//!
//! Each name must have a renderer in `backstage_events::templates`.

pub const BOOKING_RECEIVED: &str = "booking_received";
pub const BOOKING_STATUS_CHANGED: &str = "booking_status_changed";
pub const CONTRACT_SIGNATURE_REQUEST: &str = "contract_signature_request";
pub const CONTRACT_ARTIST_NOTICE: &str = "contract_artist_notice";
pub const CONTRACT_SIGNED: &str = "contract_signed";
pub const BOOKING_CONFIRMED_ARTIST: &str = "booking_confirmed_artist";
pub const PRESSKIT_SHARED: &str = "presskit_shared";
pub const PRESSKIT_VIEWED: &str = "presskit_viewed";
pub const PRESSKIT_DOWNLOADED: &str = "presskit_downloaded";

/// Every known template name.
pub const ALL: [&str; 9] = [
    BOOKING_RECEIVED,
    BOOKING_STATUS_CHANGED,
    CONTRACT_SIGNATURE_REQUEST,
    CONTRACT_ARTIST_NOTICE,
    CONTRACT_SIGNED,
    BOOKING_CONFIRMED_ARTIST,
    PRESSKIT_SHARED,
    PRESSKIT_VIEWED,
    PRESSKIT_DOWNLOADED,
];

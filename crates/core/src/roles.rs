//! Role names and the closed [`Actor`] union used for every access check.
//!
//! Role names must match the values stored in `users.role` and carried in
//! session tokens.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_ORGANIZER: &str = "organizer";
pub const ROLE_PROMOTER: &str = "promoter";
pub const ROLE_ARTIST: &str = "artist";

/// An authenticated principal acting on the platform.
///
/// Built once from session claims; handlers and services match on the
/// variant instead of probing loose role strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Admin { user_id: DbId },
    Manager { user_id: DbId },
    Organizer { user_id: DbId, email: String },
    Promoter { user_id: DbId, email: String },
    Artist { user_id: DbId, artist_id: DbId },
}

impl Actor {
    /// Build an actor from session claim fields.
    ///
    /// Organizer and promoter sessions must carry an email; artist sessions
    /// must carry the linked artist id. Unknown roles are rejected.
    pub fn from_claims(
        user_id: DbId,
        role: &str,
        email: Option<&str>,
        artist_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        let require_email = || {
            email
                .filter(|e| !e.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| CoreError::Unauthorized("Session is missing an email".into()))
        };

        match role {
            ROLE_ADMIN => Ok(Self::Admin { user_id }),
            ROLE_MANAGER => Ok(Self::Manager { user_id }),
            ROLE_ORGANIZER => Ok(Self::Organizer {
                user_id,
                email: require_email()?,
            }),
            ROLE_PROMOTER => Ok(Self::Promoter {
                user_id,
                email: require_email()?,
            }),
            ROLE_ARTIST => {
                let artist_id = artist_id.ok_or_else(|| {
                    CoreError::Forbidden("Artist account is not linked to an artist".into())
                })?;
                Ok(Self::Artist { user_id, artist_id })
            }
            other => Err(CoreError::Unauthorized(format!("Unknown role '{other}'"))),
        }
    }

    pub fn user_id(&self) -> DbId {
        match self {
            Self::Admin { user_id }
            | Self::Manager { user_id }
            | Self::Organizer { user_id, .. }
            | Self::Promoter { user_id, .. }
            | Self::Artist { user_id, .. } => *user_id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::Admin { .. } => ROLE_ADMIN,
            Self::Manager { .. } => ROLE_MANAGER,
            Self::Organizer { .. } => ROLE_ORGANIZER,
            Self::Promoter { .. } => ROLE_PROMOTER,
            Self::Artist { .. } => ROLE_ARTIST,
        }
    }

    /// Admins and managers are agency staff.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin { .. } | Self::Manager { .. })
    }

    /// Email the actor books under, for organizer and promoter accounts.
    pub fn requester_email(&self) -> Option<&str> {
        match self {
            Self::Organizer { email, .. } | Self::Promoter { email, .. } => Some(email),
            _ => None,
        }
    }

    /// Linked artist for artist accounts.
    pub fn artist_id(&self) -> Option<DbId> {
        match self {
            Self::Artist { artist_id, .. } => Some(*artist_id),
            _ => None,
        }
    }
}

/// Compare two email addresses the way requester matching does everywhere.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Check that `actor` may see and act on a booking.
///
/// Staff always pass. Organizers and promoters pass only for bookings they
/// requested; artists only for bookings of their linked artist.
pub fn ensure_booking_access(
    actor: &Actor,
    booking_artist_id: DbId,
    requester_email: &str,
) -> Result<(), CoreError> {
    let allowed = match actor {
        Actor::Admin { .. } | Actor::Manager { .. } => true,
        Actor::Organizer { email, .. } | Actor::Promoter { email, .. } => {
            emails_match(email, requester_email)
        }
        Actor::Artist { artist_id, .. } => *artist_id == booking_artist_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this booking".into(),
        ))
    }
}

/// Check that `actor` is agency staff.
pub fn ensure_staff(actor: &Actor) -> Result<(), CoreError> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin or Manager role required".into()))
    }
}

//! Booking status model, transition policy, reference codes and input rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    New,
    Reviewing,
    Scored,
    Quoted,
    Negotiating,
    Confirmed,
    Declined,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        Self::New,
        Self::Reviewing,
        Self::Scored,
        Self::Quoted,
        Self::Negotiating,
        Self::Confirmed,
        Self::Declined,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewing => "reviewing",
            Self::Scored => "scored",
            Self::Quoted => "quoted",
            Self::Negotiating => "negotiating",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
        }
    }

    /// Declined and cancelled bookings are closed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid booking status: '{s}'")))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Transition policy
// ---------------------------------------------------------------------------

/// Which staff-directed status writes are accepted.
///
/// Under both policies `confirmed` is never a valid target: only a contract
/// signature confirms a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any target except `confirmed`.
    #[default]
    Permissive,
    /// Only the edges listed in [`allowed_transitions`].
    Strict,
}

impl FromStr for TransitionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(CoreError::Validation(format!(
                "Unknown transition policy '{other}' (expected 'permissive' or 'strict')"
            ))),
        }
    }
}

/// Staff-directed edges for [`TransitionPolicy::Strict`].
pub fn allowed_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;
    match from {
        New => &[Reviewing, Scored, Declined, Cancelled],
        Reviewing => &[Scored, Quoted, Declined, Cancelled],
        Scored => &[Reviewing, Quoted, Declined, Cancelled],
        Quoted => &[Negotiating, Declined, Cancelled],
        Negotiating => &[Quoted, Declined, Cancelled],
        Confirmed => &[Cancelled],
        Declined | Cancelled => &[],
    }
}

impl TransitionPolicy {
    /// Check a staff-directed status write.
    pub fn check(self, from: BookingStatus, to: BookingStatus) -> Result<(), CoreError> {
        if to == BookingStatus::Confirmed {
            return Err(CoreError::BadRequest(
                "A booking can only be confirmed by signing its contract".into(),
            ));
        }
        match self {
            Self::Permissive => Ok(()),
            Self::Strict if allowed_transitions(from).contains(&to) => Ok(()),
            Self::Strict => Err(CoreError::BadRequest(format!(
                "Transition from '{from}' to '{to}' is not allowed"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference codes
// ---------------------------------------------------------------------------

/// Prefix of every booking reference code.
pub const REFERENCE_PREFIX: &str = "SAU";

/// Format a reference code, e.g. `SAU-2026-0042`.
pub fn format_reference_code(year: i32, sequence: i64) -> String {
    format!("{REFERENCE_PREFIX}-{year}-{sequence:04}")
}

// ---------------------------------------------------------------------------
// Input rules
// ---------------------------------------------------------------------------

/// Event types with a dedicated score; anything else scores as `other`.
pub const EVENT_TYPES: [&str; 5] = ["festival", "club", "corporate", "private", "other"];

/// Fields a submission cannot omit: requester name and email, artist, event
/// date, event type and event city.
pub const REQUIRED_FORM_FIELDS: usize = 6;

/// Longest accepted typed signature.
pub const MAX_SIGNATURE_LENGTH: usize = 200;

/// Normalize a typed signature, rejecting blank or oversized input.
pub fn normalize_signature(signature: &str) -> Result<String, CoreError> {
    let trimmed = signature.trim();
    if trimmed.is_empty() {
        return Err(CoreError::BadRequest("Signature must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_SIGNATURE_LENGTH {
        return Err(CoreError::BadRequest(format!(
            "Signature must be at most {MAX_SIGNATURE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

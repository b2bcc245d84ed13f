//! Presskit link rules: statuses, access actions and the redemption check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Presskit publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresskitStatus {
    Draft,
    Active,
    Archived,
}

impl PresskitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for PresskitStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(CoreError::Validation(format!(
                "Invalid presskit status: '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for PresskitStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Kind of event recorded in the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    View,
    Download,
    SectionView,
}

impl AccessAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Download => "download",
            Self::SectionView => "section_view",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "download" => Ok(Self::Download),
            "section_view" => Ok(Self::SectionView),
            other => Err(CoreError::Validation(format!(
                "Invalid access action: '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for AccessAction {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Redemption check
// ---------------------------------------------------------------------------

/// Stored state of a link relevant to redemption.
#[derive(Debug, Clone, Copy)]
pub struct LinkState {
    pub is_revoked: bool,
    pub expires_at: Timestamp,
    pub current_views: i32,
    pub max_views: Option<i32>,
}

/// Why a link was refused. Logged, never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDenial {
    Revoked,
    Expired,
    QuotaExhausted,
}

impl LinkDenial {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::QuotaExhausted => "quota_exhausted",
        }
    }
}

/// Decide whether a stored link may be redeemed at `now`.
///
/// The view quota is only checked when `enforce_view_limit` is set, so that
/// telemetry on an already-opened page does not count against it.
pub fn check_link(
    state: &LinkState,
    enforce_view_limit: bool,
    now: Timestamp,
) -> Result<(), LinkDenial> {
    if state.is_revoked {
        return Err(LinkDenial::Revoked);
    }
    if state.expires_at <= now {
        return Err(LinkDenial::Expired);
    }
    if enforce_view_limit {
        if let Some(max) = state.max_views {
            if state.current_views >= max {
                return Err(LinkDenial::QuotaExhausted);
            }
        }
    }
    Ok(())
}

/// Views left on a link, if it has a quota.
pub fn remaining_views(current_views: i32, max_views: Option<i32>) -> Option<i32> {
    max_views.map(|max| (max - current_views).max(0))
}

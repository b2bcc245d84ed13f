//! Capability tokens: signed, time-boxed bearer credentials for one narrow action.
//!
//! A token is an HS256 JWT whose claims carry a `purpose` discriminator plus
//! the identifiers that purpose needs. There is no server-side registry;
//! anything revocable must be checked against a stored record after
//! [`CapabilitySigner::verify`] succeeds.
//!
//! Verification failures are deliberately indistinguishable: bad signature,
//! expiry, malformed input and wrong purpose all yield
//! [`CapabilityError::Invalid`].

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Generic message for every verification failure.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Default lifetime of a contract-signing link (7 days).
pub const DEFAULT_CONTRACT_TTL_HOURS: i64 = 7 * 24;

/// Default lifetime of a presskit-access link (30 days).
pub const DEFAULT_PRESSKIT_TTL_HOURS: i64 = 30 * 24;

// ---------------------------------------------------------------------------
// Capability payloads
// ---------------------------------------------------------------------------

/// The action a token grants, tagged by `purpose` in the claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum Capability {
    /// Sign the contract of one booking, bound to the requester email at issue time.
    BookingContract {
        booking_id: DbId,
        requester_email: String,
    },
    /// View one presskit through a stored link.
    PresskitAccess { presskit_id: DbId },
}

/// Purpose discriminator without payload, for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    BookingContract,
    PresskitAccess,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookingContract => "booking_contract",
            Self::PresskitAccess => "presskit_access",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Capability {
    pub fn purpose(&self) -> Purpose {
        match self {
            Self::BookingContract { .. } => Purpose::BookingContract,
            Self::PresskitAccess { .. } => Purpose::PresskitAccess,
        }
    }
}

/// Full claim set on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct CapabilityClaims {
    #[serde(flatten)]
    capability: Capability,
    iat: i64,
    exp: i64,
    jti: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Any verification failure. Carries no detail on purpose.
    #[error("Invalid or expired token")]
    Invalid,

    #[error("Failed to sign capability token: {0}")]
    Signing(String),
}

impl From<CapabilityError> for CoreError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::Invalid => CoreError::Forbidden(INVALID_TOKEN_MESSAGE.into()),
            CapabilityError::Signing(msg) => CoreError::Internal(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// A freshly minted token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Issues and verifies capability tokens with one HMAC secret.
#[derive(Clone)]
pub struct CapabilitySigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for CapabilitySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySigner").finish_non_exhaustive()
    }
}

impl CapabilitySigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token for `capability` that expires `ttl` from now.
    pub fn issue(
        &self,
        capability: &Capability,
        ttl: Duration,
    ) -> Result<IssuedToken, CapabilityError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = CapabilityClaims {
            capability: capability.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CapabilityError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the embedded capability.
    pub fn verify(&self, token: &str) -> Result<Capability, CapabilityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<CapabilityClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.capability)
            .map_err(|_| CapabilityError::Invalid)
    }

    /// Verify a token and require a specific purpose.
    pub fn verify_purpose(
        &self,
        token: &str,
        purpose: Purpose,
    ) -> Result<Capability, CapabilityError> {
        let capability = self.verify(token)?;
        if capability.purpose() != purpose {
            return Err(CapabilityError::Invalid);
        }
        Ok(capability)
    }
}

//! Session authentication primitives.
//!
//! - [`jwt`] -- access-token validation and the claims-to-[`Actor`] mapping.
//!
//! [`Actor`]: backstage_core::roles::Actor

pub mod jwt;

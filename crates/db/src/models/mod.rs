//! Row structs, insert DTOs and request bodies.
//!
//! Row structs derive `FromRow` + `Serialize`; request bodies derive
//! `Deserialize` + `Validate` and use camelCase on the wire.

pub mod artist;
pub mod booking;
pub mod presskit;

//! Backstage domain core: booking rules, lead scoring, capability tokens,
//! contract documents, presskit link rules and collaborator interfaces.
//!
//! Nothing in this crate performs I/O.

pub mod booking;
pub mod capability;
pub mod collaborators;
pub mod contract;
pub mod error;
pub mod hashing;
pub mod pagination;
pub mod presskit;
pub mod roles;
pub mod scoring;
pub mod templates;
pub mod types;

//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the session [`Actor`](backstage_core::roles::Actor) from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireStaff`] -- requires `admin` or `manager`.
//! - [`client::ClientContext`] -- caller IP and user agent for access logs.

pub mod auth;
pub mod client;
pub mod rbac;

//! Booking lifecycle and presskit sharing services.
//!
//! Services are written against the storage traits in [`store`] and the
//! collaborator traits in `backstage_core::collaborators`, so they run
//! unchanged over PostgreSQL ([`pg::PgStore`]) or, with the `memory`
//! feature, over [`memory::MemoryStore`].

pub mod audit;
pub mod booking;
pub mod document;
pub mod files;
pub mod notify;
pub mod pg;
pub mod presskit;
pub mod store;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use booking::{BookingLifecycle, BookingLifecycleConfig};
pub use presskit::{PresskitAccessController, PresskitConfig};

use backstage_core::error::CoreError;
use validator::Validate;

/// Run `validator` rules on a request body.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}

//! Notification delivery for booking and presskit events.
//!
//! - [`templates`] -- turns a template name plus JSON data into a subject
//!   and plain-text body.
//! - [`EmailDelivery`] -- SMTP delivery via `lettre`.
//! - [`LogDispatcher`] -- writes rendered messages to the log; used when
//!   SMTP is not configured.
//!
//! Both dispatchers implement
//! [`NotificationDispatcher`](backstage_core::collaborators::NotificationDispatcher).

pub mod delivery;
pub mod templates;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::log::LogDispatcher;
pub use templates::{render, RenderedMessage};

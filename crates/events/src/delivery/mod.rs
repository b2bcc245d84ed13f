//! Delivery channels for rendered notifications.

pub mod email;
pub mod log;

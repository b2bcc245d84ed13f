pub mod booking;
pub mod presskit;

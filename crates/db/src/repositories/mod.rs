//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod artist_repo;
pub mod booking_comment_repo;
pub mod booking_contract_repo;
pub mod booking_repo;
pub mod booking_status_history_repo;
pub mod presskit_access_log_repo;
pub mod presskit_link_repo;
pub mod presskit_repo;

pub use artist_repo::ArtistRepo;
pub use booking_comment_repo::BookingCommentRepo;
pub use booking_contract_repo::BookingContractRepo;
pub use booking_repo::BookingRepo;
pub use booking_status_history_repo::BookingStatusHistoryRepo;
pub use presskit_access_log_repo::PresskitAccessLogRepo;
pub use presskit_link_repo::PresskitLinkRepo;
pub use presskit_repo::PresskitRepo;

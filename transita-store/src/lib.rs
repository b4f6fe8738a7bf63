pub mod app_config;
pub mod booking_repo;
pub mod directory_repo;
pub mod ledger_repo;

pub use booking_repo::InMemoryBookingStore;
pub use directory_repo::{InMemoryRouteDirectory, InMemoryUserDirectory};
pub use ledger_repo::InMemoryCancelledLedger;

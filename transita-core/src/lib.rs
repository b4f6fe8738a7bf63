pub mod booking;
pub mod events;
pub mod identity;
pub mod notify;
pub mod repository;
pub mod route;

pub mod archive;
pub mod bus;
pub mod retry;

pub use archive::{ArchivedEvent, EventArchive};
pub use bus::{EventBus, EventHandler, FailedDelivery, HandlerError};
pub use retry::RetryPolicy;

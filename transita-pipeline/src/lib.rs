pub mod cancellation;
pub mod confirmation;
pub mod email;
pub mod transition;
pub mod worker;

pub use cancellation::CancellationHandler;
pub use confirmation::ConfirmationHandler;
pub use email::EmailNotifier;
pub use transition::{StatusTransitionService, TransitionContext, TransitionError};
pub use worker::{run_worker, BookingWorker, Disposition};

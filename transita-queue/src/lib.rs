pub mod dead_letter;
pub mod queue;

pub use dead_letter::{DeadLetter, DeadLetterSink};
pub use queue::{Delivery, EnqueueOutcome, QueueConfig, QueueError, SubmissionQueue};

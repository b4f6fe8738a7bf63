use crate::dead_letter::{DeadLetter, DeadLetterSink};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use transita_core::booking::BookingSubmission;
use uuid::Uuid;

/// Queue tuning knobs. Defaults mirror the production intake queue: 120 s
/// visibility window, 5 min content-dedup interval, 5 receives before a
/// submission is written off to the dead-letter sink.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub visibility_timeout: Duration,
    pub dedup_window: Duration,
    pub max_receive_count: u32,
    pub poll_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(120),
            dedup_window: Duration::from_secs(300),
            max_receive_count: 5,
            poll_interval: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// Same dedup key seen within the dedup window; collapsed to the
    /// earlier message.
    Deduplicated,
}

/// A leased message. The submission stays invisible to other consumers until
/// it is acked, released, rejected, or the visibility window lapses.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub submission: BookingSubmission,
    pub receipt: Uuid,
    pub attempt: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("unknown or expired receipt: {0}")]
    UnknownReceipt(Uuid),
}

struct Message {
    submission: BookingSubmission,
    receive_count: u32,
}

struct InFlight {
    message: Message,
    group: String,
    deadline: Instant,
}

#[derive(Default)]
struct QueueInner {
    groups: HashMap<String, VecDeque<Message>>,
    in_flight: HashMap<Uuid, InFlight>,
    dedup: HashMap<String, Instant>,
}

/// Ordered, deduplicated intake buffer for booking submissions.
///
/// Delivery is strict FIFO within an ordering group with at most one
/// in-flight message per group; groups are independent. This is the
/// pipeline's only serialization point.
pub struct SubmissionQueue {
    config: QueueConfig,
    inner: Mutex<QueueInner>,
    dead_letters: Arc<DeadLetterSink>,
}

impl SubmissionQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(QueueInner::default()),
            dead_letters: Arc::new(DeadLetterSink::new()),
        }
    }

    pub fn dead_letter_sink(&self) -> Arc<DeadLetterSink> {
        Arc::clone(&self.dead_letters)
    }

    pub async fn enqueue(&self, submission: BookingSubmission) -> EnqueueOutcome {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let window = self.config.dedup_window;

        inner
            .dedup
            .retain(|_, seen_at| now.duration_since(*seen_at) < window);

        if inner.dedup.contains_key(&submission.dedup_key) {
            tracing::debug!(
                submission = %submission.id,
                dedup_key = %submission.dedup_key,
                "submission collapsed by dedup window"
            );
            return EnqueueOutcome::Deduplicated;
        }

        inner
            .dedup
            .insert(submission.dedup_key.clone(), now);
        tracing::debug!(
            submission = %submission.id,
            group = %submission.ordering_group,
            "submission enqueued"
        );
        inner
            .groups
            .entry(submission.ordering_group.clone())
            .or_default()
            .push_back(Message {
                submission,
                receive_count: 0,
            });

        EnqueueOutcome::Enqueued
    }

    /// Non-blocking dequeue. Returns the next eligible submission, honoring
    /// per-group exclusivity, or `None` if every group is empty or busy.
    pub async fn try_dequeue(&self) -> Option<Delivery> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        // Expired leases go back to the head of their group, receive count
        // intact, so the next delivery observes the redelivery budget.
        let expired: Vec<Uuid> = inner
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.deadline <= now)
            .map(|(receipt, _)| *receipt)
            .collect();
        for receipt in expired {
            if let Some(flight) = inner.in_flight.remove(&receipt) {
                tracing::debug!(
                    submission = %flight.message.submission.id,
                    receive_count = flight.message.receive_count,
                    "visibility window lapsed, submission returned to queue"
                );
                inner
                    .groups
                    .entry(flight.group)
                    .or_default()
                    .push_front(flight.message);
            }
        }

        loop {
            let busy: HashSet<String> = inner
                .in_flight
                .values()
                .map(|flight| flight.group.clone())
                .collect();
            let group = inner
                .groups
                .iter()
                .find(|(group, queue)| !queue.is_empty() && !busy.contains(*group))
                .map(|(group, _)| group.clone())?;

            let mut message = match inner.groups.get_mut(&group).and_then(VecDeque::pop_front) {
                Some(message) => message,
                None => {
                    inner.groups.remove(&group);
                    continue;
                }
            };
            if inner.groups.get(&group).is_some_and(VecDeque::is_empty) {
                inner.groups.remove(&group);
            }

            message.receive_count += 1;
            if message.receive_count > self.config.max_receive_count {
                self.dead_letters
                    .push(DeadLetter::new(
                        message.submission,
                        message.receive_count,
                        "exceeded max receive count".to_string(),
                    ))
                    .await;
                continue;
            }

            let receipt = Uuid::new_v4();
            let delivery = Delivery {
                submission: message.submission.clone(),
                receipt,
                attempt: message.receive_count,
            };
            inner.in_flight.insert(
                receipt,
                InFlight {
                    message,
                    group,
                    deadline: now + self.config.visibility_timeout,
                },
            );
            return Some(delivery);
        }
    }

    /// Polling dequeue: blocks up to `timeout` waiting for an eligible
    /// submission.
    pub async fn poll(&self, timeout: Duration) -> Option<Delivery> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(delivery) = self.try_dequeue().await {
                return Some(delivery);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }

    /// Acknowledge a delivery, removing the message for good.
    pub async fn ack(&self, receipt: Uuid) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        inner
            .in_flight
            .remove(&receipt)
            .map(|_| ())
            .ok_or(QueueError::UnknownReceipt(receipt))
    }

    /// Give the message back immediately (zero visibility) for redelivery.
    pub async fn release(&self, receipt: Uuid) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        let flight = inner
            .in_flight
            .remove(&receipt)
            .ok_or(QueueError::UnknownReceipt(receipt))?;
        inner
            .groups
            .entry(flight.group)
            .or_default()
            .push_front(flight.message);
        Ok(())
    }

    /// Poison message: straight to the dead-letter sink, no further
    /// redelivery.
    pub async fn reject(&self, receipt: Uuid, reason: &str) -> Result<(), QueueError> {
        let flight = {
            let mut inner = self.inner.lock().await;
            inner
                .in_flight
                .remove(&receipt)
                .ok_or(QueueError::UnknownReceipt(receipt))?
        };
        self.dead_letters
            .push(DeadLetter::new(
                flight.message.submission,
                flight.message.receive_count,
                reason.to_string(),
            ))
            .await;
        Ok(())
    }

    /// Queued (not in-flight) messages across all groups.
    pub async fn depth(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.groups.values().map(VecDeque::len).sum()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.lock().await.in_flight.len()
    }
}

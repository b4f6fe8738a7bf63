use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transita_api::{app, AppState};
use transita_core::notify::CredentialHandle;
use transita_events::{EventArchive, EventBus, RetryPolicy};
use transita_pipeline::{
    run_worker, BookingWorker, CancellationHandler, ConfirmationHandler, EmailNotifier,
    StatusTransitionService,
};
use transita_queue::{QueueConfig, SubmissionQueue};
use transita_store::{
    InMemoryBookingStore, InMemoryCancelledLedger, InMemoryRouteDirectory, InMemoryUserDirectory,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "transita_api=debug,transita_pipeline=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = transita_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Transita API on port {}", config.server.port);

    // Storage and external lookups
    let store = Arc::new(InMemoryBookingStore::new());
    let ledger = Arc::new(InMemoryCancelledLedger::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let routes = Arc::new(InMemoryRouteDirectory::new());

    // Intake queue
    let queue = Arc::new(SubmissionQueue::new(QueueConfig {
        visibility_timeout: Duration::from_secs(config.queue.visibility_timeout_seconds),
        dedup_window: Duration::from_secs(config.queue.dedup_window_seconds),
        max_receive_count: config.queue.max_receive_count,
        ..QueueConfig::default()
    }));

    // Notification side effect
    let notifier = Arc::new(EmailNotifier::new(
        config.email.sender.clone(),
        CredentialHandle::new(config.email.credential.clone()),
    ));

    // Domain event bus with its notification handlers
    let retention = chrono::Duration::days(config.events.archive_retention_days);
    let bus = Arc::new(EventBus::new(EventArchive::new(retention)));
    let retry = RetryPolicy {
        max_attempts: config.events.max_delivery_attempts,
        base_delay: Duration::from_millis(config.events.retry_base_ms),
        ..RetryPolicy::default()
    };
    bus.subscribe(
        "booking:confirmed",
        Arc::new(ConfirmationHandler::new(
            store.clone(),
            users.clone(),
            routes.clone(),
            notifier.clone(),
            config.email.customer_support.clone(),
        )),
        retry.clone(),
    )
    .await;
    bus.subscribe(
        "booking:cancelled",
        Arc::new(CancellationHandler::new(
            store.clone(),
            ledger.clone(),
            users.clone(),
            routes.clone(),
            notifier,
            config.email.customer_support.clone(),
        )),
        retry,
    )
    .await;

    let transitions = Arc::new(StatusTransitionService::new(store.clone(), bus.clone()));

    // Booking workers; per-group serialization is the queue's job, so two
    // loops are safe and keep distinct routes moving concurrently.
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let poll_timeout = Duration::from_secs(config.queue.poll_timeout_seconds);
    for _ in 0..2 {
        tokio::spawn(run_worker(
            queue.clone(),
            Arc::new(BookingWorker::new(store.clone())),
            poll_timeout,
            shutdown_tx.subscribe(),
        ));
    }

    let app_state = AppState {
        queue,
        store,
        ledger,
        transitions,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

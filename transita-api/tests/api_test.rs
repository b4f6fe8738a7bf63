use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use transita_api::{app, AppState};
use transita_core::identity::UserAccount;
use transita_core::notify::{CredentialHandle, Notifier};
use transita_core::route::BusRoute;
use transita_events::{EventArchive, EventBus, RetryPolicy};
use transita_pipeline::{
    BookingWorker, CancellationHandler, ConfirmationHandler, Disposition, EmailNotifier,
    StatusTransitionService,
};
use transita_queue::{QueueConfig, SubmissionQueue};
use transita_store::{
    InMemoryBookingStore, InMemoryCancelledLedger, InMemoryRouteDirectory, InMemoryUserDirectory,
};
use uuid::Uuid;

struct TestApp {
    router: Router,
    state: AppState,
    worker: BookingWorker,
}

async fn test_app() -> TestApp {
    let queue = Arc::new(SubmissionQueue::new(QueueConfig {
        poll_interval: Duration::from_millis(5),
        ..QueueConfig::default()
    }));
    let store = Arc::new(InMemoryBookingStore::new());
    let ledger = Arc::new(InMemoryCancelledLedger::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let routes = Arc::new(InMemoryRouteDirectory::new());

    users
        .insert(UserAccount {
            id: "CSTMR-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Reyes".to_string(),
            email: "ada@example.com".to_string(),
        })
        .await;
    routes
        .insert(BusRoute {
            id: "RT-1".to_string(),
            bus_id: "BCBSCMPN-1".to_string(),
            bus_unit_id: "BUS-07".to_string(),
            from_route: "Batangas City Grand Terminal".to_string(),
            to_route: "Cubao".to_string(),
            departure_time: "15:00".to_string(),
            arrival_time: "19:00".to_string(),
        })
        .await;

    let notifier: Arc<dyn Notifier> = Arc::new(EmailNotifier::new(
        "no-reply@transita.example".to_string(),
        CredentialHandle::new("vault:test/email-relay"),
    ));

    let bus = Arc::new(EventBus::new(EventArchive::default()));
    bus.subscribe(
        "booking:confirmed",
        Arc::new(ConfirmationHandler::new(
            store.clone(),
            users.clone(),
            routes.clone(),
            notifier.clone(),
            "support@transita.example".to_string(),
        )),
        RetryPolicy::immediate(5),
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
            "support@transita.example".to_string(),
        )),
        RetryPolicy::immediate(5),
    )
    .await;

    let transitions = Arc::new(StatusTransitionService::new(store.clone(), bus.clone()));
    let worker = BookingWorker::new(store.clone());

    let state = AppState {
        queue,
        store,
        ledger,
        transitions,
    };

    TestApp {
        router: app(state.clone()),
        state,
        worker,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn drain(app: &TestApp) {
    while let Some(delivery) = app.state.queue.try_dequeue().await {
        match app.worker.process_one(&delivery.submission).await {
            Disposition::Ack => app.state.queue.ack(delivery.receipt).await.unwrap(),
            Disposition::Retry(_) => app.state.queue.release(delivery.receipt).await.unwrap(),
            Disposition::Fatal(reason) => app
                .state
                .queue
                .reject(delivery.receipt, &reason)
                .await
                .unwrap(),
        }
    }
}

#[tokio::test]
async fn test_intake_accepts_submission() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "requester_id": "CSTMR-1",
                "bus_route_id": "RT-1",
                "seats": ["23", "24"],
                "travel_date": "2023-07-06 19:30",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ACCEPTED");
    assert!(body["submission_id"].is_string());

    // Accepted means queued, not booked.
    assert_eq!(app.state.queue.depth().await, 1);
}

#[tokio::test]
async fn test_intake_rejects_empty_seats() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "requester_id": "CSTMR-1",
                "bus_route_id": "RT-1",
                "seats": [],
                "travel_date": "2023-07-06 19:30",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.state.queue.depth().await, 0);
}

#[tokio::test]
async fn test_get_unknown_booking_is_404() {
    let app = test_app().await;

    let uri = format!(
        "/v1/bookings?id={}&bus_route_id=RT-1",
        Uuid::new_v4()
    );
    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_lifecycle_over_the_api() {
    let app = test_app().await;

    // Intake
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "requester_id": "CSTMR-1",
                "bus_route_id": "RT-1",
                "seats": ["12A"],
                "travel_date": "2023-07-06 19:30",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let submission_id = body_json(response).await["submission_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Worker materialises the PENDING record.
    drain(&app).await;

    let uri = format!("/v1/bookings?id={}&bus_route_id=RT-1", submission_id);
    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "PENDING");

    // Operator confirms.
    let uri = format!(
        "/v1/bookings/status?id={}&bus_route_id=RT-1",
        submission_id
    );
    let response = app
        .router
        .clone()
        .oneshot(post_json(&uri, json!({ "status": "CONFIRMED" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "CONFIRMED");

    // A second, conflicting transition is rejected.
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            &uri,
            json!({ "status": "CANCELLED", "reason": "changed plans" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // No cancellation record was ever written.
    let uri = format!("/v1/bookings/cancelled?booking_id={}", submission_id);
    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancellation_over_the_api_writes_ledger() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "requester_id": "CSTMR-1",
                "bus_route_id": "RT-1",
                "seats": ["3"],
                "travel_date": "2023-07-06 19:30",
            }),
        ))
        .await
        .unwrap();
    let submission_id = body_json(response).await["submission_id"]
        .as_str()
        .unwrap()
        .to_string();
    drain(&app).await;

    let uri = format!(
        "/v1/bookings/status?id={}&bus_route_id=RT-1",
        submission_id
    );
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            &uri,
            json!({
                "status": "CANCELLED",
                "reason": "no longer travelling",
                "cancelled_by": "ADMN-1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/v1/bookings/cancelled?booking_id={}", submission_id);
    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entry = body_json(response).await;
    assert_eq!(entry["reason"], "no longer travelling");
    assert_eq!(entry["cancelled_by"], "ADMN-1");
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Local, NaiveDateTime};
use serde_json::{json, Value};
use tower::ServiceExt;

use workshop::config::AppConfig;
use workshop::db::{self, queries};
use workshop::models::catalog::{NewService, NewTimeSlot};
use workshop::models::{Claims, Role};
use workshop::routes;
use workshop::services::auth;
use workshop::state::AppState;

const SECRET: &str = "test-secret";

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        cors_origin: None,
        workshop_name: "City Motors".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState::new(conn, test_config()))
}

fn token(role: Role, customer_id: Option<i64>, technician_id: Option<i64>, advertiser_id: Option<i64>) -> String {
    let claims = Claims {
        user_id: 100 + customer_id.or(technician_id).or(advertiser_id).unwrap_or(0),
        role,
        customer_id,
        technician_id,
        advertiser_id,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    auth::issue_token(SECRET, &claims).unwrap()
}

struct Seed {
    customer_id: i64,
    vehicle_id: i64,
    slot_id: i64,
    service_id: i64,
    technician_id: i64,
    customer: String,
    manager: String,
    technician: String,
}

/// Catalog with the oil-change service as id 3 (60 minutes, 2500) and a 09:00 slot.
fn seed(state: &Arc<AppState>, capacity: i64) -> Seed {
    let db = state.db.lock().unwrap();
    let customer_id = queries::insert_customer(&db, 1, "Ann Perera", Some("0771234567"), None).unwrap();
    let vehicle_id = queries::insert_vehicle(&db, customer_id, "Toyota", "Aqua", "CAB-1234").unwrap();
    let technician_id = queries::insert_technician(&db, 2, "Sam", Some("engines")).unwrap();
    let slot_id = queries::insert_time_slot(
        &db,
        &NewTimeSlot {
            start_time: "09:00".to_string(),
            max_capacity: capacity,
        },
    )
    .unwrap();

    let mut service_id = 0;
    for (name, duration, price) in [("Wash", 30, 800.0), ("Tyre rotation", 45, 1500.0), ("Oil change", 60, 2500.0)] {
        service_id = queries::insert_service(
            &db,
            &NewService {
                name: name.to_string(),
                description: None,
                category: Some("maintenance".to_string()),
                duration_minutes: duration,
                price,
            },
        )
        .unwrap();
    }
    assert_eq!(service_id, 3);

    Seed {
        customer_id,
        vehicle_id,
        slot_id,
        service_id,
        technician_id,
        customer: token(Role::Customer, Some(customer_id), None, None),
        manager: token(Role::Manager, None, None, None),
        technician: token(Role::Technician, None, Some(technician_id), None),
    }
}

fn days_ahead(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days)).to_string()
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn book(app: &Router, seed: &Seed, date: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/booking",
        Some(&seed.customer),
        Some(json!({
            "date": date,
            "timeSlotId": seed.slot_id,
            "vehicleId": seed.vehicle_id,
            "serviceId": seed.service_id,
            "servicePackageId": "",
            "customerNotes": "Engine light on"
        })),
    )
    .await
}

async fn pay_booking(app: &Router, seed: &Seed, booking_id: i64) -> (StatusCode, Value) {
    let (_, invoice) = send(
        app,
        "GET",
        &format!("/api/payment/invoice/booking/{booking_id}"),
        Some(&seed.customer),
        None,
    )
    .await;
    send(
        app,
        "POST",
        "/api/payment",
        Some(&seed.customer),
        Some(json!({
            "invoiceId": invoice["data"]["invoice"]["id"],
            "amount": 2500,
            "method": "card",
            "cardBrand": "VISA",
            "cardLast4": "4242"
        })),
    )
    .await
}

// ── Health & Auth ──

#[tokio::test]
async fn test_health() {
    let app = routes::router(test_state());
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = routes::router(test_state());

    let (status, body) = send(&app, "GET", "/api/booking", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/booking", Some("wrong-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = auth::issue_token(
        "other-secret",
        &Claims {
            user_id: 1,
            role: Role::Admin,
            customer_id: None,
            technician_id: None,
            advertiser_id: None,
            exp: chrono::Utc::now().timestamp() + 3600,
        },
    )
    .unwrap();
    let (status, _) = send(&app, "GET", "/api/booking", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Booking Capacity ──

#[tokio::test]
async fn test_slot_capacity_example() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);
    let date = days_ahead(30);

    for _ in 0..2 {
        let (status, body) = book(&app, &seed, &date).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["startTime"], "09:00");
        assert_eq!(body["data"]["endTime"], "10:00");
        assert_eq!(body["data"]["status"], "pending");
        assert!(body["data"]["refNumber"].as_str().unwrap().starts_with("SL-"));
    }

    let (status, body) = book(&app, &seed, &date).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("fully booked"));

    let (_, body) = send(&app, "GET", "/api/booking", Some(&seed.manager), None).await;
    assert_eq!(body["meta"]["count"], 2);
}

#[tokio::test]
async fn test_booking_validation() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/booking",
        Some(&seed.customer),
        Some(json!({
            "date": days_ahead(5),
            "timeSlotId": seed.slot_id,
            "vehicleId": seed.vehicle_id,
            "serviceId": seed.service_id,
            "servicePackageId": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exactly one"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/booking",
        Some(&seed.customer),
        Some(json!({
            "date": days_ahead(5),
            "timeSlotId": 999,
            "vehicleId": seed.vehicle_id,
            "serviceId": seed.service_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/booking", Some(&seed.customer), Some(json!({ "date": "not-a-date" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_creates_invoice_and_tracking() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (_, body) = book(&app, &seed, &days_ahead(10)).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, invoice) = send(&app, "GET", &format!("/api/payment/invoice/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["data"]["invoice"]["amount"], 2500.0);
    assert_eq!(invoice["data"]["invoice"]["status"], "pending");
    assert!(invoice["data"]["invoice"]["number"].as_str().unwrap().starts_with("INV-"));

    let (_, tracking) = send(&app, "GET", &format!("/api/tracking/history/{id}"), Some(&seed.customer), None).await;
    assert_eq!(tracking["meta"]["count"], 1);
    assert_eq!(tracking["data"][0]["status"], "booked");

    let (_, history) = send(&app, "GET", &format!("/api/booking/{id}/history"), Some(&seed.customer), None).await;
    assert_eq!(history["data"][0]["action"], "created");
}

// ── Payments ──

#[tokio::test]
async fn test_payment_accepts_booking_and_blocks_second_payment() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(Arc::clone(&state));

    let (_, body) = book(&app, &seed, &days_ahead(10)).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, payment) = pay_booking(&app, &seed, id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["data"]["status"], "completed");

    let (_, booking) = send(&app, "GET", &format!("/api/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(booking["data"]["status"], "accepted");

    let (status, body) = pay_booking(&app, &seed, id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already paid"));

    let (_, invoice) = send(&app, "GET", &format!("/api/payment/invoice/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(invoice["data"]["invoice"]["status"], "paid");
    assert_eq!(invoice["data"]["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_failure_rolls_back() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(Arc::clone(&state));

    let (_, body) = book(&app, &seed, &days_ahead(10)).await;
    let id = body["data"]["id"].as_i64().unwrap();

    state
        .db
        .lock()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER fail_payment_tracking BEFORE INSERT ON service_tracking
             WHEN NEW.status = 'payment_received'
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
        )
        .unwrap();

    let (status, body) = pay_booking(&app, &seed, id).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");

    let (_, invoice) = send(&app, "GET", &format!("/api/payment/invoice/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(invoice["data"]["invoice"]["status"], "pending");
    assert!(invoice["data"]["payments"].as_array().unwrap().is_empty());

    let (_, booking) = send(&app, "GET", &format!("/api/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(booking["data"]["status"], "pending");
}

// ── Cancellation & Refunds ──

#[tokio::test]
async fn test_cancel_paid_booking_with_notice_refunds_in_full() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (_, body) = book(&app, &seed, &days_ahead(3)).await;
    let id = body["data"]["id"].as_i64().unwrap();
    pay_booking(&app, &seed, id).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refundPercentage"], "100%");
    assert_eq!(body["data"]["booking"]["status"], "cancelled");
    assert_eq!(body["data"]["refund"]["refundAmount"], 2500.0);
    assert_eq!(body["data"]["refund"]["refundStatus"], "pending");
    assert_eq!(body["data"]["refund"]["reason"], "Cancellation (> 24h notice)");

    let (_, refunds) = send(&app, "GET", "/api/refund?status=pending", Some(&seed.manager), None).await;
    assert_eq!(refunds["meta"]["count"], 1);

    let refund_id = body["data"]["refund"]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/refund/{refund_id}"),
        Some(&seed.manager),
        Some(json!({ "status": "processed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/refund/{refund_id}"),
        Some(&seed.manager),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refundStatus"], "approved");

    let (status, _) = send(&app, "GET", "/api/refund", Some(&seed.customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_late_cancellation_refunds_half() {
    let state = test_state();
    let seed = seed(&state, 2);

    // A slot starting three hours from now.
    let start: NaiveDateTime = Local::now().naive_local() + Duration::hours(3);
    let late_slot = {
        let db = state.db.lock().unwrap();
        queries::insert_time_slot(
            &db,
            &NewTimeSlot {
                start_time: start.format("%H:%M").to_string(),
                max_capacity: 1,
            },
        )
        .unwrap()
    };
    let app = routes::router(state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/booking",
        Some(&seed.customer),
        Some(json!({
            "date": start.date().to_string(),
            "timeSlotId": late_slot,
            "vehicleId": seed.vehicle_id,
            "serviceId": seed.service_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    pay_booking(&app, &seed, id).await;

    let (_, body) = send(&app, "DELETE", &format!("/api/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(body["data"]["refundPercentage"], "50%");
    assert_eq!(body["data"]["refund"]["refundAmount"], 1250.0);
}

#[tokio::test]
async fn test_reject_paid_booking_refunds_in_full() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (_, body) = book(&app, &seed, &days_ahead(7)).await;
    let id = body["data"]["id"].as_i64().unwrap();
    pay_booking(&app, &seed, id).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/booking/{id}"),
        Some(&seed.manager),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");

    let (_, invoice) = send(&app, "GET", &format!("/api/payment/invoice/booking/{id}"), Some(&seed.manager), None).await;
    let refunds = invoice["data"]["refunds"].as_array().unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0]["refundAmount"], 2500.0);
    assert_eq!(refunds[0]["reason"], "Booking rejected by workshop");

    let (status, _) = send(&app, "DELETE", &format!("/api/booking/{id}"), Some(&seed.manager), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_terminal_bookings_stay_closed() {
    let state = test_state();
    let seed = seed(&state, 1);
    let app = routes::router(state);
    let date = days_ahead(9);

    // A rejected booking cannot take back a place that was given away.
    let (_, body) = book(&app, &seed, &date).await;
    let rejected = body["data"]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/booking/{rejected}"),
        Some(&seed.manager),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = book(&app, &seed, &date).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/booking/{rejected}"),
        Some(&seed.manager),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Cannot change a rejected booking"));

    // A cancelled booking's open invoice cannot be settled.
    let (_, body) = book(&app, &seed, &days_ahead(10)).await;
    let cancelled = body["data"]["id"].as_i64().unwrap();
    send(&app, "DELETE", &format!("/api/booking/{cancelled}"), Some(&seed.customer), None).await;

    let (status, body) = pay_booking(&app, &seed, cancelled).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("can no longer be paid"));

    let (_, tracking) = send(
        &app,
        "GET",
        &format!("/api/tracking/history/{cancelled}"),
        Some(&seed.customer),
        None,
    )
    .await;
    let entries = tracking["data"].as_array().unwrap();
    assert_eq!(entries.last().unwrap()["status"], "cancelled");
}

// ── Role Restrictions ──

#[tokio::test]
async fn test_customer_restrictions_follow_status() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (_, body) = book(&app, &seed, &days_ahead(7)).await;
    let id = body["data"]["id"].as_i64().unwrap();

    // Customers cannot set the status themselves.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/booking/{id}"),
        Some(&seed.customer),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Blank fields are no change.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/booking/{id}"),
        Some(&seed.customer),
        Some(json!({ "status": "", "technicianId": "", "customerNotes": "Also check brakes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customerNotes"], "Also check brakes");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/booking/{id}"),
        Some(&seed.manager),
        Some(json!({ "status": "in_progress", "technicianId": seed.technician_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/booking/{id}"),
        Some(&seed.customer),
        Some(json!({ "customerNotes": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/api/booking/{id}"), Some(&seed.customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/tracking/update",
        Some(&seed.technician),
        Some(json!({ "bookingId": id, "status": "completed", "note": "All done" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "completed");

    let (_, booking) = send(&app, "GET", &format!("/api/booking/{id}"), Some(&seed.manager), None).await;
    assert_eq!(booking["data"]["status"], "completed");

    let (status, _) = send(&app, "DELETE", &format!("/api/booking/{id}"), Some(&seed.manager), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_customers_bookings_are_hidden() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (_, body) = book(&app, &seed, &days_ahead(7)).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let stranger = token(Role::Customer, Some(seed.customer_id + 50), None, None);
    let (status, _) = send(&app, "GET", &format!("/api/booking/{id}"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, "GET", "/api/booking", Some(&stranger), None).await;
    assert_eq!(body["meta"]["count"], 0);
}

// ── Calendar ──

#[tokio::test]
async fn test_booking_calendar_download() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let date = days_ahead(4);
    let (_, body) = book(&app, &seed, &date).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/booking/{id}/calendar.ics"))
                .header("Authorization", format!("Bearer {}", seed.customer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/calendar; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let ics = String::from_utf8(bytes.to_vec()).unwrap();
    let compact = date.replace('-', "");
    assert!(ics.contains(&format!("DTSTART:{compact}T090000")));
    assert!(ics.contains(&format!("DTEND:{compact}T100000")));
    assert!(ics.contains("SUMMARY:Service appointment at City Motors"));
}

// ── Catalog ──

#[tokio::test]
async fn test_catalog_management() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (status, _) = send(
        &app,
        "POST",
        "/api/service",
        Some(&seed.customer),
        Some(json!({ "name": "Detailing", "durationMinutes": 90, "price": 4000 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/package",
        Some(&seed.manager),
        Some(json!({ "name": "Full care", "price": 3000, "serviceIds": [1, 3] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["serviceIds"], json!([1, 3]));

    let (_, services) = send(&app, "GET", "/api/service", Some(&seed.customer), None).await;
    assert_eq!(services["meta"]["count"], 3);

    // Packages book for two hours.
    let package_id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/booking",
        Some(&seed.customer),
        Some(json!({
            "date": days_ahead(8),
            "timeSlotId": seed.slot_id,
            "vehicleId": seed.vehicle_id,
            "servicePackageId": package_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["endTime"], "11:00");
}

// ── Advertisements ──

#[tokio::test]
async fn test_advertisement_lifecycle() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/advertiser",
        Some(&seed.manager),
        Some(json!({ "userId": 40, "companyName": "Tyre World" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let advertiser = token(Role::Advertiser, None, None, body["data"]["id"].as_i64());

    let (_, body) = send(
        &app,
        "POST",
        "/api/placement",
        Some(&seed.manager),
        Some(json!({ "name": "Lobby screen", "location": "lobby", "dailyRate": 200 })),
    )
    .await;
    let placement_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/advertisement",
        Some(&advertiser),
        Some(json!({
            "title": "Summer tyres",
            "placementId": placement_id,
            "startDate": "2025-06-01",
            "endDate": "2025-06-05"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["invoice"]["amount"], 1000.0);
    let ad_id = body["data"]["advertisement"]["id"].as_i64().unwrap();
    let invoice_id = body["data"]["invoice"]["id"].as_i64().unwrap();

    // Not active yet.
    let (status, _) = send(&app, "POST", &format!("/api/advertisement/{ad_id}/impression"), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/payment",
        Some(&advertiser),
        Some(json!({ "invoiceId": invoice_id, "amount": 1000, "method": "bank_transfer", "reference": "TX-99" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", &format!("/api/advertisement/{ad_id}"), Some(&advertiser), None).await;
    assert_eq!(body["data"]["status"], "active");

    send(&app, "POST", &format!("/api/advertisement/{ad_id}/impression"), None, None).await;
    let (status, body) = send(&app, "POST", &format!("/api/advertisement/{ad_id}/click"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["impressions"], 1);
    assert_eq!(body["data"]["clicks"], 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/advertisement/{ad_id}/status"),
        Some(&advertiser),
        Some(json!({ "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "paused");

    let (status, body) = send(&app, "POST", "/api/report/ad-performance", Some(&seed.manager), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["data"][0]["ctr"], 100.0);
    assert_eq!(body["data"]["data"][0]["spend"], 1000.0);
}

// ── Reports ──

#[tokio::test]
async fn test_reports_are_persisted_for_managers() {
    let state = test_state();
    let seed = seed(&state, 2);
    let app = routes::router(state);

    let date = days_ahead(6);
    book(&app, &seed, &date).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/report/daily-bookings",
        Some(&seed.customer),
        Some(json!({ "date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/report/daily-bookings",
        Some(&seed.manager),
        Some(json!({ "date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reportType"], "daily_bookings");
    assert_eq!(body["data"]["data"]["totalBookings"], 1);
    let report_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/report/revenue",
        Some(&seed.manager),
        Some(json!({ "from": date })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", &format!("/api/report/{report_id}"), Some(&seed.manager), None).await;
    assert_eq!(body["data"]["parameters"]["date"], date);

    let (_, body) = send(&app, "GET", "/api/report?type=daily_bookings", Some(&seed.manager), None).await;
    assert_eq!(body["meta"]["count"], 1);
}

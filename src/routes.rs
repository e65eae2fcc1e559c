use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Catalog
        .route(
            "/api/service",
            get(handlers::catalog::list_services).post(handlers::catalog::create_service),
        )
        .route(
            "/api/package",
            get(handlers::catalog::list_packages).post(handlers::catalog::create_package),
        )
        .route(
            "/api/time-slot",
            get(handlers::catalog::list_time_slots).post(handlers::catalog::create_time_slot),
        )
        .route("/api/time-slot/:id", put(handlers::catalog::set_time_slot_active))
        .route(
            "/api/placement",
            get(handlers::catalog::list_placements).post(handlers::catalog::create_placement),
        )
        // Directory
        .route(
            "/api/customer",
            get(handlers::directory::list_customers).post(handlers::directory::create_customer),
        )
        .route(
            "/api/customer/:id/vehicle",
            get(handlers::directory::list_vehicles).post(handlers::directory::add_vehicle),
        )
        .route(
            "/api/technician",
            get(handlers::directory::list_technicians).post(handlers::directory::create_technician),
        )
        .route("/api/advertiser", post(handlers::directory::create_advertiser))
        // Bookings
        .route(
            "/api/booking",
            get(handlers::booking::list_bookings).post(handlers::booking::create_booking),
        )
        .route(
            "/api/booking/:id",
            get(handlers::booking::get_booking)
                .put(handlers::booking::update_booking)
                .delete(handlers::booking::cancel_booking),
        )
        .route("/api/booking/:id/history", get(handlers::booking::booking_history))
        .route("/api/booking/:id/calendar.ics", get(handlers::booking::download_ics))
        // Payments & refunds
        .route("/api/payment", post(handlers::payment::record_payment))
        .route(
            "/api/payment/invoice/booking/:id",
            get(handlers::payment::booking_invoice),
        )
        .route(
            "/api/payment/invoice/advertisement/:id",
            get(handlers::payment::advertisement_invoice),
        )
        .route("/api/refund", get(handlers::refund::list_refunds))
        .route("/api/refund/:id", put(handlers::refund::update_refund))
        // Tracking
        .route("/api/tracking/update", post(handlers::tracking::update_tracking))
        .route(
            "/api/tracking/history/:booking_id",
            get(handlers::tracking::tracking_history),
        )
        // Advertisements
        .route(
            "/api/advertisement",
            get(handlers::advertisement::list_advertisements)
                .post(handlers::advertisement::create_advertisement),
        )
        .route("/api/advertisement/:id", get(handlers::advertisement::get_advertisement))
        .route(
            "/api/advertisement/:id/status",
            put(handlers::advertisement::update_status),
        )
        .route(
            "/api/advertisement/:id/impression",
            post(handlers::advertisement::record_impression),
        )
        .route(
            "/api/advertisement/:id/click",
            post(handlers::advertisement::record_click),
        )
        // Reports
        .route("/api/report", get(handlers::report::list_reports))
        .route("/api/report/:id", get(handlers::report::get_report))
        .route("/api/report/daily-bookings", post(handlers::report::daily_bookings))
        .route("/api/report/revenue", post(handlers::report::revenue))
        .route(
            "/api/report/technician-performance",
            post(handlers::report::technician_performance),
        )
        .route("/api/report/ad-performance", post(handlers::report::ad_performance))
        .with_state(state)
}

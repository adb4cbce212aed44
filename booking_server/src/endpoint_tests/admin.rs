use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_common::Secret;
use booking_engine::{
    db_types::{AvailabilityRecord, AvailabilityStatus, Order, OrderStatusType},
    events::EventProducers,
    order_objects::OrderSummary,
    AvailabilityApi,
    OrderFlowApi,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{admin_request, place_order, send_request, setup_db, tear_down, ADMIN_KEY};
use crate::{
    middleware::AdminKeyMiddlewareFactory,
    routes::{FetchAvailabilityRoute, InitializeAvailabilityRoute, MarkDeliveredRoute, OrderSummaryRoute},
};

fn configure(db: SqliteDatabase, admin_key: &str) -> impl FnOnce(&mut ServiceConfig) {
    let admin_key = Secret::new(admin_key.to_string());
    move |cfg: &mut ServiceConfig| {
        let orders_api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let availability_api = AvailabilityApi::new(db);
        cfg.app_data(web::Data::new(orders_api)).app_data(web::Data::new(availability_api)).service(
            web::scope("/admin")
                .wrap(AdminKeyMiddlewareFactory::new(admin_key))
                .service(OrderSummaryRoute::<SqliteDatabase>::new())
                .service(MarkDeliveredRoute::<SqliteDatabase>::new())
                .service(InitializeAvailabilityRoute::<SqliteDatabase>::new())
                .service(FetchAvailabilityRoute::<SqliteDatabase>::new()),
        );
    }
}

#[actix_web::test]
async fn order_summary() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    place_order(&db, "ORD-800", 1_000_000, 400_000).await;

    let req = admin_request(TestRequest::get().uri("/admin/orders/ORD-800"));
    let (status, body) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let summary: OrderSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.order.status, OrderStatusType::PartiallyPaid);
    assert_eq!(summary.items.len(), 1);
    assert_eq!(summary.transactions.len(), 1);
    assert!(summary.booking.is_some());

    let req = admin_request(TestRequest::get().uri("/admin/orders/ORD-899"));
    let (status, body) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. The requested order #ORD-899 does not exist"}"#);
    tear_down(db).await;
}

#[actix_web::test]
async fn only_paid_orders_are_delivered() {
    let db = setup_db().await;
    place_order(&db, "ORD-810", 1_000_000, 400_000).await;
    place_order(&db, "ORD-811", 1_000_000, 1_000_000).await;

    let req = admin_request(TestRequest::post().uri("/admin/orders/ORD-810/deliver"));
    let (status, _) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = admin_request(TestRequest::post().uri("/admin/orders/ORD-811/deliver"));
    let (status, body) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatusType::Delivered);
    tear_down(db).await;
}

#[actix_web::test]
async fn availability_calendar() {
    let db = setup_db().await;
    let init = || {
        admin_request(TestRequest::post().uri("/admin/resources/12/availability"))
            .set_json(json!({"from": "2024-06-01", "horizon_days": 30}))
    };
    let (status, body) = send_request(init(), configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains("30 days created for resource 12"), "{body}");
    let (status, _) = send_request(init(), configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = admin_request(TestRequest::get().uri("/admin/resources/12/availability?from=2024-06-01&to=2024-06-03"));
    let (status, body) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let days: Vec<AvailabilityRecord> = serde_json::from_str(&body).unwrap();
    assert_eq!(days.len(), 3);
    assert!(days.iter().all(|d| d.status == AvailabilityStatus::Available));

    let req = admin_request(TestRequest::get().uri("/admin/resources/12/availability?from=2024-06-03&to=2024-06-01"));
    let (status, _) = send_request(req, configure(db.clone(), ADMIN_KEY)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    tear_down(db).await;
}

#[actix_web::test]
async fn admin_routes_are_closed_without_a_configured_key() {
    let db = setup_db().await;
    let req = TestRequest::get().uri("/admin/orders/ORD-1").insert_header(("X-Admin-Key", ""));
    let (status, _) = send_request(req, configure(db.clone(), "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    tear_down(db).await;
}

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{OrderNumber, OrderStatusType, Rupiah},
    events::EventProducers,
    OrderFlowApi,
    OrderManagement,
    SqliteDatabase,
};
use serde_json::json;

use super::helpers::{place_order, send_request, setup_db, tear_down};
use crate::{
    config::ServerOptions,
    data_objects::JsonResponse,
    routes::{health, GatewayNotificationRoute},
};

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(ServerOptions::default()))
            .service(health)
            .service(GatewayNotificationRoute::<SqliteDatabase>::new());
    }
}

fn notification(order_id: &str, status: &str, amount: &str, txid: &str) -> serde_json::Value {
    json!({
        "transaction_time": "2024-06-01 10:15:00",
        "transaction_status": status,
        "transaction_id": txid,
        "status_message": "midtrans payment notification",
        "status_code": "200",
        "payment_type": "bank_transfer",
        "order_id": order_id,
        "gross_amount": amount,
        "fraud_status": "accept",
        "currency": "IDR"
    })
}

async fn order_status(db: &SqliteDatabase, order_number: &str) -> (OrderStatusType, Rupiah) {
    let order = db.fetch_order_by_number(&OrderNumber::from(order_number)).await.unwrap().unwrap();
    (order.status, order.paid_amount)
}

#[actix_web::test]
async fn health_check() {
    let db = setup_db().await;
    let (status, body) = send_request(TestRequest::get().uri("/health"), configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    tear_down(db).await;
}

#[actix_web::test]
async fn down_payment_then_replay() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    place_order(&db, "ORD-600", 1_000_000, 0).await;
    let body = notification("ORD-600", "settlement", "400000.00", "tx-600");

    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, res) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let res: JsonResponse = serde_json::from_str(&res).unwrap();
    assert!(res.success);
    assert_eq!(res.message, "Notification processed. Order is partially_paid");
    assert_eq!(order_status(&db, "ORD-600").await, (OrderStatusType::PartiallyPaid, Rupiah::from(400_000)));

    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, res) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("Already processed"));
    assert_eq!(order_status(&db, "ORD-600").await, (OrderStatusType::PartiallyPaid, Rupiah::from(400_000)));
    tear_down(db).await;
}

#[actix_web::test]
async fn unknown_status_is_acknowledged() {
    let db = setup_db().await;
    place_order(&db, "ORD-610", 1_000_000, 0).await;
    let body = notification("ORD-610", "authorize", "1000000.00", "tx-610");
    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, res) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let res: JsonResponse = serde_json::from_str(&res).unwrap();
    assert!(!res.success);
    assert_eq!(order_status(&db, "ORD-610").await, (OrderStatusType::Pending, Rupiah::from(0)));
    tear_down(db).await;
}

#[actix_web::test]
async fn notification_errors() {
    let db = setup_db().await;
    let body = notification("ORD-404", "settlement", "1000000.00", "tx-404");
    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, _) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({"order_id": "ORD-404", "transaction_status": "settlement", "gross_amount": "10.00"});
    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, res) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.contains("transaction_id"), "{res}");

    place_order(&db, "ORD-620", 1_000_000, 0).await;
    let body = notification("ORD-620", "settlement", "0.00", "tx-620");
    let req = TestRequest::post().uri("/gateway/notification").set_json(&body);
    let (status, _) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}

#[actix_web::test]
async fn failure_cancels_the_order() {
    let db = setup_db().await;
    place_order(&db, "ORD-630", 1_000_000, 0).await;
    let req = TestRequest::post()
        .uri("/gateway/notification")
        .set_json(notification("ORD-630", "expire", "1000000.00", "tx-630"));
    let (status, res) = send_request(req, configure(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res.contains("cancelled"), "{res}");
    assert_eq!(order_status(&db, "ORD-630").await.0, OrderStatusType::Cancelled);
    tear_down(db).await;
}

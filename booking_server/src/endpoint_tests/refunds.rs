use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_common::Secret;
use booking_engine::{
    db_types::{OrderNumber, OrderStatusType, RefundRequest, RefundStatus},
    events::EventProducers,
    GatewayReversalError,
    OrderManagement,
    RefundApi,
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{admin_request, place_order, send_request, setup_db, tear_down, ADMIN_KEY},
    mocks::{receipt_for, MockGateway},
};
use crate::{
    middleware::AdminKeyMiddlewareFactory,
    routes::{DecideRefundRoute, SubmitRefundRoute},
};

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = RefundApi::new(db, gateway, EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(SubmitRefundRoute::<SqliteDatabase, MockGateway>::new()).service(
            web::scope("/admin")
                .wrap(AdminKeyMiddlewareFactory::new(Secret::new(ADMIN_KEY.to_string())))
                .service(DecideRefundRoute::<SqliteDatabase, MockGateway>::new()),
        );
    }
}

async fn submit(db: &SqliteDatabase, order_number: &str, user_id: i64) -> (StatusCode, String) {
    let req = TestRequest::post()
        .uri(&format!("/orders/{order_number}/refunds"))
        .set_json(json!({"user_id": user_id, "reason": "Flight cancelled"}));
    send_request(req, configure(db.clone(), MockGateway::new())).await
}

fn decision(id: i64, decision: &str) -> TestRequest {
    admin_request(TestRequest::post().uri(&format!("/admin/refunds/{id}/decision")))
        .set_json(json!({"decision": decision}))
}

#[actix_web::test]
async fn submission_status_codes() {
    let _ = env_logger::try_init().ok();
    let db = setup_db().await;
    place_order(&db, "ORD-700", 1_000_000, 0).await;
    place_order(&db, "ORD-701", 1_000_000, 1_000_000).await;

    assert_eq!(submit(&db, "ORD-799", 1).await.0, StatusCode::NOT_FOUND);
    assert_eq!(submit(&db, "ORD-700", 1).await.0, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(submit(&db, "ORD-701", 2).await.0, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, body) = submit(&db, "ORD-701", 1).await;
    assert_eq!(status, StatusCode::CREATED);
    let request: RefundRequest = serde_json::from_str(&body).unwrap();
    assert_eq!(request.status, RefundStatus::Pending);
    assert_eq!(submit(&db, "ORD-701", 1).await.0, StatusCode::UNPROCESSABLE_ENTITY);
    tear_down(db).await;
}

#[actix_web::test]
async fn approve_then_decide_again() {
    let db = setup_db().await;
    place_order(&db, "ORD-710", 1_000_000, 1_000_000).await;
    let (_, body) = submit(&db, "ORD-710", 1).await;
    let request: RefundRequest = serde_json::from_str(&body).unwrap();

    let mut gateway = MockGateway::new();
    gateway.expect_reverse().times(1).returning(|r| Ok(receipt_for(r)));
    let (status, body) = send_request(decision(request.id, "approved"), configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let approved: RefundRequest = serde_json::from_str(&body).unwrap();
    assert_eq!(approved.status, RefundStatus::Approved);

    let (status, _) = send_request(decision(request.id, "rejected"), configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let order = db.fetch_order_by_number(&OrderNumber::from("ORD-710")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Refunded);

    let (status, _) = send_request(decision(9_999, "rejected"), configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tear_down(db).await;
}

#[actix_web::test]
async fn gateway_failure_is_a_bad_gateway() {
    let db = setup_db().await;
    place_order(&db, "ORD-720", 1_000_000, 1_000_000).await;
    let (_, body) = submit(&db, "ORD-720", 1).await;
    let request: RefundRequest = serde_json::from_str(&body).unwrap();

    let mut gateway = MockGateway::new();
    gateway.expect_reverse().times(1).returning(|_| Err(GatewayReversalError::Transport("connection reset".into())));
    let (status, body) = send_request(decision(request.id, "approved"), configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection reset"), "{body}");
    let request = db.fetch_refund_request(request.id).await.unwrap().unwrap();
    assert_eq!(request.status, RefundStatus::Pending);
    let order = db.fetch_order_by_number(&OrderNumber::from("ORD-720")).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
    tear_down(db).await;
}

#[actix_web::test]
async fn decisions_need_the_admin_key() {
    let db = setup_db().await;
    let req = TestRequest::post().uri("/admin/refunds/1/decision").set_json(json!({"decision": "approved"}));
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/admin/refunds/1/decision")
        .insert_header(("X-Admin-Key", "wrong-key"))
        .set_json(json!({"decision": "approved"}));
    let (status, body) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "A valid X-Admin-Key header is required for this request.");
    tear_down(db).await;
}

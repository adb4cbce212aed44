use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use booking_engine::{
    events::EventProducers,
    test_utils::{
        fixtures::{gateway_event, holiday_order},
        prepare_env::{prepare_test_env, random_db_path},
    },
    BookingDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use chrono::{Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::middleware::ADMIN_KEY_HEADER;

pub const ADMIN_KEY: &str = "correct-horse-battery-staple";

pub async fn setup_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to remove test database {url}: {e}");
    }
}

/// Places a holiday package order for user #1, and settles `paid` of it (if non-zero).
pub async fn place_order(db: &SqliteDatabase, order_number: &str, total: i64, paid: i64) {
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let deadline = Utc::now() + Duration::days(1);
    api.create_order(holiday_order(order_number, 1, total, deadline)).await.expect("Error creating order");
    if paid > 0 {
        let ev = gateway_event(order_number, "settlement", paid, &format!("tx-{order_number}"));
        api.process_gateway_event(ev, Utc::now()).await.expect("Error settling order");
    }
}

pub fn admin_request(req: TestRequest) -> TestRequest {
    req.insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

#![allow(dead_code)]

use booking_engine::{
    db_types::{Booking, NewOrder, Order},
    events::EventProducers,
    test_utils::{
        fixtures::timestamp,
        prepare_env::{prepare_test_env, random_db_path},
    },
    BookingDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Checkout happens at this time in every test. Deadlines are 24 hours later.
pub fn checkout_time() -> DateTime<Utc> {
    timestamp("2024-06-01T08:00:00Z")
}

pub fn deadline() -> DateTime<Utc> {
    checkout_time() + Duration::hours(24)
}

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
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

pub async fn place_order(db: &SqliteDatabase, order: NewOrder) -> (Order, Booking) {
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    api.create_order(order).await.expect("Error creating order")
}

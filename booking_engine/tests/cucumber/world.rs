use booking_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    AvailabilityApi,
    BookingError,
    ExpiryApi,
    OrderFlowApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct BookingWorld {
    pub system: Option<BookingSystem>,
    pub last_error: Option<BookingError>,
}

#[derive(Debug)]
pub struct BookingSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub flow: OrderFlowApi<SqliteDatabase>,
    pub expiry: ExpiryApi<SqliteDatabase>,
    pub availability: AvailabilityApi<SqliteDatabase>,
}

impl BookingWorld {
    pub fn system(&self) -> &BookingSystem {
        self.system.as_ref().expect("Booking system not initialised")
    }
}

impl BookingSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        let db = run_migrations(&url).await;
        debug!("🚀️ Created database: {url}");
        let flow = OrderFlowApi::new(db.clone(), EventProducers::default());
        let expiry = ExpiryApi::new(db.clone(), EventProducers::default());
        let availability = AvailabilityApi::new(db.clone());
        Self { db_path: url, db, flow, expiry, availability }
    }
}

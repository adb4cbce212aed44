use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use booking_engine::{events::EventHandlers, AvailabilityApi, OrderFlowApi, RefundApi, SqliteDatabase};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    gateway::HttpRefundGateway,
    middleware::AdminKeyMiddlewareFactory,
    notifications::{notification_hooks, NotificationClient},
    routes::{
        health,
        DecideRefundRoute,
        FetchAvailabilityRoute,
        GatewayNotificationRoute,
        InitializeAvailabilityRoute,
        MarkDeliveredRoute,
        OrderSummaryRoute,
        SubmitRefundRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let notifier = NotificationClient::new(config.notification_url.clone())?;
    let handlers = EventHandlers::new(config.event_buffer_size, notification_hooks(notifier));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.run_expiry_worker {
        // The worker runs for the lifetime of the server
        let _worker = start_expiry_worker(db.clone(), producers.clone(), config.expiry_sweep_interval);
    }
    let gateway = HttpRefundGateway::new(&config.gateway)?;
    let refund_api =
        RefundApi::new(db.clone(), gateway, producers.clone()).with_reversal_timeout(config.gateway.timeout);
    let srv = create_server_instance(config, db, refund_api, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    refund_api: RefundApi<SqliteDatabase, HttpRefundGateway>,
    producers: booking_engine::events::EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let admin_key = config.admin_api_key.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let availability_api = AvailabilityApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bks::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(availability_api))
            // Every worker shares the refund API, so that in-flight decisions are visible across workers
            .app_data(web::Data::new(refund_api.clone()))
            .app_data(web::Data::new(options));
        let admin_scope = web::scope("/admin")
            .wrap(AdminKeyMiddlewareFactory::new(admin_key.clone()))
            .service(OrderSummaryRoute::<SqliteDatabase>::new())
            .service(MarkDeliveredRoute::<SqliteDatabase>::new())
            .service(DecideRefundRoute::<SqliteDatabase, HttpRefundGateway>::new())
            .service(InitializeAvailabilityRoute::<SqliteDatabase>::new())
            .service(FetchAvailabilityRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(GatewayNotificationRoute::<SqliteDatabase>::new())
            .service(SubmitRefundRoute::<SqliteDatabase, HttpRefundGateway>::new())
            .service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Server bound to {}:{}", config.host, config.port);
    Ok(srv)
}

//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use booking_engine::{
    db_types::OrderNumber,
    traits::SettlementOutcome,
    AvailabilityApi,
    AvailabilityManagement,
    BookingDatabase,
    BookingError,
    OrderFlowApi,
    RefundApi,
    RefundGateway,
};
use chrono::Utc;
use log::*;
use serde_json::Value;

use crate::{
    config::ServerOptions,
    data_objects::{
        AvailabilityQuery,
        GatewayNotification,
        InitializeAvailabilityParams,
        JsonResponse,
        RefundDecisionParams,
        RefundSubmission,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Gateway  ----------------------------------------------------
route!(gateway_notification => Post "/gateway/notification" impl BookingDatabase);
/// Payment gateway settlement callback.
///
/// The gateway calls this route every time a transaction changes state. The full body is stored with the transaction
/// record. Notifications are idempotent: a replay of a processed notification is acknowledged and otherwise ignored.
///
/// Notifications with a status the engine does not recognise are acknowledged with a 200 (so that the gateway stops
/// retrying) and logged at error level for manual review. A 4xx or 5xx response makes the gateway retry later.
pub async fn gateway_notification<B: BookingDatabase>(
    body: web::Json<Value>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let raw_payload = body.into_inner();
    trace!("💻️ Received gateway notification: {raw_payload}");
    let notification = serde_json::from_value::<GatewayNotification>(raw_payload.clone()).map_err(|e| {
        warn!("💻️ Could not read gateway notification. {e}. Payload: {raw_payload}");
        ServerError::CouldNotDeserializePayload(e.to_string())
    })?;
    info!(
        "💻️ Gateway notification for order {}: {} [{}]",
        notification.order_id, notification.transaction_id, notification.transaction_status
    );
    let event = notification.into_gateway_event(raw_payload)?;
    let timeout = options.webhook_timeout;
    let result = tokio::time::timeout(timeout, api.process_gateway_event(event, Utc::now()))
        .await
        .map_err(|_| {
            error!("💻️ Gateway notification processing took longer than {}s and was abandoned", timeout.as_secs());
            ServerError::Timeout(format!("The notification was not processed within {}s", timeout.as_secs()))
        })?;
    match result {
        Ok(SettlementOutcome::Replayed) => Ok(HttpResponse::Ok().json(JsonResponse::success("Already processed"))),
        Ok(outcome) => {
            let status = outcome.order().map(|o| o.status.to_string()).unwrap_or_default();
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Notification processed. Order is {status}"))))
        },
        Err(e @ BookingError::UnknownTransactionStatus(_)) => {
            Ok(HttpResponse::Ok().json(JsonResponse::failure(format!("Notification acknowledged and dropped. {e}"))))
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Refunds  ----------------------------------------------------
route!(submit_refund => Post "/orders/{order_number}/refunds" impl BookingDatabase, RefundGateway);
/// Customer refund request.
///
/// Files a refund request for a paid order. The caller is expected to have authenticated the user already; the
/// `user_id` in the body must own the order.
pub async fn submit_refund<B, G>(
    path: web::Path<String>,
    body: web::Json<RefundSubmission>,
    api: web::Data<RefundApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingDatabase,
    G: RefundGateway,
{
    let order_number = OrderNumber::from(path.into_inner());
    let RefundSubmission { user_id, reason } = body.into_inner();
    debug!("💻️ Refund request for order {order_number} from user #{user_id}");
    if reason.trim().is_empty() {
        return Err(ServerError::ValidationError("A reason for the refund is required".into()));
    }
    let request = api.submit(&order_number, user_id, &reason).await.map_err(|e| {
        debug!("💻️ Could not file refund request. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(request))
}

route!(decide_refund => Post "/refunds/{id}/decision" impl BookingDatabase, RefundGateway);
/// Administrator decision on a refund request.
///
/// Approving reverses the payment at the gateway first. If the gateway fails, a 502 is returned and the request
/// stays pending, so the decision can simply be retried.
pub async fn decide_refund<B, G>(
    path: web::Path<i64>,
    body: web::Json<RefundDecisionParams>,
    api: web::Data<RefundApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingDatabase,
    G: RefundGateway,
{
    let id = path.into_inner();
    let RefundDecisionParams { decision } = body.into_inner();
    info!("💻️ Refund request #{id} decision: {decision}");
    let request = api.decide(id, decision, Utc::now()).await.map_err(|e| {
        debug!("💻️ Could not apply decision to refund request #{id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(request))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_summary => Get "/orders/{order_number}" impl BookingDatabase);
pub async fn order_summary<B: BookingDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    let summary = api.order_summary(&order_number).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(mark_delivered => Post "/orders/{order_number}/deliver" impl BookingDatabase);
/// Marks a paid order as delivered, once the trip has taken place.
pub async fn mark_delivered<B: BookingDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    info!("💻️ Delivery request for order {order_number}");
    let order = api.mark_delivered(&order_number).await.map_err(|e| {
        debug!("💻️ Could not mark order as delivered. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Availability  ----------------------------------------------------
route!(initialize_availability => Post "/resources/{id}/availability" impl AvailabilityManagement);
/// Creates the availability calendar for a new rentable resource.
pub async fn initialize_availability<B: AvailabilityManagement>(
    path: web::Path<i64>,
    body: web::Json<InitializeAvailabilityParams>,
    api: web::Data<AvailabilityApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let resource_id = path.into_inner();
    let InitializeAvailabilityParams { from, horizon_days } = body.into_inner();
    let count = api.initialize(resource_id, from, horizon_days).await?;
    Ok(HttpResponse::Created().json(JsonResponse::success(format!("{count} days created for resource {resource_id}"))))
}

route!(fetch_availability => Get "/resources/{id}/availability" impl AvailabilityManagement);
pub async fn fetch_availability<B: AvailabilityManagement>(
    path: web::Path<i64>,
    query: web::Query<AvailabilityQuery>,
    api: web::Data<AvailabilityApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let resource_id = path.into_inner();
    let AvailabilityQuery { from, to } = query.into_inner();
    let days = api.fetch(resource_id, from, to).await?;
    Ok(HttpResponse::Ok().json(days))
}

//! `SqliteDatabase` is a concrete implementation of a booking engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{availability, bookings, db_url, lifecycle, new_pool, orders, refunds, transactions};
use crate::{
    db_types::{
        AvailabilityRecord,
        Booking,
        NewOrder,
        NewRefundRequest,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        PaymentTransaction,
        RefundRequest,
        RefundStatus,
        TransactionClass,
    },
    traits::{
        AnnulledOrder,
        AvailabilityManagement,
        BookingDatabase,
        BookingError,
        InsertTransactionResult,
        OrderManagement,
        ReversalReceipt,
        SettlementEvent,
        SettlementOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl BookingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Booking), BookingError> {
        let mut tx = self.pool.begin().await?;
        let saved = orders::insert_order(&order, &mut tx).await?;
        let booking = bookings::insert_booking(saved.id, &order.booking, &mut tx).await?;
        if let Some(hold) = booking.availability_hold() {
            availability::reserve(hold.resource_id, hold.start_date, hold.end_date, saved.id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", saved.order_number, saved.id);
        Ok((saved, booking))
    }

    async fn process_settlement_event(&self, event: &SettlementEvent) -> Result<SettlementOutcome, BookingError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order_by_number(&event.order_number, &mut tx)
            .await?
            .ok_or_else(|| BookingError::OrderNotFound(event.order_number.clone()))?;
        let txn = match transactions::idempotent_insert(order.id, event, &mut tx).await? {
            InsertTransactionResult::Inserted(txn) => txn,
            InsertTransactionResult::AlreadyExists => {
                debug!(
                    "🗃️ {} [{}] for order {} has already been processed",
                    event.transaction_code, event.status, event.order_number
                );
                return Ok(SettlementOutcome::Replayed);
            },
        };
        let now = event.received_at;
        let outcome = match event.status.class() {
            TransactionClass::Pending => lifecycle::apply_pending(order, now, &mut tx).await?,
            TransactionClass::Success => lifecycle::apply_success(order, &txn, now, &mut tx).await?,
            TransactionClass::Failure => lifecycle::apply_failure(order, &txn, now, &mut tx).await?,
            TransactionClass::Refund => lifecycle::apply_refund(order, &txn, now, &mut tx).await?,
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_expirable_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_expirable_orders(now, &mut conn).await?;
        Ok(orders)
    }

    async fn expire_order(&self, order_id: i64, now: DateTime<Utc>) -> Result<Option<AnnulledOrder>, BookingError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order_by_id(order_id, &mut tx).await?.ok_or(BookingError::OrderIdNotFound(order_id))?;
        if !order.status.is_awaiting_payment() || !order.is_past_deadline(now) {
            debug!("🗃️ Order {} is {} and no longer eligible for expiry", order.order_number, order.status);
            return Ok(None);
        }
        let from = OrderStatusType::AWAITING_PAYMENT;
        let Some(expired) = orders::update_status_if(order_id, OrderStatusType::Expired, &from, now, &mut tx).await?
        else {
            return Ok(None);
        };
        let annulled = lifecycle::annul_order(expired, now, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(annulled))
    }

    async fn mark_order_delivered(&self, order_number: &OrderNumber) -> Result<Order, BookingError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order_by_number(order_number, &mut tx)
            .await?
            .ok_or_else(|| BookingError::OrderNotFound(order_number.clone()))?;
        let from = [OrderStatusType::Paid];
        let delivered = orders::update_status_if(order.id, OrderStatusType::Delivered, &from, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| {
                BookingError::InvalidState(format!(
                    "Order {order_number} is {}. Only paid orders can be marked as delivered",
                    order.status
                ))
            })?;
        tx.commit().await?;
        Ok(delivered)
    }

    async fn insert_refund_request(&self, request: NewRefundRequest) -> Result<RefundRequest, BookingError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order_by_number(&request.order_number, &mut tx)
            .await?
            .ok_or_else(|| BookingError::OrderNotFound(request.order_number.clone()))?;
        let saved = refunds::insert_refund_request(order.id, request.user_id, &request.reason, &mut tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn reject_refund_request(&self, id: i64, now: DateTime<Utc>) -> Result<RefundRequest, BookingError> {
        let mut conn = self.pool.acquire().await?;
        match refunds::decide_if_pending(id, RefundStatus::Rejected, None, now, &mut conn).await? {
            Some(request) => Ok(request),
            None => match refunds::fetch_refund_request(id, &mut conn).await? {
                Some(_) => Err(BookingError::AlreadyDecided(id)),
                None => Err(BookingError::RefundRequestNotFound(id)),
            },
        }
    }

    async fn approve_refund_request(
        &self,
        id: i64,
        receipt: &ReversalReceipt,
        now: DateTime<Utc>,
    ) -> Result<(RefundRequest, AnnulledOrder), BookingError> {
        let request = self.fetch_refund_request(id).await?.ok_or(BookingError::RefundRequestNotFound(id))?;
        let mut tx = self.pool.begin().await?;
        let order = orders::lock_order_by_id(request.order_id, &mut tx)
            .await?
            .ok_or(BookingError::OrderIdNotFound(request.order_id))?;
        let approved = refunds::decide_if_pending(id, RefundStatus::Approved, Some(&receipt.reference), now, &mut tx)
            .await?
            .ok_or(BookingError::AlreadyDecided(id))?;
        let from = OrderStatusType::REFUNDABLE;
        let annulled = match orders::update_status_if(order.id, OrderStatusType::Refunded, &from, now, &mut tx).await? {
            Some(refunded) => lifecycle::annul_order(refunded, now, &mut tx).await?,
            // The gateway's own refund notification got here first.
            None if order.status == OrderStatusType::Refunded => {
                let booking = bookings::fetch_booking_for_order(order.id, &mut tx).await?;
                AnnulledOrder { order, booking, released_days: 0 }
            },
            None => {
                return Err(BookingError::InvalidState(format!(
                    "Order {} is {} and cannot be refunded",
                    order.order_number, order.status
                )));
            },
        };
        let payment_type = transactions::fetch_settled_transaction(annulled.order.id, &mut tx)
            .await?
            .map(|t| t.payment_type)
            .unwrap_or_default();
        transactions::insert_reversal_record(annulled.order.id, receipt, &payment_type, now, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Refund request #{id} approved. Order {} has been refunded", annulled.order.order_number);
        Ok((approved, annulled))
    }

    async fn close(&mut self) -> Result<(), BookingError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_booking_for_order(&self, order_id: i64) -> Result<Option<Booking>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let booking = bookings::fetch_booking_for_order(order_id, &mut conn).await?;
        Ok(booking)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let txns = transactions::fetch_transactions_for_order(order_id, &mut conn).await?;
        Ok(txns)
    }

    async fn fetch_settled_transaction(&self, order_id: i64) -> Result<Option<PaymentTransaction>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let txn = transactions::fetch_settled_transaction(order_id, &mut conn).await?;
        Ok(txn)
    }

    async fn fetch_refund_request(&self, id: i64) -> Result<Option<RefundRequest>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let request = refunds::fetch_refund_request(id, &mut conn).await?;
        Ok(request)
    }

    async fn fetch_refund_requests_for_order(&self, order_id: i64) -> Result<Vec<RefundRequest>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        let requests = refunds::fetch_refund_requests_for_order(order_id, &mut conn).await?;
        Ok(requests)
    }
}

impl AvailabilityManagement for SqliteDatabase {
    async fn initialize_availability(
        &self,
        resource_id: i64,
        from: NaiveDate,
        horizon_days: u32,
    ) -> Result<u64, BookingError> {
        let mut tx = self.pool.begin().await?;
        let count = availability::bulk_initialize(resource_id, from, horizon_days, &mut tx).await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn reserve_availability(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        order_id: i64,
    ) -> Result<u64, BookingError> {
        let mut tx = self.pool.begin().await?;
        let count = availability::reserve(resource_id, start, end, order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn release_availability(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, BookingError> {
        let mut conn = self.pool.acquire().await?;
        availability::release(resource_id, start, end, &mut conn).await
    }

    async fn mark_maintenance(&self, resource_id: i64, start: NaiveDate, end: NaiveDate) -> Result<u64, BookingError> {
        let mut tx = self.pool.begin().await?;
        let (count, booked) = availability::set_maintenance(resource_id, start, end, &mut tx).await?;
        tx.commit().await?;
        if booked.is_empty() {
            Ok(count)
        } else {
            let dates = booked.iter().map(NaiveDate::to_string).collect::<Vec<String>>().join(", ");
            Err(BookingError::Conflict(format!(
                "{count} days were taken out of service, but resource {resource_id} is booked on {dates}"
            )))
        }
    }

    async fn fetch_availability(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, BookingError> {
        let mut conn = self.pool.acquire().await?;
        availability::fetch_range(resource_id, start, end, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), BookingError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

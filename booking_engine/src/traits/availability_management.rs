use chrono::NaiveDate;

use crate::{db_types::AvailabilityRecord, traits::BookingError};

/// The availability ledger keeps one record per resource per day. Every date range is inclusive on both ends.
#[allow(async_fn_in_trait)]
pub trait AvailabilityManagement {
    /// Creates one `available` record per day, for `horizon_days` days starting at `from`.
    ///
    /// This runs exactly once per resource. If the resource already has a calendar, `InvalidState` is returned and
    /// nothing is written.
    async fn initialize_availability(
        &self,
        resource_id: i64,
        from: NaiveDate,
        horizon_days: u32,
    ) -> Result<u64, BookingError>;

    /// Marks every day in the range as `booked` by `order_id`.
    ///
    /// Days already booked by the same order are left as they are. If any day is booked by another order, is under
    /// maintenance, or has no record at all, a `Conflict` error is returned and nothing is changed.
    ///
    /// Returns the number of days that changed state.
    async fn reserve_availability(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        order_id: i64,
    ) -> Result<u64, BookingError>;

    /// Marks every day in the range as `available`, whatever its current status. Days without a record are ignored.
    /// This call is idempotent.
    async fn release_availability(&self, resource_id: i64, start: NaiveDate, end: NaiveDate)
        -> Result<u64, BookingError>;

    /// Takes the available days in the range out of service. Booked days are not touched, and cause a `Conflict`
    /// error after the available days have been updated.
    async fn mark_maintenance(&self, resource_id: i64, start: NaiveDate, end: NaiveDate) -> Result<u64, BookingError>;

    async fn fetch_availability(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, BookingError>;
}

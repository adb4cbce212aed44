use std::fmt::Debug;

use chrono::NaiveDate;
use log::*;

use crate::{
    db_types::AvailabilityRecord,
    traits::{AvailabilityManagement, BookingError},
};

/// The number of days of calendar created for a new resource when no horizon is given.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Administration of the per-day availability calendar of rentable resources.
pub struct AvailabilityApi<B> {
    db: B,
}

impl<B> Debug for AvailabilityApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AvailabilityApi")
    }
}

impl<B> AvailabilityApi<B>
where B: AvailabilityManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates the calendar for a newly added resource, starting at `from`.
    pub async fn initialize(
        &self,
        resource_id: i64,
        from: NaiveDate,
        horizon_days: Option<u32>,
    ) -> Result<u64, BookingError> {
        let horizon = horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
        let count = self.db.initialize_availability(resource_id, from, horizon).await?;
        info!("📅️ Calendar for resource {resource_id} created with {count} days from {from}");
        Ok(count)
    }

    pub async fn reserve(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        order_id: i64,
    ) -> Result<u64, BookingError> {
        self.db.reserve_availability(resource_id, start, end, order_id).await
    }

    pub async fn release(&self, resource_id: i64, start: NaiveDate, end: NaiveDate) -> Result<u64, BookingError> {
        let count = self.db.release_availability(resource_id, start, end).await?;
        debug!("📅️ {count} days released for resource {resource_id} between {start} and {end}");
        Ok(count)
    }

    pub async fn set_maintenance(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, BookingError> {
        let count = self.db.mark_maintenance(resource_id, start, end).await?;
        info!("📅️ Resource {resource_id} is out of service for {count} days between {start} and {end}");
        Ok(count)
    }

    pub async fn fetch(
        &self,
        resource_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityRecord>, BookingError> {
        self.db.fetch_availability(resource_id, start, end).await
    }
}

mod dates;

pub use dates::{date_range, days_inclusive};

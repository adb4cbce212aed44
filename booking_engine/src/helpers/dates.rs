use chrono::NaiveDate;

/// The number of days covered by the inclusive range `start..=end`. Returns zero if `end` is before `start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Iterates over every day in the inclusive range `start..=end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod test {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn inclusive_ranges() {
        assert_eq!(days_inclusive(day(1), day(3)), 3);
        assert_eq!(days_inclusive(day(1), day(1)), 1);
        assert_eq!(days_inclusive(day(3), day(1)), 0);
        let days = date_range(day(1), day(3)).collect::<Vec<_>>();
        assert_eq!(days, vec![day(1), day(2), day(3)]);
        assert_eq!(date_range(day(2), day(1)).count(), 0);
    }
}

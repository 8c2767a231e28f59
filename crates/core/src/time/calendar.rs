use chrono::{Days, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current calendar date in UTC, the reference point for forecast labels.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `len` consecutive calendar dates starting at `start` (inclusive).
pub fn consecutive_dates(start: NaiveDate, len: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(len);
    let mut cur = start;
    for _ in 0..len {
        out.push(cur);
        match cur.checked_add_days(Days::new(1)) {
            Some(next) => cur = next,
            None => break,
        }
    }
    out
}

pub fn format_ymd(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_one_day_per_index() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        let dates: Vec<_> = consecutive_dates(start, 4)
            .into_iter()
            .map(format_ymd)
            .collect();
        assert_eq!(dates, vec!["2026-01-30", "2026-01-31", "2026-02-01", "2026-02-02"]);
    }

    #[test]
    fn crosses_leap_day_and_year_end() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let dates = consecutive_dates(start, 2);
        assert_eq!(format_ymd(dates[1]), "2024-02-29");

        let start = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let dates = consecutive_dates(start, 2);
        assert_eq!(format_ymd(dates[1]), "2026-01-01");
    }

    #[test]
    fn zero_pads_month_and_day() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_ymd(d), "2026-03-07");
    }

    #[test]
    fn empty_when_len_is_zero() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(consecutive_dates(start, 0).is_empty());
    }
}

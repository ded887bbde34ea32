use chrono::{Duration, NaiveDate};

use crate::error::{codes, ApiError};

/// Parses the client-supplied calendar day. Scheduling never substitutes
/// the server clock: the account's local "today" decides due-ness and
/// quota bucketing.
pub fn parse_client_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation(codes::ERR_INVALID_DATE))
}

pub fn days_from(date: NaiveDate, days: i32) -> NaiveDate {
    date + Duration::days(days as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_client_date("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn rejects_timestamps_and_garbage() {
        assert!(parse_client_date("2024-01-05T10:00:00").is_err());
        assert!(parse_client_date("05/01/2024").is_err());
        assert!(parse_client_date("").is_err());
    }

    #[test]
    fn day_arithmetic_crosses_month_boundaries() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(days_from(d, 3), NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
    }
}

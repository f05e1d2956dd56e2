//! Turns a duration estimate into a delivery date.

use chrono::{Days, NaiveDate};

use super::DeliveryPrediction;
use crate::error::InvalidDateError;
use crate::estimation::EstimationResult;

/// Date format accepted for order dates.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an order date in `YYYY-MM-DD` form.
pub fn parse_order_date(raw: &str) -> Result<NaiveDate, InvalidDateError> {
    NaiveDate::parse_from_str(raw.trim(), ORDER_DATE_FORMAT).map_err(|e| InvalidDateError {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Add the predicted duration to the order date, in calendar days.
pub fn assemble(
    result: EstimationResult,
    order_date: NaiveDate,
) -> Result<DeliveryPrediction, InvalidDateError> {
    let days = Days::new(u64::from(result.predicted_duration_days));
    let estimated_delivery_date =
        order_date
            .checked_add_days(days)
            .ok_or_else(|| InvalidDateError {
                raw: order_date.to_string(),
                reason: format!(
                    "adding {} days leaves the supported calendar range",
                    result.predicted_duration_days
                ),
            })?;

    Ok(DeliveryPrediction {
        order_date,
        estimated_delivery_date,
        estimation: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::Confidence;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_assemble_adds_calendar_days() {
        let result = EstimationResult::new(2, Confidence::High, "test");
        let prediction = assemble(result, date(2024, 1, 1)).unwrap();
        assert_eq!(prediction.estimated_delivery_date, date(2024, 1, 3));
        assert_eq!(prediction.order_date, date(2024, 1, 1));
    }

    #[test]
    fn test_assemble_crosses_month_and_leap_day() {
        let result = EstimationResult::new(18, Confidence::High, "test");
        let prediction = assemble(result, date(2024, 2, 20)).unwrap();
        assert_eq!(prediction.estimated_delivery_date, date(2024, 3, 9));
    }

    #[test]
    fn test_round_trip_day_difference() {
        for days in [1, 2, 9, 18, 365] {
            let start = date(2023, 12, 30);
            let prediction =
                assemble(EstimationResult::new(days, Confidence::High, "test"), start).unwrap();
            let elapsed = prediction.estimated_delivery_date - start;
            assert_eq!(elapsed.num_days(), i64::from(days));
        }
    }

    #[test]
    fn test_assemble_overflow_is_invalid_date() {
        let result = EstimationResult::new(30, Confidence::High, "test");
        let err = assemble(result, NaiveDate::MAX).unwrap_err();
        assert!(err.reason.contains("calendar range"));
    }

    #[test]
    fn test_parse_order_date() {
        assert_eq!(parse_order_date(" 2024-01-01 ").unwrap(), date(2024, 1, 1));
        assert!(parse_order_date("2023-02-30").is_err());
        assert!(parse_order_date("01/02/2024").is_err());

        let err = parse_order_date("yesterday").unwrap_err();
        assert_eq!(err.raw, "yesterday");
    }
}

use chrono::{Duration, NaiveDate};

use crate::error::{PipelineError, Result};

/// Calendar date of Day 1. Single source of truth for the whole sequence.
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2025, 2, 20) {
    Some(date) => date,
    None => panic!("epoch date is valid"),
};

pub const SEQUENCE_LENGTH: u32 = 1000;

/// Converts a 1-based day index to its calendar date.
pub fn index_to_date(index: i64) -> Result<NaiveDate> {
    if index < 1 {
        return Err(PipelineError::invalid_argument(format!(
            "day index must be >= 1, got {index}"
        )));
    }
    Ok(EPOCH + Duration::days(index - 1))
}

/// Converts a calendar date back to its 1-based day index.
pub fn date_to_index(date: NaiveDate) -> Result<i64> {
    if date < EPOCH {
        return Err(PipelineError::invalid_argument(format!(
            "date {date} is before the start of the sequence ({EPOCH})"
        )));
    }
    Ok((date - EPOCH).num_days() + 1)
}

/// Human-readable label used in prompts, titles, and broadcast lookups.
pub fn day_label(index: i64) -> Result<String> {
    check_index(index)?;
    Ok(format!("Day {index} of {SEQUENCE_LENGTH}"))
}

/// Validates that an index falls inside the 1000-day sequence.
pub fn check_index(index: i64) -> Result<()> {
    if !(1..=SEQUENCE_LENGTH as i64).contains(&index) {
        return Err(PipelineError::invalid_argument(format!(
            "day index must be between 1 and {SEQUENCE_LENGTH}, got {index}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_to_date_counts_from_the_epoch() {
        assert_eq!(index_to_date(1).unwrap(), EPOCH);
        assert_eq!(index_to_date(5).unwrap(), EPOCH + Duration::days(4));
    }

    #[test]
    fn index_to_date_rejects_zero_and_negative() {
        for invalid in [0, -1, -5] {
            assert!(matches!(
                index_to_date(invalid),
                Err(PipelineError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn date_to_index_is_one_based() {
        assert_eq!(date_to_index(EPOCH).unwrap(), 1);
        assert_eq!(date_to_index(EPOCH + Duration::days(9)).unwrap(), 10);
    }

    #[test]
    fn date_to_index_rejects_dates_before_the_epoch() {
        assert!(matches!(
            date_to_index(EPOCH - Duration::days(1)),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn conversions_are_exact_inverses() {
        for n in [1i64, 2, 10, 100, 999, 1000, 1500] {
            assert_eq!(date_to_index(index_to_date(n).unwrap()).unwrap(), n);
        }
        let d = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        assert_eq!(index_to_date(date_to_index(d).unwrap()).unwrap(), d);
    }

    #[test]
    fn day_label_formats_and_validates() {
        assert_eq!(day_label(1).unwrap(), "Day 1 of 1000");
        assert_eq!(day_label(308).unwrap(), "Day 308 of 1000");
        assert!(day_label(0).is_err());
        assert!(day_label(1001).is_err());
    }
}

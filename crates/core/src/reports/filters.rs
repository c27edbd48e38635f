//! Submission-time validation of report filters.
//!
//! Every rule is evaluated so the form can show all violations at once.

use chrono::{NaiveDate, Utc};

use super::types::ReportFilters;

/// Longest period a single report may cover, in days.
pub const MAX_RANGE_DAYS: i64 = 730;

/// Violation: start date missing.
pub const START_DATE_REQUIRED: &str = "Start date is required";
/// Violation: end date missing.
pub const END_DATE_REQUIRED: &str = "End date is required";
/// Violation: start after end.
pub const START_AFTER_END: &str = "Start date must be before end date";
/// Violation: period longer than [`MAX_RANGE_DAYS`].
pub const RANGE_TOO_LONG: &str = "Date range cannot exceed 2 years";
/// Violation: start date after today.
pub const START_IN_FUTURE: &str = "Start date cannot be in the future";

/// Validates filters against `today`, returning every violation in rule order.
///
/// An empty list means the filters may be submitted.
#[must_use]
pub fn validate_filters(filters: &ReportFilters, today: NaiveDate) -> Vec<String> {
    let mut errors = Vec::new();

    if filters.start_date.is_none() {
        errors.push(START_DATE_REQUIRED.to_string());
    }
    if filters.end_date.is_none() {
        errors.push(END_DATE_REQUIRED.to_string());
    }

    if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
        if start > end {
            errors.push(START_AFTER_END.to_string());
        }
        if (end - start).num_days() > MAX_RANGE_DAYS {
            errors.push(RANGE_TOO_LONG.to_string());
        }
    }

    if filters.start_date.is_some_and(|start| start > today) {
        errors.push(START_IN_FUTURE.to_string());
    }

    errors
}

/// Validates filters against the current UTC date.
#[must_use]
pub fn validate_filters_today(filters: &ReportFilters) -> Vec<String> {
    validate_filters(filters, Utc::now().date_naive())
}

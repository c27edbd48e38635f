//! Report data types.
//!
//! Wire shapes follow the remote report API, which speaks camelCase JSON.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_shared::types::ReportHistoryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three report kinds the dashboard can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Income, expenses and profit.
    Financial,
    /// Room occupancy and contract activity.
    Occupancy,
    /// Maintenance request throughput.
    Maintenance,
}

impl ReportType {
    /// All report types, in display order.
    pub const ALL: [Self; 3] = [Self::Financial, Self::Occupancy, Self::Maintenance];

    /// Returns the string representation of the report type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Occupancy => "occupancy",
            Self::Maintenance => "maintenance",
        }
    }

    /// Human readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Financial => "Financial Report",
            Self::Occupancy => "Occupancy Report",
            Self::Maintenance => "Maintenance Report",
        }
    }

    /// Parses a report type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "financial" => Some(Self::Financial),
            "occupancy" => Some(Self::Occupancy),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Financial => 0,
            Self::Occupancy => 1,
            Self::Maintenance => 2,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format requested from the report API or the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Structured JSON payload.
    #[default]
    Json,
    /// Comma separated values.
    Csv,
    /// Printable document.
    Pdf,
}

impl ReportFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Parses a format from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters collected by the generator before a report request.
///
/// Every field is optional here; completeness and range rules are enforced
/// by [`crate::reports::filters::validate_filters`] at submission time only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    /// Restrict the report to one property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// First day of the period (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the period (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Requested output format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
}

impl ReportFilters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to a property.
    #[must_use]
    pub fn with_property(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    /// Sets the period.
    #[must_use]
    pub const fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// The period covered by these filters.
    #[must_use]
    pub const fn period(&self) -> ReportPeriod {
        ReportPeriod {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Query parameters in the order the report API expects them.
    ///
    /// Blank property ids are dropped.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(property_id) = self.property_id.as_deref().map(str::trim) {
            if !property_id.is_empty() {
                pairs.push(("propertyId", property_id.to_string()));
            }
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", end.to_string()));
        }
        if let Some(format) = self.format {
            pairs.push(("format", format.as_str().to_string()));
        }
        pairs
    }
}

/// Period a report covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    /// Period start.
    pub start_date: Option<NaiveDate>,
    /// Period end.
    pub end_date: Option<NaiveDate>,
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => write!(f, "{start} to {end}"),
            (Some(start), None) => write!(f, "from {start}"),
            (None, Some(end)) => write!(f, "until {end}"),
            (None, None) => f.write_str("all time"),
        }
    }
}

// ============================================================================
// Financial
// ============================================================================

/// Financial report headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Rent and service income.
    pub total_income: Decimal,
    /// Operating expenses.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub net_profit: Decimal,
    /// Net profit as a percentage of income.
    pub profit_margin: Decimal,
}

/// Income collected per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyIncome {
    /// Property ID.
    pub property_id: String,
    /// Property name.
    pub property_name: String,
    /// Income collected.
    pub total_income: Decimal,
    /// Number of payments received.
    pub payment_count: u32,
}

/// Expenses per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryTotal {
    /// Expense category.
    pub category: String,
    /// Total spent.
    pub total_amount: Decimal,
    /// Number of expense records.
    pub count: u32,
}

/// Financial report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    /// Headline figures.
    pub summary: FinancialSummary,
    /// Income per property.
    pub income_breakdown: Vec<PropertyIncome>,
    /// Expenses per category.
    pub expense_breakdown: Vec<ExpenseCategoryTotal>,
    /// Covered period.
    pub period: ReportPeriod,
    /// When the backend produced the report.
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Occupancy
// ============================================================================

/// Occupancy headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySummary {
    /// Rooms under management.
    pub total_rooms: u32,
    /// Rooms with an active contract.
    pub occupied_rooms: u32,
    /// Rooms without an active contract.
    pub vacant_rooms: u32,
    /// Occupied rooms as a percentage of all rooms.
    pub occupancy_rate: Decimal,
}

/// Occupancy of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOccupancy {
    /// Property ID.
    pub property_id: String,
    /// Property name.
    pub property_name: String,
    /// Rooms in the property.
    pub total_rooms: u32,
    /// Occupied rooms.
    pub occupied_rooms: u32,
    /// Occupancy percentage.
    pub occupancy_rate: Decimal,
}

/// Contract movements in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractActivity {
    /// Month label (`YYYY-MM`).
    pub month: String,
    /// Contracts signed.
    pub new_contracts: u32,
    /// Contracts that ended.
    pub ended_contracts: u32,
    /// Contracts active at month end.
    pub active_contracts: u32,
}

/// Occupancy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReport {
    /// Headline figures.
    pub summary: OccupancySummary,
    /// Occupancy per property.
    pub occupancy_by_property: Vec<PropertyOccupancy>,
    /// Monthly contract movements.
    pub contract_history: Vec<ContractActivity>,
    /// Covered period.
    pub period: ReportPeriod,
    /// When the backend produced the report.
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Maintenance
// ============================================================================

/// Maintenance request priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenancePriority {
    /// Can wait.
    Low,
    /// Normal.
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Urgent,
}

impl MaintenancePriority {
    /// Returns the string representation of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Maintenance request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    /// Not started.
    Pending,
    /// Being worked on.
    InProgress,
    /// Resolved.
    Completed,
    /// Withdrawn.
    Cancelled,
}

impl MaintenanceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Maintenance headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSummary {
    /// All requests in the period.
    pub total_requests: u32,
    /// Resolved requests.
    pub completed_requests: u32,
    /// Requests not yet started.
    pub pending_requests: u32,
    /// Requests being worked on.
    pub in_progress_requests: u32,
    /// Completed requests as a percentage of all requests.
    pub completion_rate: Decimal,
    /// Mean days from creation to completion.
    pub avg_resolution_time_days: Decimal,
}

/// Requests per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequests {
    /// Category name (plumbing, electrical, ...).
    pub category: String,
    /// Requests in the category.
    pub count: u32,
    /// Completed requests in the category.
    pub completed_count: u32,
}

/// Requests per priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRequests {
    /// Priority.
    pub priority: MaintenancePriority,
    /// Requests with this priority.
    pub count: u32,
    /// Mean resolution time, when any were completed.
    #[serde(default)]
    pub avg_resolution_time_days: Option<Decimal>,
}

/// One recent maintenance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequestSummary {
    /// Request ID.
    pub id: String,
    /// Short description.
    pub title: String,
    /// Property the request belongs to.
    pub property_name: String,
    /// Category.
    pub category: String,
    /// Priority.
    pub priority: MaintenancePriority,
    /// Status.
    pub status: MaintenanceStatus,
    /// When the request was raised.
    pub created_at: DateTime<Utc>,
    /// When the request was resolved.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Maintenance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    /// Headline figures.
    pub summary: MaintenanceSummary,
    /// Requests per category.
    pub requests_by_category: Vec<CategoryRequests>,
    /// Requests per priority.
    pub requests_by_priority: Vec<PriorityRequests>,
    /// Most recent requests.
    pub recent_requests: Vec<MaintenanceRequestSummary>,
    /// Covered period.
    pub period: ReportPeriod,
    /// When the backend produced the report.
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Payload union and history
// ============================================================================

/// A generated report of any kind, tagged by its report type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reportType", rename_all = "lowercase")]
pub enum ReportPayload {
    /// Financial report.
    Financial(FinancialReport),
    /// Occupancy report.
    Occupancy(OccupancyReport),
    /// Maintenance report.
    Maintenance(MaintenanceReport),
}

impl ReportPayload {
    /// The report type tag.
    #[must_use]
    pub const fn report_type(&self) -> ReportType {
        match self {
            Self::Financial(_) => ReportType::Financial,
            Self::Occupancy(_) => ReportType::Occupancy,
            Self::Maintenance(_) => ReportType::Maintenance,
        }
    }

    /// Covered period.
    #[must_use]
    pub const fn period(&self) -> ReportPeriod {
        match self {
            Self::Financial(report) => report.period,
            Self::Occupancy(report) => report.period,
            Self::Maintenance(report) => report.period,
        }
    }

    /// When the backend produced the report.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Financial(report) => report.generated_at,
            Self::Occupancy(report) => report.generated_at,
            Self::Maintenance(report) => report.generated_at,
        }
    }
}

/// A generated report remembered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistoryEntry {
    /// Entry ID.
    pub id: ReportHistoryId,
    /// Report type.
    #[serde(rename = "type")]
    pub report_type: ReportType,
    /// Filters the report was generated with.
    pub filters: ReportFilters,
    /// When the entry was recorded.
    pub generated_at: DateTime<Utc>,
    /// The report itself.
    pub data: ReportPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("financial", Some(ReportType::Financial))]
    #[case(" Occupancy ", Some(ReportType::Occupancy))]
    #[case("MAINTENANCE", Some(ReportType::Maintenance))]
    #[case("tax", None)]
    fn test_report_type_parse(#[case] raw: &str, #[case] expected: Option<ReportType>) {
        assert_eq!(ReportType::parse(raw), expected);
    }

    #[test]
    fn test_filters_deserialize_from_camel_case() {
        let filters: ReportFilters = serde_json::from_str(
            r#"{"propertyId":"p1","startDate":"2024-01-01","endDate":"2024-01-31","format":"csv"}"#,
        )
        .unwrap();

        assert_eq!(filters.property_id.as_deref(), Some("p1"));
        assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filters.end_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(filters.format, Some(ReportFormat::Csv));
    }

    #[test]
    fn test_query_pairs_skip_blank_property() {
        let filters = ReportFilters::new()
            .with_property("  ")
            .with_range(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            );

        assert_eq!(
            filters.query_pairs(),
            vec![
                ("startDate", "2024-01-01".to_string()),
                ("endDate", "2024-03-31".to_string()),
            ]
        );
    }

    #[test]
    fn test_period_display() {
        let period = ReportPeriod {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        assert_eq!(period.to_string(), "2024-01-01 to 2024-01-31");
        assert_eq!(ReportPeriod::default().to_string(), "all time");
    }
}

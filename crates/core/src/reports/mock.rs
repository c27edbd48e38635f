//! Sample report data.
//!
//! The dashboard runs against generated figures until a report backend is
//! configured. Numbers are deterministic for a given set of filters (only
//! `generated_at` moves) and scale with the length of the requested period.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::client::ReportDataClient;
use super::error::ReportError;
use super::export;
use super::types::{
    CategoryRequests, ContractActivity, ExpenseCategoryTotal, FinancialReport, FinancialSummary,
    MaintenancePriority, MaintenanceReport, MaintenanceRequestSummary, MaintenanceStatus,
    MaintenanceSummary, OccupancyReport, OccupancySummary, PriorityRequests, PropertyIncome,
    PropertyOccupancy, ReportFilters, ReportPayload, ReportType,
};

struct SampleProperty {
    id: &'static str,
    name: &'static str,
    rooms: u32,
    occupied: u32,
    /// Monthly income in cents.
    monthly_income: i64,
}

const PROPERTIES: [SampleProperty; 3] = [
    SampleProperty {
        id: "p1",
        name: "Sunrise Residence",
        rooms: 24,
        occupied: 21,
        monthly_income: 1_850_000,
    },
    SampleProperty {
        id: "p2",
        name: "Riverside Apartments",
        rooms: 16,
        occupied: 12,
        monthly_income: 1_280_000,
    },
    SampleProperty {
        id: "p3",
        name: "Garden Villas",
        rooms: 10,
        occupied: 9,
        monthly_income: 975_000,
    },
];

/// (category, monthly cents across all properties, monthly records)
const EXPENSES: [(&str, i64, u32); 5] = [
    ("maintenance", 215_000, 6),
    ("utilities", 183_050, 3),
    ("insurance", 64_000, 1),
    ("management", 120_000, 1),
    ("taxes", 98_025, 1),
];

/// (category, monthly requests, monthly completed) across all properties
const REQUEST_CATEGORIES: [(&str, u32, u32); 5] = [
    ("plumbing", 12, 10),
    ("electrical", 8, 7),
    ("appliance", 6, 4),
    ("hvac", 5, 5),
    ("general", 9, 8),
];

const RECENT_TITLES: [(&str, &str, MaintenancePriority, MaintenanceStatus); 5] = [
    ("Leaking kitchen faucet", "plumbing", MaintenancePriority::Medium, MaintenanceStatus::Completed),
    ("Hallway lights flickering", "electrical", MaintenancePriority::High, MaintenanceStatus::InProgress),
    ("Washing machine not draining", "appliance", MaintenancePriority::Medium, MaintenanceStatus::Pending),
    ("AC unit making noise", "hvac", MaintenancePriority::Low, MaintenanceStatus::Completed),
    ("Broken window latch", "general", MaintenancePriority::Urgent, MaintenanceStatus::Completed),
];

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Builds the sample payload for `report_type` under `filters`.
#[must_use]
pub fn sample_payload(report_type: ReportType, filters: &ReportFilters) -> ReportPayload {
    match report_type {
        ReportType::Financial => ReportPayload::Financial(sample_financial(filters)),
        ReportType::Occupancy => ReportPayload::Occupancy(sample_occupancy(filters)),
        ReportType::Maintenance => ReportPayload::Maintenance(sample_maintenance(filters)),
    }
}

/// Sample financial report.
#[must_use]
pub fn sample_financial(filters: &ReportFilters) -> FinancialReport {
    let months = period_months(filters);
    let properties = selected_properties(filters);
    let share = property_share(&properties);

    let income_breakdown: Vec<PropertyIncome> = properties
        .iter()
        .map(|p| PropertyIncome {
            property_id: p.id.clone(),
            property_name: p.name.clone(),
            total_income: Decimal::new(p.monthly_income * i64::from(months), 2),
            payment_count: p.occupied * months,
        })
        .collect();

    let expense_breakdown: Vec<ExpenseCategoryTotal> = EXPENSES
        .iter()
        .map(|(category, cents, records)| ExpenseCategoryTotal {
            category: (*category).to_string(),
            total_amount: (Decimal::new(cents * i64::from(months), 2) * share).round_dp(2),
            count: scale_count(*records, months, properties.len()),
        })
        .collect();

    let total_income: Decimal = income_breakdown.iter().map(|i| i.total_income).sum();
    let total_expenses: Decimal = expense_breakdown.iter().map(|e| e.total_amount).sum();
    let net_profit = total_income - total_expenses;

    FinancialReport {
        summary: FinancialSummary {
            total_income,
            total_expenses,
            net_profit,
            profit_margin: percentage(net_profit, total_income),
        },
        income_breakdown,
        expense_breakdown,
        period: filters.period(),
        generated_at: Utc::now(),
    }
}

/// Sample occupancy report.
#[must_use]
pub fn sample_occupancy(filters: &ReportFilters) -> OccupancyReport {
    let properties = selected_properties(filters);

    let occupancy_by_property: Vec<PropertyOccupancy> = properties
        .iter()
        .map(|p| PropertyOccupancy {
            property_id: p.id.clone(),
            property_name: p.name.clone(),
            total_rooms: p.rooms,
            occupied_rooms: p.occupied,
            occupancy_rate: percentage(Decimal::from(p.occupied), Decimal::from(p.rooms)),
        })
        .collect();

    let total_rooms: u32 = properties.iter().map(|p| p.rooms).sum();
    let occupied_rooms: u32 = properties.iter().map(|p| p.occupied).sum();

    let history_months = period_months(filters).min(12);
    let first_month = filters
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive())
        .with_day(1)
        .unwrap_or_default();

    let contract_history = (0..history_months)
        .map(|i| {
            let month = first_month
                .checked_add_months(Months::new(i))
                .unwrap_or(first_month);
            let new_contracts = (i % 3) + 1;
            let ended_contracts = i % 2;
            ContractActivity {
                month: format!("{:04}-{:02}", month.year(), month.month()),
                new_contracts,
                ended_contracts,
                active_contracts: occupied_rooms.saturating_sub(2) + new_contracts
                    - ended_contracts,
            }
        })
        .collect();

    OccupancyReport {
        summary: OccupancySummary {
            total_rooms,
            occupied_rooms,
            vacant_rooms: total_rooms - occupied_rooms,
            occupancy_rate: percentage(Decimal::from(occupied_rooms), Decimal::from(total_rooms)),
        },
        occupancy_by_property,
        contract_history,
        period: filters.period(),
        generated_at: Utc::now(),
    }
}

/// Sample maintenance report.
#[must_use]
pub fn sample_maintenance(filters: &ReportFilters) -> MaintenanceReport {
    let months = period_months(filters);
    let properties = selected_properties(filters);

    let requests_by_category: Vec<CategoryRequests> = REQUEST_CATEGORIES
        .iter()
        .map(|(category, count, completed)| CategoryRequests {
            category: (*category).to_string(),
            count: scale_count(*count, months, properties.len()),
            completed_count: scale_count(*completed, months, properties.len()),
        })
        .collect();

    let total_requests: u32 = requests_by_category.iter().map(|c| c.count).sum();
    let completed_requests: u32 = requests_by_category.iter().map(|c| c.completed_count).sum();
    let open = total_requests - completed_requests;
    let in_progress_requests = open / 2;
    let pending_requests = open - in_progress_requests;

    let urgent = total_requests / 10;
    let high = total_requests / 5;
    let low = total_requests / 4;
    let medium = total_requests - urgent - high - low;
    let requests_by_priority = vec![
        priority_row(MaintenancePriority::Urgent, urgent, 8),
        priority_row(MaintenancePriority::High, high, 19),
        priority_row(MaintenancePriority::Medium, medium, 36),
        priority_row(MaintenancePriority::Low, low, 62),
    ];

    let anchor = filters
        .end_date
        .unwrap_or_else(|| Utc::now().date_naive())
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
        .and_utc();
    let recent_requests = RECENT_TITLES
        .iter()
        .enumerate()
        .map(|(i, (title, category, priority, status))| {
            let property = &properties[i % properties.len()];
            let days_back = i64::try_from(i).unwrap_or_default() * 2 + 1;
            let created_at = anchor - chrono::Duration::days(days_back);
            MaintenanceRequestSummary {
                id: format!("MR-{}", 1001 + i),
                title: (*title).to_string(),
                property_name: property.name.clone(),
                category: (*category).to_string(),
                priority: *priority,
                status: *status,
                created_at,
                completed_at: completed_after(*status, created_at),
            }
        })
        .collect();

    MaintenanceReport {
        summary: MaintenanceSummary {
            total_requests,
            completed_requests,
            pending_requests,
            in_progress_requests,
            completion_rate: percentage(
                Decimal::from(completed_requests),
                Decimal::from(total_requests),
            ),
            avg_resolution_time_days: Decimal::new(34, 1),
        },
        requests_by_category,
        requests_by_priority,
        recent_requests,
        period: filters.period(),
        generated_at: Utc::now(),
    }
}

fn priority_row(priority: MaintenancePriority, count: u32, avg_tenths: i64) -> PriorityRequests {
    PriorityRequests {
        priority,
        count,
        avg_resolution_time_days: (count > 0).then(|| Decimal::new(avg_tenths, 1)),
    }
}

fn completed_after(status: MaintenanceStatus, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (status == MaintenanceStatus::Completed).then(|| created_at + chrono::Duration::hours(30))
}

/// Owned view of a property selected by the filters.
struct Selected {
    id: String,
    name: String,
    rooms: u32,
    occupied: u32,
    monthly_income: i64,
}

fn selected_properties(filters: &ReportFilters) -> Vec<Selected> {
    let wanted = filters
        .property_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match wanted {
        None => PROPERTIES.iter().map(Selected::from).collect(),
        Some(id) => match PROPERTIES.iter().find(|p| p.id == id) {
            Some(property) => vec![Selected::from(property)],
            None => vec![Selected {
                id: id.to_string(),
                name: format!("Property {id}"),
                rooms: 12,
                occupied: 10,
                monthly_income: 960_000,
            }],
        },
    }
}

impl From<&SampleProperty> for Selected {
    fn from(p: &SampleProperty) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.to_string(),
            rooms: p.rooms,
            occupied: p.occupied,
            monthly_income: p.monthly_income,
        }
    }
}

/// Fraction of portfolio-wide costs attributed to the selection.
fn property_share(selected: &[Selected]) -> Decimal {
    Decimal::from(selected.len()) / Decimal::from(PROPERTIES.len())
}

fn scale_count(monthly: u32, months: u32, selected: usize) -> u32 {
    let selected = u32::try_from(selected).unwrap_or(u32::MAX);
    let portfolio = u32::try_from(PROPERTIES.len()).unwrap_or(1);
    (monthly * months * selected).div_ceil(portfolio)
}

/// Months covered by the filters, at least one.
fn period_months(filters: &ReportFilters) -> u32 {
    match (filters.start_date, filters.end_date) {
        (Some(start), Some(end)) if end >= start => month_span(start, end),
        _ => 1,
    }
}

/// Calendar months touched by `start..=end`.
fn month_span(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + i32::try_from(end.month()).unwrap_or(0)
        - i32::try_from(start.month()).unwrap_or(0)
        + 1;
    u32::try_from(months).unwrap_or(1).max(1)
}

/// `part / whole * 100`, one decimal place; zero when `whole` is zero.
fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * HUNDRED).round_dp(1)
}

/// Report client serving [`sample_payload`] data.
#[derive(Debug, Default)]
pub struct MockReportClient {
    latency: Option<Duration>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockReportClient {
    /// Creates a client that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer, the way the dashboard simulated network time.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every call fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond<T>(&self, build: impl FnOnce() -> T) -> Result<T, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(message) => Err(ReportError::client(message.clone())),
            None => Ok(build()),
        }
    }
}

impl ReportDataClient for MockReportClient {
    async fn financial_report(&self, filters: &ReportFilters) -> Result<FinancialReport, ReportError> {
        self.respond(|| sample_financial(filters)).await
    }

    async fn occupancy_report(&self, filters: &ReportFilters) -> Result<OccupancyReport, ReportError> {
        self.respond(|| sample_occupancy(filters)).await
    }

    async fn maintenance_report(
        &self,
        filters: &ReportFilters,
    ) -> Result<MaintenanceReport, ReportError> {
        self.respond(|| sample_maintenance(filters)).await
    }

    async fn export_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> Result<Bytes, ReportError> {
        let payload = self.respond(|| sample_payload(report_type, filters)).await?;
        export::payload_to_csv(&payload)
    }
}

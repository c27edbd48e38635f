//! Report viewer.
//!
//! [`render`] turns a cached payload into a display-ready [`ReportView`].
//! [`ReportViewer`] carries the viewer's side-effect actions (export, share
//! and print) and notifies a [`ViewerListener`] after each one.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::client::ReportDataClient;
use super::error::ReportError;
use super::export;
use super::store::ReportStore;
use super::types::{
    FinancialReport, MaintenanceReport, OccupancyReport, ReportFilters, ReportFormat,
    ReportPayload, ReportType,
};

// ============================================================================
// Rendering
// ============================================================================

/// What the viewer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ReportView {
    /// A request is outstanding.
    Loading,
    /// Nothing to show for this report type.
    #[serde(rename_all = "camelCase")]
    Empty {
        /// Selected report type.
        report_type: ReportType,
    },
    /// A rendered report.
    Breakdown(ReportBreakdown),
}

/// A report laid out as summary cards and tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBreakdown {
    /// Report type.
    pub report_type: ReportType,
    /// Heading.
    pub title: String,
    /// Human-readable period.
    pub period: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Headline figures.
    pub cards: Vec<SummaryCard>,
    /// Tables.
    pub sections: Vec<BreakdownSection>,
}

/// A labelled headline figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    /// Label.
    pub label: String,
    /// Formatted value.
    pub value: String,
}

/// A titled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownSection {
    /// Table title.
    pub title: String,
    /// Column headings.
    pub columns: Vec<String>,
    /// Formatted cells, one row per entry.
    pub rows: Vec<Vec<String>>,
}

/// Picks what to show for `report_type`.
///
/// Loading wins over data. A payload of a different kind than `report_type`
/// renders as empty.
#[must_use]
pub fn render(report_type: ReportType, data: Option<&ReportPayload>, is_loading: bool) -> ReportView {
    if is_loading {
        return ReportView::Loading;
    }
    match data {
        Some(payload) if payload.report_type() == report_type => {
            ReportView::Breakdown(breakdown(payload))
        }
        _ => ReportView::Empty { report_type },
    }
}

/// Lays out a payload.
#[must_use]
pub fn breakdown(payload: &ReportPayload) -> ReportBreakdown {
    let (cards, sections) = match payload {
        ReportPayload::Financial(report) => financial_layout(report),
        ReportPayload::Occupancy(report) => occupancy_layout(report),
        ReportPayload::Maintenance(report) => maintenance_layout(report),
    };

    let report_type = payload.report_type();
    ReportBreakdown {
        report_type,
        title: report_type.title().to_string(),
        period: payload.period().to_string(),
        generated_at: payload.generated_at(),
        cards,
        sections,
    }
}

fn financial_layout(report: &FinancialReport) -> (Vec<SummaryCard>, Vec<BreakdownSection>) {
    let s = &report.summary;
    let cards = vec![
        card("Total Income", money(s.total_income)),
        card("Total Expenses", money(s.total_expenses)),
        card("Net Profit", money(s.net_profit)),
        card("Profit Margin", percent(s.profit_margin)),
    ];

    let income = section(
        "Income by Property",
        &["Property", "Total Income", "Payments"],
        report.income_breakdown.iter().map(|row| {
            vec![
                row.property_name.clone(),
                money(row.total_income),
                row.payment_count.to_string(),
            ]
        }),
    );
    let expenses = section(
        "Expenses by Category",
        &["Category", "Total Amount", "Records"],
        report.expense_breakdown.iter().map(|row| {
            vec![
                label(&row.category),
                money(row.total_amount),
                row.count.to_string(),
            ]
        }),
    );

    (cards, vec![income, expenses])
}

fn occupancy_layout(report: &OccupancyReport) -> (Vec<SummaryCard>, Vec<BreakdownSection>) {
    let s = &report.summary;
    let cards = vec![
        card("Total Rooms", s.total_rooms.to_string()),
        card("Occupied Rooms", s.occupied_rooms.to_string()),
        card("Vacant Rooms", s.vacant_rooms.to_string()),
        card("Occupancy Rate", percent(s.occupancy_rate)),
    ];

    let by_property = section(
        "Occupancy by Property",
        &["Property", "Total Rooms", "Occupied", "Occupancy Rate"],
        report.occupancy_by_property.iter().map(|row| {
            vec![
                row.property_name.clone(),
                row.total_rooms.to_string(),
                row.occupied_rooms.to_string(),
                percent(row.occupancy_rate),
            ]
        }),
    );
    let contracts = section(
        "Contract Activity",
        &["Month", "New", "Ended", "Active"],
        report.contract_history.iter().map(|row| {
            vec![
                row.month.clone(),
                row.new_contracts.to_string(),
                row.ended_contracts.to_string(),
                row.active_contracts.to_string(),
            ]
        }),
    );

    (cards, vec![by_property, contracts])
}

fn maintenance_layout(report: &MaintenanceReport) -> (Vec<SummaryCard>, Vec<BreakdownSection>) {
    let s = &report.summary;
    let cards = vec![
        card("Total Requests", s.total_requests.to_string()),
        card("Completed", s.completed_requests.to_string()),
        card("Pending", s.pending_requests.to_string()),
        card("In Progress", s.in_progress_requests.to_string()),
        card("Completion Rate", percent(s.completion_rate)),
        card("Avg Resolution", days(s.avg_resolution_time_days)),
    ];

    let by_category = section(
        "Requests by Category",
        &["Category", "Requests", "Completed"],
        report.requests_by_category.iter().map(|row| {
            vec![
                label(&row.category),
                row.count.to_string(),
                row.completed_count.to_string(),
            ]
        }),
    );
    let by_priority = section(
        "Requests by Priority",
        &["Priority", "Requests", "Avg Resolution"],
        report.requests_by_priority.iter().map(|row| {
            vec![
                label(row.priority.as_str()),
                row.count.to_string(),
                row.avg_resolution_time_days.map_or_else(|| "-".to_string(), days),
            ]
        }),
    );
    let recent = section(
        "Recent Requests",
        &["ID", "Title", "Property", "Category", "Priority", "Status", "Created", "Completed"],
        report.recent_requests.iter().map(|row| {
            vec![
                row.id.clone(),
                row.title.clone(),
                row.property_name.clone(),
                label(&row.category),
                label(row.priority.as_str()),
                label(row.status.as_str()),
                row.created_at.format("%Y-%m-%d").to_string(),
                row.completed_at
                    .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string()),
            ]
        }),
    );

    (cards, vec![by_category, by_priority, recent])
}

fn card(label: &str, value: String) -> SummaryCard {
    SummaryCard {
        label: label.to_string(),
        value,
    }
}

fn section(
    title: &str,
    columns: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> BreakdownSection {
    BreakdownSection {
        title: title.to_string(),
        columns: columns.iter().map(|c| (*c).to_string()).collect(),
        rows: rows.collect(),
    }
}

/// `in_progress` -> `In progress`.
fn label(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Two decimal places with thousands separators, e.g. `$41,050.00`.
fn money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs().round_dp(2));
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn percent(rate: Decimal) -> String {
    format!("{:.1}%", rate.round_dp(1))
}

fn days(value: Decimal) -> String {
    format!("{:.1} days", value.round_dp(1))
}

// ============================================================================
// Actions
// ============================================================================

/// Where a report is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMethod {
    /// Copy a link.
    Link,
    /// Compose an email.
    Email,
}

impl ShareMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for ShareMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host should do to complete a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "url", rename_all = "camelCase")]
pub enum ShareAction {
    /// Put this link on the clipboard.
    CopyToClipboard(String),
    /// Open this `mailto:` link.
    OpenMailto(String),
}

/// A file ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: &'static str,
    /// File contents.
    pub bytes: Bytes,
}

/// Notified after each completed viewer action.
pub trait ViewerListener: Send + Sync {
    /// A report was exported.
    fn on_export(&self, _report_type: ReportType, _format: ReportFormat) {}

    /// A report was shared.
    fn on_share(&self, _report_type: ReportType, _method: ShareMethod) {}

    /// A report was printed.
    fn on_print(&self, _report_type: ReportType) {}
}

impl ViewerListener for () {}

/// Export, share and print actions over the report store.
#[derive(Debug)]
pub struct ReportViewer<C, L = ()> {
    store: Arc<ReportStore<C>>,
    share_base: Url,
    listener: L,
}

impl<C: ReportDataClient> ReportViewer<C> {
    /// Creates a viewer whose share links point at `public_base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Export` if the URL cannot carry a path.
    pub fn new(store: Arc<ReportStore<C>>, public_base_url: &str) -> Result<Self, ReportError> {
        let share_base = Url::parse(public_base_url)
            .map_err(|e| ReportError::export(format!("invalid share URL: {e}")))?;
        if share_base.cannot_be_a_base() {
            return Err(ReportError::export(format!(
                "share URL cannot carry a path: {public_base_url}"
            )));
        }

        Ok(Self {
            store,
            share_base,
            listener: (),
        })
    }
}

impl<C: ReportDataClient, L: ViewerListener> ReportViewer<C, L> {
    /// Replaces the listener.
    pub fn with_listener<M: ViewerListener>(self, listener: M) -> ReportViewer<C, M> {
        ReportViewer {
            store: self.store,
            share_base: self.share_base,
            listener,
        }
    }

    /// The store this viewer reads from.
    pub const fn store(&self) -> &Arc<ReportStore<C>> {
        &self.store
    }

    /// Renders the store's current state for `report_type`.
    pub async fn view(&self, report_type: ReportType) -> ReportView {
        let data = self.store.report(report_type).await;
        render(report_type, data.as_ref(), self.store.is_loading())
    }

    /// Produces a downloadable file.
    ///
    /// CSV is fetched from the report API through the store. PDF yields a
    /// print-ready HTML document for the host to print to PDF. JSON is the
    /// cached payload.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NoReportData` when a PDF or JSON export has no
    /// cached payload, and `ReportError::Export` when the CSV fetch fails.
    pub async fn export(
        &self,
        report_type: ReportType,
        format: ReportFormat,
        filters: &ReportFilters,
    ) -> Result<ExportArtifact, ReportError> {
        let date = Utc::now().date_naive();

        let artifact = match format {
            ReportFormat::Csv => {
                let Some(bytes) = self.store.export_report_as_csv(report_type, filters).await else {
                    let message = self
                        .store
                        .error()
                        .await
                        .unwrap_or_else(|| "CSV export returned no data".to_string());
                    warn!(report_type = %report_type, %message, "Export aborted");
                    return Err(ReportError::Export(message));
                };
                ExportArtifact {
                    file_name: format!("{report_type}-report-{date}.csv"),
                    content_type: "text/csv",
                    bytes,
                }
            }
            ReportFormat::Pdf => {
                let payload = self.cached(report_type).await?;
                let document = export::print_document(&breakdown(&payload));
                ExportArtifact {
                    file_name: format!("{report_type}-report-{date}.html"),
                    content_type: "text/html; charset=utf-8",
                    bytes: Bytes::from(document),
                }
            }
            ReportFormat::Json => {
                let payload = self.cached(report_type).await?;
                ExportArtifact {
                    file_name: format!("{report_type}-report-{date}.json"),
                    content_type: "application/json",
                    bytes: Bytes::from(serde_json::to_vec_pretty(&payload)?),
                }
            }
        };

        debug!(report_type = %report_type, format = %format, file = %artifact.file_name, "Report exported");
        self.listener.on_export(report_type, format);
        Ok(artifact)
    }

    /// Builds a share link for the report and the filters it was run with.
    pub fn share(
        &self,
        report_type: ReportType,
        method: ShareMethod,
        filters: &ReportFilters,
    ) -> ShareAction {
        let link = self.share_link(report_type, filters);

        let action = match method {
            ShareMethod::Link => ShareAction::CopyToClipboard(link.to_string()),
            ShareMethod::Email => {
                let subject = format!("{} ({})", report_type.title(), filters.period());
                let body = format!("Take a look at this report: {link}");
                ShareAction::OpenMailto(format!(
                    "mailto:?subject={}&body={}",
                    urlencoding::encode(&subject),
                    urlencoding::encode(&body)
                ))
            }
        };

        self.listener.on_share(report_type, method);
        action
    }

    /// Print-ready HTML for the cached report, or `None` when nothing is cached.
    pub async fn print(&self, report_type: ReportType) -> Option<String> {
        let payload = self.store.report(report_type).await?;
        let document = export::print_document(&breakdown(&payload));
        self.listener.on_print(report_type);
        Some(document)
    }

    fn share_link(&self, report_type: ReportType, filters: &ReportFilters) -> Url {
        let mut link = self.share_base.clone();
        if let Ok(mut segments) = link.path_segments_mut() {
            segments.pop_if_empty().push("reports").push(report_type.as_str());
        }

        let pairs = filters.query_pairs();
        if pairs.is_empty() {
            link.set_query(None);
        } else {
            link.query_pairs_mut()
                .clear()
                .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        }
        link
    }

    async fn cached(&self, report_type: ReportType) -> Result<ReportPayload, ReportError> {
        self.store
            .report(report_type)
            .await
            .ok_or(ReportError::NoReportData(report_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::mock::{MockReportClient, sample_payload};
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn filters() -> ReportFilters {
        ReportFilters::new().with_property("p1").with_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ViewerListener for Recorder {
        fn on_export(&self, report_type: ReportType, format: ReportFormat) {
            self.0.lock().unwrap().push(format!("export:{report_type}:{format}"));
        }

        fn on_share(&self, report_type: ReportType, method: ShareMethod) {
            self.0.lock().unwrap().push(format!("share:{report_type}:{method}"));
        }

        fn on_print(&self, report_type: ReportType) {
            self.0.lock().unwrap().push(format!("print:{report_type}"));
        }
    }

    fn viewer() -> ReportViewer<MockReportClient> {
        let store = Arc::new(ReportStore::new(MockReportClient::new()));
        ReportViewer::new(store, "https://app.rentdesk.test/dashboard").unwrap()
    }

    #[test]
    fn test_render_loading_wins() {
        let payload = sample_payload(ReportType::Financial, &filters());
        assert_eq!(
            render(ReportType::Financial, Some(&payload), true),
            ReportView::Loading
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(ReportType::Occupancy))]
    fn test_render_empty_for_missing_or_mismatched(#[case] cached: Option<ReportType>) {
        let payload = cached.map(|t| sample_payload(t, &filters()));
        assert_eq!(
            render(ReportType::Financial, payload.as_ref(), false),
            ReportView::Empty {
                report_type: ReportType::Financial
            }
        );
    }

    #[test]
    fn test_render_financial_breakdown() {
        let payload = sample_payload(ReportType::Financial, &filters());
        let ReportView::Breakdown(view) = render(ReportType::Financial, Some(&payload), false) else {
            panic!("expected breakdown");
        };

        assert_eq!(view.title, "Financial Report");
        assert_eq!(view.period, "2024-01-01 to 2024-01-31");
        assert_eq!(view.cards[0].value, "$18,500.00");
        assert_eq!(view.sections[0].rows[0][0], "Sunrise Residence");
        assert_eq!(view.sections[1].rows[0][0], "Maintenance");
    }

    #[test]
    fn test_maintenance_labels_are_humanized() {
        let payload = sample_payload(ReportType::Maintenance, &filters());
        let view = breakdown(&payload);
        let recent = &view.sections[2];
        assert!(recent.rows.iter().any(|row| row[5] == "In progress"));
    }

    #[rstest]
    #[case(dec!(0), "$0.00")]
    #[case(dec!(999.5), "$999.50")]
    #[case(dec!(1234567.891), "$1,234,567.89")]
    #[case(dec!(-2500), "-$2,500.00")]
    fn test_money_format(#[case] amount: Decimal, #[case] expected: &str) {
        assert_eq!(money(amount), expected);
    }

    #[test]
    fn test_share_link_carries_filters() {
        let viewer = viewer();
        let action = viewer.share(ReportType::Occupancy, ShareMethod::Link, &filters());
        assert_eq!(
            action,
            ShareAction::CopyToClipboard(
                "https://app.rentdesk.test/dashboard/reports/occupancy?propertyId=p1&startDate=2024-01-01&endDate=2024-01-31"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_share_link_without_filters_has_no_query() {
        let viewer = viewer();
        let action = viewer.share(ReportType::Financial, ShareMethod::Link, &ReportFilters::new());
        assert_eq!(
            action,
            ShareAction::CopyToClipboard(
                "https://app.rentdesk.test/dashboard/reports/financial".to_string()
            )
        );
    }

    #[test]
    fn test_share_email_builds_mailto() {
        let viewer = viewer();
        let ShareAction::OpenMailto(mailto) =
            viewer.share(ReportType::Maintenance, ShareMethod::Email, &filters())
        else {
            panic!("expected mailto");
        };
        assert!(mailto.starts_with("mailto:?subject=Maintenance%20Report"));
        assert!(mailto.contains("body=Take%20a%20look"));
        assert!(mailto.contains("reports%2Fmaintenance"));
    }

    #[test]
    fn test_invalid_share_base_is_rejected() {
        let store = Arc::new(ReportStore::new(MockReportClient::new()));
        assert!(ReportViewer::new(store, "not a url").is_err());
    }

    #[tokio::test]
    async fn test_export_csv_notifies_listener() {
        let viewer = viewer().with_listener(Recorder::default());
        let artifact = viewer
            .export(ReportType::Financial, ReportFormat::Csv, &filters())
            .await
            .unwrap();

        assert!(artifact.file_name.starts_with("financial-report-"));
        assert!(artifact.file_name.ends_with(".csv"));
        assert_eq!(artifact.content_type, "text/csv");
        assert!(!artifact.bytes.is_empty());
        assert_eq!(
            *viewer.listener.0.lock().unwrap(),
            vec!["export:financial:csv".to_string()]
        );
    }

    #[tokio::test]
    async fn test_export_csv_failure_surfaces_store_error() {
        let store = Arc::new(ReportStore::new(MockReportClient::new().failing("offline")));
        let viewer = ReportViewer::new(Arc::clone(&store), "http://localhost:3000")
            .unwrap()
            .with_listener(Recorder::default());

        let err = viewer
            .export(ReportType::Occupancy, ReportFormat::Csv, &filters())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Export failed: Report service unavailable: offline");
        assert!(viewer.listener.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_json_requires_cached_report() {
        let viewer = viewer();
        let err = viewer
            .export(ReportType::Occupancy, ReportFormat::Json, &filters())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NoReportData(ReportType::Occupancy)));

        viewer.store().generate_occupancy_report(&filters()).await;
        let artifact = viewer
            .export(ReportType::Occupancy, ReportFormat::Json, &filters())
            .await
            .unwrap();
        let parsed: ReportPayload = serde_json::from_slice(&artifact.bytes).unwrap();
        assert_eq!(parsed.report_type(), ReportType::Occupancy);
    }

    #[tokio::test]
    async fn test_print_renders_cached_report() {
        let viewer = viewer().with_listener(Recorder::default());
        assert!(viewer.print(ReportType::Financial).await.is_none());

        viewer.store().generate_financial_report(&filters()).await;
        let html = viewer.print(ReportType::Financial).await.unwrap();

        assert!(html.contains("<h1>Financial Report</h1>"));
        assert_eq!(
            *viewer.listener.0.lock().unwrap(),
            vec!["print:financial".to_string()]
        );
    }

    #[tokio::test]
    async fn test_view_reads_store() {
        let viewer = viewer();
        assert_eq!(
            viewer.view(ReportType::Maintenance).await,
            ReportView::Empty {
                report_type: ReportType::Maintenance
            }
        );

        viewer.store().generate_maintenance_report(&filters()).await;
        assert!(matches!(
            viewer.view(ReportType::Maintenance).await,
            ReportView::Breakdown(_)
        ));
    }
}

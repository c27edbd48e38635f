//! Report state store.
//!
//! Owns the cached report payloads, the generation history, the scheduled
//! reports and the loading/error flags. Actions never return errors: a
//! failure is logged and kept as a display string in [`ReportStore::error`],
//! and the previously cached payload stays in place.
//!
//! Every report type has its own request counter. A response only commits
//! when its token is still the newest issued for that type, so a slow stale
//! request can never overwrite a newer result.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::Utc;
use rentdesk_shared::types::{PageRequest, PageResponse, ReportHistoryId, ScheduledReportId};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::client::ReportDataClient;
use super::error::ReportError;
use super::history::{HistoryQuery, ReportHistory};
use super::schedule::{NewScheduledReport, ScheduleBook, ScheduledReport, ScheduledReportPatch};
use super::types::{
    FinancialReport, MaintenanceReport, OccupancyReport, ReportFilters, ReportHistoryEntry,
    ReportPayload, ReportType,
};

/// Result of a generate action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GenerationOutcome {
    /// The payload was cached and recorded in history.
    #[serde(rename_all = "camelCase")]
    Committed {
        /// History entry created for the report.
        history_id: ReportHistoryId,
    },
    /// A newer request for the same report type was issued meanwhile; the
    /// response was dropped.
    Superseded,
    /// The client failed; `message` is also stored as the store error.
    Failed {
        /// Display message.
        message: String,
    },
}

impl GenerationOutcome {
    /// Whether the report was cached.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Point-in-time copy of the store state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    /// Cached financial report.
    pub financial_report: Option<FinancialReport>,
    /// Cached occupancy report.
    pub occupancy_report: Option<OccupancyReport>,
    /// Cached maintenance report.
    pub maintenance_report: Option<MaintenanceReport>,
    /// Type of the most recently committed report.
    pub last_generated_report: Option<ReportType>,
    /// Generated reports, newest first.
    pub report_history: Vec<ReportHistoryEntry>,
    /// Scheduled reports.
    pub scheduled_reports: Vec<ScheduledReport>,
    /// Whether any request is outstanding.
    pub is_loading: bool,
    /// Last failure message.
    pub error: Option<String>,
}

#[derive(Debug)]
struct StoreState {
    slots: [Option<ReportPayload>; 3],
    last_generated_report: Option<ReportType>,
    history: ReportHistory,
    schedules: ScheduleBook,
    error: Option<String>,
}

/// Decrements the in-flight counter when a request finishes, however it ends.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The report state store.
#[derive(Debug)]
pub struct ReportStore<C> {
    client: C,
    state: RwLock<StoreState>,
    tokens: [AtomicU64; 3],
    in_flight: AtomicUsize,
}

impl<C: ReportDataClient> ReportStore<C> {
    /// Creates a store keeping the default number of history entries.
    pub fn new(client: C) -> Self {
        Self::with_history_capacity(client, super::history::DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a store keeping `capacity` history entries.
    pub fn with_history_capacity(client: C, capacity: usize) -> Self {
        Self {
            client,
            state: RwLock::new(StoreState {
                slots: [None, None, None],
                last_generated_report: None,
                history: ReportHistory::with_capacity(capacity),
                schedules: ScheduleBook::new(),
                error: None,
            }),
            tokens: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The underlying report client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Marks a request as started and clears the previous error.
    async fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.write().await.error = None;
        LoadingGuard(&self.in_flight)
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Fetches a report of `report_type` and caches it.
    pub async fn generate(&self, report_type: ReportType, filters: &ReportFilters) -> GenerationOutcome {
        let slot = report_type.index();
        let token = self.tokens[slot].fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = self.begin().await;

        debug!(report_type = %report_type, token, "Requesting report");

        let result = match report_type {
            ReportType::Financial => self
                .client
                .financial_report(filters)
                .await
                .map(ReportPayload::Financial),
            ReportType::Occupancy => self
                .client
                .occupancy_report(filters)
                .await
                .map(ReportPayload::Occupancy),
            ReportType::Maintenance => self
                .client
                .maintenance_report(filters)
                .await
                .map(ReportPayload::Maintenance),
        };

        let mut state = self.state.write().await;

        let newest = self.tokens[slot].load(Ordering::SeqCst);
        if newest != token {
            debug!(report_type = %report_type, token, newest, "Dropping superseded report response");
            return GenerationOutcome::Superseded;
        }

        match result {
            Ok(payload) => {
                let entry = ReportHistoryEntry {
                    id: ReportHistoryId::new(),
                    report_type,
                    filters: filters.clone(),
                    generated_at: Utc::now(),
                    data: payload.clone(),
                };
                let history_id = entry.id;

                state.slots[slot] = Some(payload);
                state.last_generated_report = Some(report_type);
                state.history.push(entry);

                info!(report_type = %report_type, %history_id, "Report generated");
                GenerationOutcome::Committed { history_id }
            }
            Err(e) => {
                error!(report_type = %report_type, error = %e, "Report generation failed");
                let message = e.to_string();
                state.error = Some(message.clone());
                GenerationOutcome::Failed { message }
            }
        }
    }

    /// Fetches and caches a financial report.
    pub async fn generate_financial_report(&self, filters: &ReportFilters) -> GenerationOutcome {
        self.generate(ReportType::Financial, filters).await
    }

    /// Fetches and caches an occupancy report.
    pub async fn generate_occupancy_report(&self, filters: &ReportFilters) -> GenerationOutcome {
        self.generate(ReportType::Occupancy, filters).await
    }

    /// Fetches and caches a maintenance report.
    pub async fn generate_maintenance_report(&self, filters: &ReportFilters) -> GenerationOutcome {
        self.generate(ReportType::Maintenance, filters).await
    }

    /// Fetches a CSV rendition of a report for the caller to save.
    ///
    /// Only the loading and error flags are touched. Returns `None` on failure.
    pub async fn export_report_as_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> Option<Bytes> {
        let _loading = self.begin().await;

        match self.client.export_csv(report_type, filters).await {
            Ok(bytes) => {
                debug!(report_type = %report_type, size = bytes.len(), "CSV export fetched");
                Some(bytes)
            }
            Err(e) => {
                error!(report_type = %report_type, error = %e, "CSV export failed");
                self.state.write().await.error = Some(e.to_string());
                None
            }
        }
    }

    // ========================================================================
    // Scheduled reports
    // ========================================================================

    /// All scheduled reports, in creation order.
    pub async fn fetch_scheduled_reports(&self) -> Vec<ScheduledReport> {
        let mut state = self.state.write().await;
        state.error = None;
        state.schedules.list().to_vec()
    }

    /// One page of scheduled reports.
    pub async fn scheduled_reports_page(&self, request: PageRequest) -> PageResponse<ScheduledReport> {
        self.state.read().await.schedules.page(request)
    }

    /// Creates a schedule. Returns `None` and sets the error on invalid input.
    pub async fn create_scheduled_report(&self, input: NewScheduledReport) -> Option<ScheduledReport> {
        self.try_create_scheduled_report(input).await.ok()
    }

    /// Creates a schedule, returning the failure as well as recording it.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidSchedule` when the input fails validation.
    pub async fn try_create_scheduled_report(
        &self,
        input: NewScheduledReport,
    ) -> Result<ScheduledReport, ReportError> {
        let mut state = self.state.write().await;
        state.error = None;
        let result = state.schedules.create(input, Utc::now());
        match result {
            Ok(schedule) => {
                info!(schedule_id = %schedule.id, name = %schedule.name, "Scheduled report created");
                Ok(schedule)
            }
            Err(e) => Err(record(&mut state, e)),
        }
    }

    /// Applies a patch to one schedule. Returns `None` and sets the error on
    /// invalid input or an unknown ID.
    pub async fn update_scheduled_report(
        &self,
        id: ScheduledReportId,
        patch: ScheduledReportPatch,
    ) -> Option<ScheduledReport> {
        self.try_update_scheduled_report(id, patch).await.ok()
    }

    /// Applies a patch to one schedule, returning the failure as well as
    /// recording it.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ScheduleNotFound` for an unknown ID and
    /// `ReportError::InvalidSchedule` when the patched schedule fails
    /// validation.
    pub async fn try_update_scheduled_report(
        &self,
        id: ScheduledReportId,
        patch: ScheduledReportPatch,
    ) -> Result<ScheduledReport, ReportError> {
        let mut state = self.state.write().await;
        state.error = None;
        let result = state.schedules.update(id, patch, Utc::now());
        match result {
            Ok(schedule) => {
                info!(schedule_id = %id, is_active = schedule.is_active, "Scheduled report updated");
                Ok(schedule)
            }
            Err(e) => Err(record(&mut state, e)),
        }
    }

    /// Deletes a schedule. Returns `false` and sets the error for an unknown ID.
    pub async fn delete_scheduled_report(&self, id: ScheduledReportId) -> bool {
        let mut state = self.state.write().await;
        state.error = None;
        let result = state.schedules.delete(id);
        match result {
            Ok(_) => {
                info!(schedule_id = %id, "Scheduled report deleted");
                true
            }
            Err(e) => {
                record(&mut state, e);
                false
            }
        }
    }

    // ========================================================================
    // Reset
    // ========================================================================

    /// Empties the three report slots and `last_generated_report`.
    ///
    /// History and schedules are kept.
    pub async fn clear_reports(&self) {
        let mut state = self.state.write().await;
        state.slots = [None, None, None];
        state.last_generated_report = None;
    }

    /// Clears the error message only.
    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Copy of the whole store state.
    pub async fn snapshot(&self) -> ReportSnapshot {
        let state = self.state.read().await;
        let [financial, occupancy, maintenance] = &state.slots;
        ReportSnapshot {
            financial_report: financial.as_ref().and_then(as_financial),
            occupancy_report: occupancy.as_ref().and_then(as_occupancy),
            maintenance_report: maintenance.as_ref().and_then(as_maintenance),
            last_generated_report: state.last_generated_report,
            report_history: state.history.iter().cloned().collect(),
            scheduled_reports: state.schedules.list().to_vec(),
            is_loading: self.is_loading(),
            error: state.error.clone(),
        }
    }

    /// Cached payload for `report_type`.
    pub async fn report(&self, report_type: ReportType) -> Option<ReportPayload> {
        self.state.read().await.slots[report_type.index()].clone()
    }

    /// Cached financial report.
    pub async fn financial_report(&self) -> Option<FinancialReport> {
        self.report(ReportType::Financial).await.as_ref().and_then(as_financial)
    }

    /// Cached occupancy report.
    pub async fn occupancy_report(&self) -> Option<OccupancyReport> {
        self.report(ReportType::Occupancy).await.as_ref().and_then(as_occupancy)
    }

    /// Cached maintenance report.
    pub async fn maintenance_report(&self) -> Option<MaintenanceReport> {
        self.report(ReportType::Maintenance).await.as_ref().and_then(as_maintenance)
    }

    /// Type of the most recently committed report.
    pub async fn last_generated_report(&self) -> Option<ReportType> {
        self.state.read().await.last_generated_report
    }

    /// History, newest first.
    pub async fn history(&self) -> Vec<ReportHistoryEntry> {
        self.state.read().await.history.iter().cloned().collect()
    }

    /// One page of history, optionally restricted to a report type.
    pub async fn history_page(&self, query: HistoryQuery) -> PageResponse<ReportHistoryEntry> {
        self.state.read().await.history.query(&query)
    }

    /// Whether any request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Last failure message.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }
}

fn record(state: &mut StoreState, err: ReportError) -> ReportError {
    error!(error = %err, "Scheduled report action failed");
    state.error = Some(err.to_string());
    err
}

fn as_financial(payload: &ReportPayload) -> Option<FinancialReport> {
    match payload {
        ReportPayload::Financial(report) => Some(report.clone()),
        _ => None,
    }
}

fn as_occupancy(payload: &ReportPayload) -> Option<OccupancyReport> {
    match payload {
        ReportPayload::Occupancy(report) => Some(report.clone()),
        _ => None,
    }
}

fn as_maintenance(payload: &ReportPayload) -> Option<MaintenanceReport> {
    match payload {
        ReportPayload::Maintenance(report) => Some(report.clone()),
        _ => None,
    }
}

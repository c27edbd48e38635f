//! Report data source contract.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

use super::error::ReportError;
use super::types::{
    FinancialReport, MaintenanceReport, OccupancyReport, ReportFilters, ReportType,
};

/// Source of report payloads.
///
/// Implemented by `rentdesk-client` over HTTP and by
/// [`crate::reports::mock::MockReportClient`] for sample data.
pub trait ReportDataClient: Send + Sync {
    /// Fetch a financial report.
    fn financial_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<FinancialReport, ReportError>> + Send;

    /// Fetch an occupancy report.
    fn occupancy_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<OccupancyReport, ReportError>> + Send;

    /// Fetch a maintenance report.
    fn maintenance_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<MaintenanceReport, ReportError>> + Send;

    /// Fetch a report rendered as CSV (`text/csv`).
    fn export_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<Bytes, ReportError>> + Send;
}

impl<C: ReportDataClient> ReportDataClient for Arc<C> {
    fn financial_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<FinancialReport, ReportError>> + Send {
        (**self).financial_report(filters)
    }

    fn occupancy_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<OccupancyReport, ReportError>> + Send {
        (**self).occupancy_report(filters)
    }

    fn maintenance_report(
        &self,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<MaintenanceReport, ReportError>> + Send {
        (**self).maintenance_report(filters)
    }

    fn export_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> impl Future<Output = Result<Bytes, ReportError>> + Send {
        (**self).export_csv(report_type, filters)
    }
}

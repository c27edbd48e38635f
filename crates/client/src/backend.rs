//! Configured report data source

use bytes::Bytes;
use rentdesk_core::reports::{
    FinancialReport, MaintenanceReport, MockReportClient, OccupancyReport, ReportDataClient,
    ReportError, ReportFilters, ReportType,
};
use rentdesk_shared::config::ReportApiConfig;
use tracing::info;

use crate::error::ClientResult;
use crate::http::HttpReportClient;

/// Either the remote report API or the built-in sample data
#[derive(Debug)]
pub enum ReportBackend {
    /// Remote report API
    Http(HttpReportClient),
    /// Sample data
    Mock(MockReportClient),
}

impl ReportBackend {
    /// Pick the backend named by `report_api.use_mock`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ReportApiConfig) -> ClientResult<Self> {
        if config.use_mock {
            info!("Serving sample report data");
            return Ok(Self::Mock(MockReportClient::new()));
        }

        info!(base_url = %config.base_url, "Using remote report API");
        Ok(Self::Http(HttpReportClient::new(config)?))
    }

    /// Whether this is the sample data backend
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }
}

impl ReportDataClient for ReportBackend {
    async fn financial_report(&self, filters: &ReportFilters) -> Result<FinancialReport, ReportError> {
        match self {
            Self::Http(client) => client.financial_report(filters).await,
            Self::Mock(client) => client.financial_report(filters).await,
        }
    }

    async fn occupancy_report(&self, filters: &ReportFilters) -> Result<OccupancyReport, ReportError> {
        match self {
            Self::Http(client) => client.occupancy_report(filters).await,
            Self::Mock(client) => client.occupancy_report(filters).await,
        }
    }

    async fn maintenance_report(
        &self,
        filters: &ReportFilters,
    ) -> Result<MaintenanceReport, ReportError> {
        match self {
            Self::Http(client) => client.maintenance_report(filters).await,
            Self::Mock(client) => client.maintenance_report(filters).await,
        }
    }

    async fn export_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> Result<Bytes, ReportError> {
        match self {
            Self::Http(client) => client.export_csv(report_type, filters).await,
            Self::Mock(client) => client.export_csv(report_type, filters).await,
        }
    }
}

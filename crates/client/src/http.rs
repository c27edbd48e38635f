//! HTTP client for the remote report API

use std::time::Duration;

use bytes::Bytes;
use rentdesk_core::reports::{
    FinancialReport, MaintenanceReport, OccupancyReport, ReportDataClient, ReportError,
    ReportFilters, ReportFormat, ReportType,
};
use rentdesk_shared::config::ReportApiConfig;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// HTTP client for the report endpoints
#[derive(Debug, Clone)]
pub struct HttpReportClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpReportClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &ReportApiConfig) -> ClientResult<Self> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, path: &str, filters: &ReportFilters, format: ReportFormat) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let query = filters.clone().with_format(format).query_pairs();

        let mut request = self.client.get(&url).query(&query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> ClientResult<T> {
        let path = format!("reports/{report_type}");
        debug!(%report_type, "Fetching report");

        let response = self.request(&path, filters, ReportFormat::Json).send().await?;
        let body = Self::check(response).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn fetch_csv(&self, report_type: ReportType, filters: &ReportFilters) -> ClientResult<Bytes> {
        let path = format!("reports/{report_type}/export");
        debug!(%report_type, "Fetching CSV export");

        let response = self.request(&path, filters, ReportFormat::Csv).send().await?;
        Ok(Self::check(response).await?.bytes().await?)
    }

    /// Map non-success statuses to errors
    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST => ClientError::Validation(text),
            _ => ClientError::Status {
                status: status.as_u16(),
                message: text,
            },
        })
    }
}

impl ReportDataClient for HttpReportClient {
    async fn financial_report(&self, filters: &ReportFilters) -> Result<FinancialReport, ReportError> {
        Ok(self.fetch(ReportType::Financial, filters).await?)
    }

    async fn occupancy_report(&self, filters: &ReportFilters) -> Result<OccupancyReport, ReportError> {
        Ok(self.fetch(ReportType::Occupancy, filters).await?)
    }

    async fn maintenance_report(
        &self,
        filters: &ReportFilters,
    ) -> Result<MaintenanceReport, ReportError> {
        Ok(self.fetch(ReportType::Maintenance, filters).await?)
    }

    async fn export_csv(
        &self,
        report_type: ReportType,
        filters: &ReportFilters,
    ) -> Result<Bytes, ReportError> {
        Ok(self.fetch_csv(report_type, filters).await?)
    }
}

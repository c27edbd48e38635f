//! Report routes.
//!
//! Drive the generator, read the store and run the viewer's export, share
//! and print actions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use rentdesk_core::reports::{
    GenerateOutcome, HistoryQuery, ReportError, ReportFilters, ReportFormat, ReportType,
    ShareMethod,
};
use rentdesk_shared::AppError;
use rentdesk_shared::types::PageRequest;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error_response;
use crate::AppState;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(get_snapshot).delete(clear_reports))
        .route("/reports/error", delete(clear_error))
        .route("/reports/generate", post(generate_report))
        .route("/reports/preview", post(preview_report))
        .route("/reports/generator", get(get_generator))
        .route("/reports/history", get(list_history))
        .route("/reports/{report_type}/view", get(view_report))
        .route("/reports/{report_type}/export", get(export_report))
        .route("/reports/{report_type}/share", get(share_report))
        .route("/reports/{report_type}/print", get(print_report))
}

// ============================================================================
// Request Types
// ============================================================================

/// Body for generate and preview.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Report to generate.
    pub report_type: ReportType,
    /// Filters; missing fields are reported by validation.
    #[serde(default)]
    pub filters: ReportFilters,
}

/// Query parameters for the history listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    /// Only entries of this report type.
    pub report_type: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Query parameters for sharing.
#[derive(Debug, Deserialize)]
pub struct ShareParams {
    /// Link or email.
    pub method: ShareMethod,
}

// ============================================================================
// Handlers
// ============================================================================

/// Returns the whole store state.
async fn get_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

/// Empties the report slots.
async fn clear_reports(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear_reports().await;
    StatusCode::NO_CONTENT
}

/// Clears the store error.
async fn clear_error(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear_error().await;
    StatusCode::NO_CONTENT
}

/// Validates and generates a report.
async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let report_type = req.report_type;
    let outcome = state.generator.generate_with(report_type, req.filters).await;

    match outcome {
        GenerateOutcome::Invalid { errors } => validation_response(&errors),
        GenerateOutcome::Committed { history_id } => {
            let report = state.store.report(report_type).await;
            info!(%report_type, %history_id, "Report generated via API");
            (
                StatusCode::CREATED,
                Json(json!({
                    "status": "committed",
                    "historyId": history_id,
                    "report": report,
                })),
            )
                .into_response()
        }
        GenerateOutcome::Superseded => error_response(AppError::Conflict(format!(
            "A newer {report_type} report request replaced this one"
        ))),
        GenerateOutcome::Failed { message } => error_response(AppError::ExternalService(message)),
    }
}

/// Validates the selection without generating.
async fn preview_report(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let mut selection = None;
    let result = state
        .generator
        .preview_with(req.report_type, req.filters, |report_type, filters| {
            selection = Some((report_type, filters));
        })
        .await;

    match (result, selection) {
        (Ok(()), Some((report_type, filters))) => Json(json!({
            "reportType": report_type,
            "filters": filters,
        }))
        .into_response(),
        (Err(ReportError::Validation(errors)), _) => validation_response(&errors),
        (Err(e), _) => error_response(e),
        (Ok(()), None) => error_response(AppError::Internal("Preview produced no selection".into())),
    }
}

/// Returns the generator phase, progress and form.
async fn get_generator(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.generator.status();
    Json(json!({
        "phase": status.phase,
        "progress": status.progress.tenths(),
        "percent": status.progress.percent(),
        "isGenerating": state.generator.is_generating(),
        "form": state.generator.form().await,
    }))
}

/// Lists generated reports, newest first.
async fn list_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let report_type = match params.report_type.as_deref() {
        None | Some("") => None,
        Some(raw) => match ReportType::parse(raw) {
            Some(report_type) => Some(report_type),
            None => return unknown_report_type(raw),
        },
    };

    let query = HistoryQuery {
        report_type,
        page: PageRequest::new(
            params.page.unwrap_or(1),
            params.per_page.unwrap_or(PageRequest::default().per_page),
        ),
    };

    Json(state.store.history_page(query).await).into_response()
}

/// Renders the cached report.
async fn view_report(State(state): State<AppState>, Path(report_type): Path<String>) -> Response {
    let Some(report_type) = ReportType::parse(&report_type) else {
        return unknown_report_type(&report_type);
    };
    Json(state.viewer.view(report_type).await).into_response()
}

/// Downloads the report as CSV (default), PDF-ready HTML, or JSON.
async fn export_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Query(filters): Query<ReportFilters>,
) -> Response {
    let Some(report_type) = ReportType::parse(&report_type) else {
        return unknown_report_type(&report_type);
    };
    let format = filters.format.unwrap_or(ReportFormat::Csv);

    match state.viewer.export(report_type, format, &filters).await {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, artifact.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.file_name),
                ),
            ],
            artifact.bytes,
        )
            .into_response(),
        Err(ReportError::Export(message)) => error_response(AppError::ExternalService(message)),
        Err(e) => error_response(e),
    }
}

/// Builds a share link or mailto for the report.
async fn share_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Query(params): Query<ShareParams>,
    Query(filters): Query<ReportFilters>,
) -> Response {
    let Some(report_type) = ReportType::parse(&report_type) else {
        return unknown_report_type(&report_type);
    };
    Json(state.viewer.share(report_type, params.method, &filters)).into_response()
}

/// Returns the print-ready HTML document.
async fn print_report(State(state): State<AppState>, Path(report_type): Path<String>) -> Response {
    let Some(report_type) = ReportType::parse(&report_type) else {
        return unknown_report_type(&report_type);
    };
    match state.viewer.print(report_type).await {
        Some(document) => Html(document).into_response(),
        None => error_response(ReportError::NoReportData(report_type)),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 400 carrying every filter violation.
fn validation_response(errors: &[String]) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "VALIDATION_ERROR",
            "message": errors.first().map_or("Invalid report filters", String::as_str),
            "errors": errors,
        })),
    )
        .into_response()
}

fn unknown_report_type(raw: &str) -> Response {
    error_response(AppError::NotFound(format!("Unknown report type: {raw}")))
}

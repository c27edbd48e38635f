//! Scheduled report routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use rentdesk_core::reports::{NewScheduledReport, ReportError, ScheduledReportPatch};
use rentdesk_shared::types::{PageRequest, ScheduledReportId};

use super::error_response;
use crate::AppState;

/// Creates the scheduled report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/scheduled-reports",
            get(list_schedules).post(create_schedule),
        )
        .route(
            "/scheduled-reports/{id}",
            patch(update_schedule).delete(delete_schedule),
        )
}

/// Lists schedules, one page at a time.
async fn list_schedules(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let page = PageRequest::new(page.page, page.per_page);
    Json(state.store.scheduled_reports_page(page).await)
}

/// Creates a schedule.
async fn create_schedule(
    State(state): State<AppState>,
    Json(input): Json<NewScheduledReport>,
) -> Response {
    match state.store.try_create_scheduled_report(input).await {
        Ok(schedule) => (StatusCode::CREATED, Json(schedule)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Updates a schedule.
async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<ScheduledReportId>,
    Json(patch): Json<ScheduledReportPatch>,
) -> Response {
    match state.store.try_update_scheduled_report(id, patch).await {
        Ok(schedule) => Json(schedule).into_response(),
        Err(e) => error_response(e),
    }
}

/// Deletes a schedule.
async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<ScheduledReportId>,
) -> Response {
    if state.store.delete_scheduled_report(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(ReportError::ScheduleNotFound(id))
    }
}

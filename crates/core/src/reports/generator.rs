//! Report generator controller.
//!
//! Holds the report form (selected type, filters, last validation errors) and
//! drives generation: validate, ask the store, and publish a progress value
//! through a `watch` channel while the store call is outstanding.
//!
//! The progress bar is simulated. It climbs by random steps up to 90% while
//! waiting and jumps to 100% when the store answers; it says nothing about how
//! far along the real request is.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use rentdesk_shared::config::GeneratorConfig;
use rentdesk_shared::types::ReportHistoryId;
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::ReportDataClient;
use super::error::ReportError;
use super::filters::validate_filters_today;
use super::store::{GenerationOutcome, ReportStore};
use super::types::{ReportFilters, ReportType};

/// Smallest simulated step, in tenths of a percent.
const MIN_STEP: u16 = 5;
/// Largest simulated step, in tenths of a percent.
const MAX_STEP: u16 = 150;

/// Simulated progress in tenths of a percent (0..=1000).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Progress(u16);

impl Progress {
    /// Nothing done.
    pub const ZERO: Self = Self(0);
    /// Highest value reached while waiting for the store.
    pub const CAP: Self = Self(900);
    /// Finished.
    pub const COMPLETE: Self = Self(1000);

    /// Raw tenths of a percent.
    #[must_use]
    pub const fn tenths(self) -> u16 {
        self.0
    }

    /// Whole percent, rounded down.
    #[must_use]
    pub const fn percent(self) -> u16 {
        self.0 / 10
    }

    /// Adds `step` tenths, never passing [`Progress::CAP`].
    #[must_use]
    pub fn advance(self, step: u16) -> Self {
        if self >= Self::CAP {
            return self;
        }
        Self(self.0.saturating_add(step).min(Self::CAP.0))
    }
}

/// Generator phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratorPhase {
    /// Waiting for input.
    #[default]
    Idle,
    /// Checking the filters.
    Validating,
    /// Waiting for the store.
    Generating,
}

/// Published generator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorStatus {
    /// Current phase.
    pub phase: GeneratorPhase,
    /// Simulated progress.
    pub progress: Progress,
}

/// The generator's form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorForm {
    /// Selected report type.
    pub report_type: ReportType,
    /// Current filters.
    pub filters: ReportFilters,
    /// Violations from the last validation; empty when it passed.
    pub errors: Vec<String>,
}

impl Default for GeneratorForm {
    fn default() -> Self {
        Self {
            report_type: ReportType::Financial,
            filters: ReportFilters::default(),
            errors: Vec::new(),
        }
    }
}

/// Result of [`ReportGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GenerateOutcome {
    /// The filters were rejected; the store was not called.
    Invalid {
        /// Every violation, primary first.
        errors: Vec<String>,
    },
    /// The report was cached.
    #[serde(rename_all = "camelCase")]
    Committed {
        /// History entry created for the report.
        history_id: ReportHistoryId,
    },
    /// A newer request for the same report type won.
    Superseded,
    /// The store recorded a failure.
    Failed {
        /// Display message.
        message: String,
    },
}

impl GenerateOutcome {
    /// The message to surface first, if any.
    #[must_use]
    pub fn primary_error(&self) -> Option<&str> {
        match self {
            Self::Invalid { errors } => errors.first().map(String::as_str),
            Self::Failed { message } => Some(message),
            Self::Committed { .. } | Self::Superseded => None,
        }
    }
}

impl From<GenerationOutcome> for GenerateOutcome {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Committed { history_id } => Self::Committed { history_id },
            GenerationOutcome::Superseded => Self::Superseded,
            GenerationOutcome::Failed { message } => Self::Failed { message },
        }
    }
}

/// One outstanding generation.
///
/// Dropping it stops its progress ticker and, when it was the last run in
/// flight, publishes `Idle`. This also holds when the caller's future is
/// dropped before the store answers.
struct ActiveRun<'a> {
    status: &'a watch::Sender<GeneratorStatus>,
    in_flight: &'a AtomicUsize,
    ticker: Option<JoinHandle<()>>,
    /// Progress to publish with `Idle`; `None` keeps the current value.
    exit_progress: Option<Progress>,
}

impl<'a> ActiveRun<'a> {
    /// Registers a run; returns it and whether another was already in flight.
    fn start(status: &'a watch::Sender<GeneratorStatus>, in_flight: &'a AtomicUsize) -> (Self, bool) {
        let overlapping = in_flight.fetch_add(1, Ordering::SeqCst) > 0;
        let run = Self {
            status,
            in_flight,
            ticker: None,
            exit_progress: None,
        };
        (run, overlapping)
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        let exit_progress = self.exit_progress;
        self.status.send_modify(|s| {
            s.phase = GeneratorPhase::Idle;
            if let Some(progress) = exit_progress {
                s.progress = progress;
            }
        });
    }
}

/// Drives report generation for one form.
#[derive(Debug)]
pub struct ReportGenerator<C> {
    store: Arc<ReportStore<C>>,
    form: RwLock<GeneratorForm>,
    status: Arc<watch::Sender<GeneratorStatus>>,
    in_flight: AtomicUsize,
    tick_interval: Duration,
    reset_delay: Duration,
}

impl<C: ReportDataClient> ReportGenerator<C> {
    /// Creates a generator using the configured timings.
    pub fn new(store: Arc<ReportStore<C>>, config: &GeneratorConfig) -> Self {
        let (status, _) = watch::channel(GeneratorStatus::default());
        Self {
            store,
            form: RwLock::new(GeneratorForm::default()),
            status: Arc::new(status),
            in_flight: AtomicUsize::new(0),
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            reset_delay: Duration::from_millis(config.reset_delay_ms),
        }
    }

    /// The store reports are generated into.
    pub const fn store(&self) -> &Arc<ReportStore<C>> {
        &self.store
    }

    /// Current generator state.
    pub fn status(&self) -> GeneratorStatus {
        *self.status.borrow()
    }

    /// Watches the generator state.
    pub fn subscribe(&self) -> watch::Receiver<GeneratorStatus> {
        self.status.subscribe()
    }

    /// Whether a generation is outstanding.
    ///
    /// Advisory only: a second [`generate`](Self::generate) is not blocked.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Current form state.
    pub async fn form(&self) -> GeneratorForm {
        self.form.read().await.clone()
    }

    /// Selects the report type.
    pub async fn select_report_type(&self, report_type: ReportType) {
        self.form.write().await.report_type = report_type;
    }

    /// Replaces the filters.
    pub async fn set_filters(&self, filters: ReportFilters) {
        self.form.write().await.filters = filters;
    }

    /// Edits the filters in place.
    pub async fn update_filters(&self, edit: impl FnOnce(&mut ReportFilters)) {
        edit(&mut self.form.write().await.filters);
    }

    /// Generates the selected report with the current filters.
    pub async fn generate(&self) -> GenerateOutcome {
        let (report_type, filters) = {
            let form = self.form.read().await;
            (form.report_type, form.filters.clone())
        };
        self.run(report_type, filters).await
    }

    /// Selects `report_type` and `filters`, then generates.
    pub async fn generate_with(&self, report_type: ReportType, filters: ReportFilters) -> GenerateOutcome {
        {
            let mut form = self.form.write().await;
            form.report_type = report_type;
            form.filters = filters.clone();
        }
        self.run(report_type, filters).await
    }

    /// Selects `report_type` and `filters`, then previews them.
    ///
    /// The form is set and validated under one lock, so concurrent previews
    /// never see each other's filters.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Validation` when the filters are rejected; the
    /// handler is not called.
    pub async fn preview_with(
        &self,
        report_type: ReportType,
        filters: ReportFilters,
        handler: impl FnOnce(ReportType, ReportFilters),
    ) -> Result<(), ReportError> {
        let mut form = self.form.write().await;
        form.report_type = report_type;
        form.filters = filters;
        let selection = Self::check_form(&mut form);
        drop(form);

        let (report_type, filters) = selection?;
        handler(report_type, filters);
        Ok(())
    }

    /// Validates the form and hands the selection to `handler`.
    ///
    /// Neither the store nor the progress state is touched.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Validation` when the filters are rejected; the
    /// handler is not called.
    pub async fn preview(
        &self,
        handler: impl FnOnce(ReportType, ReportFilters),
    ) -> Result<(), ReportError> {
        let selection = Self::check_form(&mut *self.form.write().await);
        let (report_type, filters) = selection?;
        handler(report_type, filters);
        Ok(())
    }

    fn check_form(form: &mut GeneratorForm) -> Result<(ReportType, ReportFilters), ReportError> {
        form.errors = validate_filters_today(&form.filters);
        if !form.errors.is_empty() {
            debug!(errors = ?form.errors, "Preview rejected");
            return Err(ReportError::Validation(form.errors.clone()));
        }
        Ok((form.report_type, form.filters.clone()))
    }

    async fn run(&self, report_type: ReportType, filters: ReportFilters) -> GenerateOutcome {
        let (mut run, overlapping) = ActiveRun::start(&self.status, &self.in_flight);
        if overlapping {
            warn!(report_type = %report_type, "Generation already in progress; starting another");
        }

        self.status.send_modify(|s| {
            if s.phase == GeneratorPhase::Idle {
                s.phase = GeneratorPhase::Validating;
            }
        });
        let errors = validate_filters_today(&filters);
        self.form.write().await.errors.clone_from(&errors);

        if !errors.is_empty() {
            debug!(report_type = %report_type, errors = ?errors, "Generation rejected");
            return GenerateOutcome::Invalid { errors };
        }

        self.status.send_modify(|s| {
            s.phase = GeneratorPhase::Generating;
            s.progress = Progress::ZERO;
        });
        run.exit_progress = Some(Progress::ZERO);
        run.ticker = Some(tokio::spawn(tick(Arc::clone(&self.status), self.tick_interval)));

        let outcome = self.store.generate(report_type, &filters).await;

        run.exit_progress = Some(Progress::COMPLETE);
        drop(run);
        tokio::spawn(reset_after(Arc::clone(&self.status), self.reset_delay));

        info!(report_type = %report_type, committed = outcome.is_committed(), "Generation finished");
        outcome.into()
    }
}

async fn tick(status: Arc<watch::Sender<GeneratorStatus>>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        interval.tick().await;
        let step = rand::rng().random_range(MIN_STEP..=MAX_STEP);
        status.send_modify(|s| {
            if s.phase == GeneratorPhase::Generating {
                s.progress = s.progress.advance(step);
            }
        });
    }
}

/// Returns a finished bar to zero unless another generation took over.
async fn reset_after(status: Arc<watch::Sender<GeneratorStatus>>, delay: Duration) {
    tokio::time::sleep(delay).await;
    status.send_if_modified(|s| {
        if s.phase == GeneratorPhase::Idle && s.progress == Progress::COMPLETE {
            s.progress = Progress::ZERO;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::filters::{END_DATE_REQUIRED, START_DATE_REQUIRED};
    use crate::reports::mock::MockReportClient;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            tick_interval_ms: 2,
            reset_delay_ms: 30,
        }
    }

    fn generator(client: MockReportClient) -> ReportGenerator<MockReportClient> {
        ReportGenerator::new(Arc::new(ReportStore::new(client)), &config())
    }

    fn last_month() -> ReportFilters {
        let today = Utc::now().date_naive();
        ReportFilters::new()
            .with_property("p1")
            .with_range(today - chrono::Duration::days(30), today)
    }

    #[tokio::test]
    async fn test_invalid_filters_never_reach_store() {
        let generator = generator(MockReportClient::new());

        let outcome = generator.generate().await;

        assert_eq!(
            outcome,
            GenerateOutcome::Invalid {
                errors: vec![START_DATE_REQUIRED.to_string(), END_DATE_REQUIRED.to_string()]
            }
        );
        assert_eq!(outcome.primary_error(), Some(START_DATE_REQUIRED));
        assert_eq!(generator.store().client().calls(), 0);
        assert_eq!(generator.status(), GeneratorStatus::default());
        assert_eq!(generator.form().await.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_commits_and_completes_progress() {
        let generator = generator(MockReportClient::new());
        generator.select_report_type(ReportType::Occupancy).await;
        generator.set_filters(last_month()).await;

        let outcome = generator.generate().await;

        assert!(matches!(outcome, GenerateOutcome::Committed { .. }));
        assert_eq!(
            generator.status(),
            GeneratorStatus {
                phase: GeneratorPhase::Idle,
                progress: Progress::COMPLETE
            }
        );
        assert!(generator.store().occupancy_report().await.is_some());
        assert!(generator.form().await.errors.is_empty());
    }

    #[tokio::test]
    async fn test_progress_resets_after_delay() {
        let generator = generator(MockReportClient::new());
        let mut rx = generator.subscribe();

        generator
            .generate_with(ReportType::Financial, last_month())
            .await;

        let reset = tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.progress == Progress::ZERO && s.phase == GeneratorPhase::Idle),
        )
        .await;
        assert!(reset.is_ok());
    }

    #[tokio::test]
    async fn test_progress_capped_while_waiting() {
        let generator = Arc::new(generator(
            MockReportClient::new().with_latency(Duration::from_millis(150)),
        ));
        let mut rx = generator.subscribe();

        let task = {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move {
                generator
                    .generate_with(ReportType::Maintenance, last_month())
                    .await
            })
        };

        rx.wait_for(|s| s.phase == GeneratorPhase::Generating && s.progress > Progress::ZERO)
            .await
            .unwrap();
        assert!(generator.is_generating());
        assert!(generator.status().progress <= Progress::CAP);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, GenerateOutcome::Committed { .. }));
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn test_failed_generation_reports_store_error() {
        let generator = generator(MockReportClient::new().failing("backend down"));

        let outcome = generator
            .generate_with(ReportType::Financial, last_month())
            .await;

        assert_eq!(
            outcome.primary_error(),
            Some("Report service unavailable: backend down")
        );
        assert_eq!(
            generator.store().error().await.as_deref(),
            Some("Report service unavailable: backend down")
        );
        assert_eq!(generator.status().phase, GeneratorPhase::Idle);
    }

    #[tokio::test]
    async fn test_preview_calls_handler_without_store() {
        let generator = generator(MockReportClient::new());
        generator.select_report_type(ReportType::Maintenance).await;
        generator.set_filters(last_month()).await;

        let mut seen = None;
        generator
            .preview(|report_type, filters| seen = Some((report_type, filters)))
            .await
            .unwrap();

        let (report_type, filters) = seen.unwrap();
        assert_eq!(report_type, ReportType::Maintenance);
        assert_eq!(filters.property_id.as_deref(), Some("p1"));
        assert_eq!(generator.store().client().calls(), 0);
        assert_eq!(generator.status(), GeneratorStatus::default());
    }

    #[tokio::test]
    async fn test_preview_rejects_invalid_filters() {
        let generator = generator(MockReportClient::new());
        generator
            .update_filters(|f| f.start_date = NaiveDate::from_ymd_opt(2024, 1, 1))
            .await;

        let mut called = false;
        let err = generator.preview(|_, _| called = true).await.unwrap_err();

        assert!(!called);
        assert_eq!(err.to_string(), END_DATE_REQUIRED);
    }

    #[tokio::test]
    async fn test_dropped_generation_returns_to_idle() {
        let generator = Arc::new(generator(
            MockReportClient::new().with_latency(Duration::from_secs(30)),
        ));
        let mut rx = generator.subscribe();

        let task = {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move {
                generator
                    .generate_with(ReportType::Financial, last_month())
                    .await
            })
        };
        rx.wait_for(|s| s.phase == GeneratorPhase::Generating && s.progress > Progress::ZERO)
            .await
            .unwrap();

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let stopped = generator.status();
        assert_eq!(stopped.phase, GeneratorPhase::Idle);
        assert_eq!(stopped.progress, Progress::ZERO);
        assert!(!generator.is_generating());

        // The ticker is gone: nothing moves afterwards.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(generator.status(), stopped);
    }

    #[tokio::test]
    async fn test_overlapping_generations_idle_after_last() {
        let generator = Arc::new(generator(
            MockReportClient::new().with_latency(Duration::from_millis(150)),
        ));

        let spawn = |report_type| {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move { generator.generate_with(report_type, last_month()).await })
        };

        let first = spawn(ReportType::Financial);
        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = spawn(ReportType::Occupancy);

        assert!(first.await.unwrap().primary_error().is_none());
        assert_eq!(generator.status().phase, GeneratorPhase::Generating);
        assert!(generator.is_generating());

        assert!(matches!(second.await.unwrap(), GenerateOutcome::Committed { .. }));
        assert_eq!(
            generator.status(),
            GeneratorStatus {
                phase: GeneratorPhase::Idle,
                progress: Progress::COMPLETE
            }
        );
    }

    #[tokio::test]
    async fn test_preview_with_sets_form_and_validates() {
        let generator = generator(MockReportClient::new());

        let mut seen = None;
        generator
            .preview_with(ReportType::Occupancy, last_month(), |report_type, filters| {
                seen = Some((report_type, filters));
            })
            .await
            .unwrap();

        assert_eq!(seen, Some((ReportType::Occupancy, last_month())));
        assert_eq!(generator.form().await.report_type, ReportType::Occupancy);

        let err = generator
            .preview_with(ReportType::Financial, ReportFilters::new(), |_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), START_DATE_REQUIRED);
        assert_eq!(generator.form().await.errors.len(), 2);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::CAP.percent(), 90);
        assert_eq!(Progress(455).percent(), 45);
        assert_eq!(Progress::COMPLETE.tenths(), 1000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_advance_never_exceeds_cap(steps in proptest::collection::vec(MIN_STEP..=MAX_STEP, 0..100)) {
            let mut progress = Progress::ZERO;
            for step in steps {
                let next = progress.advance(step);
                prop_assert!(next >= progress);
                prop_assert!(next <= Progress::CAP);
                progress = next;
            }
        }
    }
}

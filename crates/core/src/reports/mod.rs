//! Report generation and filtering pipeline.
//!
//! - `filters` - Submission-time filter validation
//! - `store` - Cached payloads, history, schedules, loading/error flags
//! - `generator` - Form state, validation gate and simulated progress
//! - `viewer` - Rendering plus export, share and print actions
//! - `client` - The report data source contract
//! - `mock` - Deterministic sample data source

pub mod client;
pub mod error;
pub mod export;
pub mod filters;
pub mod generator;
pub mod history;
pub mod mock;
pub mod schedule;
pub mod store;
pub mod types;
pub mod viewer;


pub use client::ReportDataClient;
pub use error::ReportError;
pub use filters::{MAX_RANGE_DAYS, validate_filters, validate_filters_today};
pub use generator::{
    GenerateOutcome, GeneratorForm, GeneratorPhase, GeneratorStatus, Progress, ReportGenerator,
};
pub use history::{HistoryQuery, ReportHistory};
pub use mock::MockReportClient;
pub use schedule::{Frequency, NewScheduledReport, ScheduledReport, ScheduledReportPatch};
pub use store::{GenerationOutcome, ReportSnapshot, ReportStore};
pub use types::*;
pub use viewer::{
    ExportArtifact, ReportBreakdown, ReportView, ReportViewer, ShareAction, ShareMethod,
    ViewerListener, render,
};

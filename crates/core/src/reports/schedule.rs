//! Scheduled report definitions.
//!
//! Schedules are bookkeeping only: nothing in this crate executes them.
//! `next_run` is what a job runner would use.

use chrono::{DateTime, Duration, Months, Utc};
use rentdesk_shared::types::{PageRequest, PageResponse, ScheduledReportId};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::error::ReportError;
use super::types::ReportType;

/// How often a scheduled report is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every three calendar months.
    Quarterly,
}

impl Frequency {
    /// Returns the string representation of the frequency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    /// The first due time strictly after `from`.
    ///
    /// Month arithmetic clamps to the last day of shorter months.
    #[must_use]
    pub fn next_after(self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Daily => from + Duration::days(1),
            Self::Weekly => from + Duration::weeks(1),
            Self::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
            Self::Quarterly => from
                .checked_add_months(Months::new(3))
                .unwrap_or(from + Duration::days(91)),
        }
    }
}

/// A stored schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReport {
    /// Schedule ID.
    pub id: ScheduledReportId,
    /// Display name.
    pub name: String,
    /// Report to generate.
    pub report_type: ReportType,
    /// How often.
    pub frequency: Frequency,
    /// Recipient address.
    pub email: String,
    /// Restrict to one property.
    #[serde(default)]
    pub property_id: Option<String>,
    /// Whether the schedule is due at all.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last execution, if one was ever recorded.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Next due time; `None` while inactive.
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

/// Input for a new schedule, as submitted by the schedule form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduledReport {
    /// Display name.
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank", message = "Name is required")
    )]
    pub name: String,
    /// Report to generate.
    pub report_type: ReportType,
    /// How often.
    pub frequency: Frequency,
    /// Recipient address.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Restrict to one property.
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Property ID must be 1-64 characters"))]
    pub property_id: Option<String>,
    /// Whether the schedule starts active.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update of a schedule; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReportPatch {
    /// New name.
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "not_blank", message = "Name is required")
    )]
    pub name: Option<String>,
    /// New report type.
    #[serde(default)]
    pub report_type: Option<ReportType>,
    /// New frequency.
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// New recipient.
    #[serde(default)]
    #[validate(email(message = "A valid email address is required"))]
    pub email: Option<String>,
    /// New property restriction. `Some(None)` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub property_id: Option<Option<String>>,
    /// Activate or pause.
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Flattens validator output into display messages, ordered by field name.
#[must_use]
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect()
}

fn check<T: Validate>(input: &T) -> Result<(), ReportError> {
    input.validate().map_err(|errors| {
        let message = validation_messages(&errors)
            .into_iter()
            .next()
            .unwrap_or_else(|| "Invalid scheduled report".to_string());
        ReportError::InvalidSchedule(message)
    })
}

/// In-memory list of schedules, in creation order.
#[derive(Debug, Clone, Default)]
pub struct ScheduleBook {
    schedules: Vec<ScheduledReport>,
}

impl ScheduleBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All schedules.
    #[must_use]
    pub fn list(&self) -> &[ScheduledReport] {
        &self.schedules
    }

    /// One page of schedules.
    #[must_use]
    pub fn page(&self, request: PageRequest) -> PageResponse<ScheduledReport> {
        PageResponse::from_slice(&self.schedules, request)
    }

    /// Validates and stores a new schedule with a fresh ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidSchedule` if the input fails validation.
    pub fn create(
        &mut self,
        input: NewScheduledReport,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReport, ReportError> {
        check(&input)?;

        let schedule = ScheduledReport {
            id: ScheduledReportId::new(),
            name: input.name.trim().to_string(),
            report_type: input.report_type,
            frequency: input.frequency,
            email: input.email.trim().to_string(),
            property_id: input.property_id,
            is_active: input.is_active,
            created_at: now,
            last_run: None,
            next_run: input.is_active.then(|| input.frequency.next_after(now)),
        };

        self.schedules.push(schedule.clone());
        Ok(schedule)
    }

    /// Applies a patch to one schedule, leaving every other schedule untouched.
    ///
    /// Activating recomputes `next_run`; deactivating clears it; changing the
    /// frequency of an active schedule reschedules it.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidSchedule` for invalid input and
    /// `ReportError::ScheduleNotFound` for an unknown ID.
    pub fn update(
        &mut self,
        id: ScheduledReportId,
        patch: ScheduledReportPatch,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReport, ReportError> {
        check(&patch)?;

        let schedule = self
            .schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ReportError::ScheduleNotFound(id))?;

        let was_active = schedule.is_active;
        let old_frequency = schedule.frequency;

        if let Some(name) = patch.name {
            schedule.name = name.trim().to_string();
        }
        if let Some(report_type) = patch.report_type {
            schedule.report_type = report_type;
        }
        if let Some(frequency) = patch.frequency {
            schedule.frequency = frequency;
        }
        if let Some(email) = patch.email {
            schedule.email = email.trim().to_string();
        }
        if let Some(property_id) = patch.property_id {
            schedule.property_id = property_id;
        }
        if let Some(is_active) = patch.is_active {
            schedule.is_active = is_active;
        }

        if !schedule.is_active {
            schedule.next_run = None;
        } else if !was_active || schedule.frequency != old_frequency {
            schedule.next_run = Some(schedule.frequency.next_after(now));
        }

        Ok(schedule.clone())
    }

    /// Removes a schedule.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ScheduleNotFound` for an unknown ID.
    pub fn delete(&mut self, id: ScheduledReportId) -> Result<ScheduledReport, ReportError> {
        let index = self
            .schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or(ReportError::ScheduleNotFound(id))?;
        Ok(self.schedules.remove(index))
    }

    /// Number of schedules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

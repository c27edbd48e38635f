//! Bounded, newest-first history of generated reports.

use std::collections::VecDeque;

use rentdesk_shared::types::{PageRequest, PageResponse};

use super::types::{ReportHistoryEntry, ReportType};

/// Default number of reports kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Newest-first history; pushing beyond capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct ReportHistory {
    entries: VecDeque<ReportHistoryEntry>,
    capacity: usize,
}

impl ReportHistory {
    /// Creates an empty history holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records an entry at the front, evicting from the back when full.
    pub fn push(&mut self, entry: ReportHistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ReportHistoryEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries matching `query`, newest first, one page at a time.
    #[must_use]
    pub fn query(&self, query: &HistoryQuery) -> PageResponse<ReportHistoryEntry> {
        let matching: Vec<ReportHistoryEntry> = self
            .entries
            .iter()
            .filter(|entry| query.report_type.is_none_or(|t| entry.report_type == t))
            .cloned()
            .collect();

        PageResponse::from_slice(&matching, query.page)
    }
}

impl Default for ReportHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

/// History listing parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
    /// Only entries of this type.
    pub report_type: Option<ReportType>,
    /// Page to return.
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::mock::sample_payload;
    use crate::reports::types::ReportFilters;
    use chrono::Utc;
    use proptest::prelude::*;
    use rentdesk_shared::types::ReportHistoryId;

    fn entry(report_type: ReportType) -> ReportHistoryEntry {
        let filters = ReportFilters::new();
        ReportHistoryEntry {
            id: ReportHistoryId::new(),
            report_type,
            data: sample_payload(report_type, &filters),
            filters,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_push_keeps_newest_first() {
        let mut history = ReportHistory::default();
        let first = entry(ReportType::Financial);
        let second = entry(ReportType::Occupancy);
        history.push(first.clone());
        history.push(second.clone());

        let ids: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_eleventh_entry_evicts_oldest() {
        let mut history = ReportHistory::default();
        let oldest = entry(ReportType::Financial);
        history.push(oldest.clone());
        for _ in 0..10 {
            history.push(entry(ReportType::Maintenance));
        }

        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert!(history.iter().all(|e| e.id != oldest.id));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut history = ReportHistory::with_capacity(0);
        history.push(entry(ReportType::Financial));
        history.push(entry(ReportType::Financial));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_query_filters_by_type() {
        let mut history = ReportHistory::default();
        history.push(entry(ReportType::Financial));
        history.push(entry(ReportType::Occupancy));
        history.push(entry(ReportType::Financial));

        let page = history.query(&HistoryQuery {
            report_type: Some(ReportType::Financial),
            page: PageRequest::default(),
        });

        assert_eq!(page.meta.total, 2);
        assert!(page.data.iter().all(|e| e.report_type == ReportType::Financial));
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_capacity(capacity in 1usize..20, pushes in 0usize..50) {
            let mut history = ReportHistory::with_capacity(capacity);
            for _ in 0..pushes {
                history.push(entry(ReportType::Occupancy));
            }
            prop_assert_eq!(history.len(), pushes.min(capacity));
        }
    }
}

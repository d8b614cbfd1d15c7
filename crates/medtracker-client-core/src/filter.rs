//! Client-side list refinement. Everything here is pure: the same collection,
//! search term and status filter always give the same slice, in order.

use crate::entity::{EntityRecord, EntityStatus};

pub const ALL_STATUSES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter<S> {
    All,
    Only(S),
    /// A value outside the closed set. Matches nothing.
    Unrecognized(String),
}

impl<S: EntityStatus> StatusFilter<S> {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_STATUSES) {
            return Self::All;
        }
        S::parse(trimmed).map_or_else(|| Self::Unrecognized(trimmed.to_string()), Self::Only)
    }

    pub fn matches(&self, status: S) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
            Self::Unrecognized(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_STATUSES,
            Self::Only(status) => status.as_str(),
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl<S> Default for StatusFilter<S> {
    fn default() -> Self {
        Self::All
    }
}

/// Per-page search box and status dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState<S> {
    pub search_term: String,
    pub status: StatusFilter<S>,
}

impl<S> Default for FilterState<S> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status: StatusFilter::All,
        }
    }
}

impl<S: EntityStatus> FilterState<S> {
    pub fn new(search_term: impl Into<String>, status: &str) -> Self {
        Self {
            search_term: search_term.into(),
            status: StatusFilter::parse(status),
        }
    }

    pub fn matches<T>(&self, record: &T) -> bool
    where
        T: EntityRecord<Status = S>,
    {
        self.status.matches(record.status()) && matches_search(record, &self.search_term)
    }
}

fn matches_search<T: EntityRecord>(record: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    record
        .searchable()
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_records<'a, T: EntityRecord>(
    records: &'a [T],
    filter: &FilterState<T::Status>,
) -> Vec<&'a T> {
    records.iter().filter(|record| filter.matches(*record)).collect()
}

/// Count per status, in the closed set's declaration order. Zero counts are kept.
pub fn status_summary<T: EntityRecord>(records: &[T]) -> Vec<(T::Status, usize)> {
    <T::Status as EntityStatus>::ALL
        .iter()
        .map(|status| {
            let count = records
                .iter()
                .filter(|record| record.status() == *status)
                .count();
            (*status, count)
        })
        .collect()
}

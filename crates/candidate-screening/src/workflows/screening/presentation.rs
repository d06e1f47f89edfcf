use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::CandidateStatus;
use super::resolution::ResolvedCandidate;

/// Status filter applied to the candidate list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CandidateStatus),
}

impl StatusFilter {
    pub fn admits(&self, status: CandidateStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status filter '{0}'")]
pub struct StatusFilterError(pub String);

impl FromStr for StatusFilter {
    type Err = StatusFilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed.eq_ignore_ascii_case("tutti")
        {
            return Ok(StatusFilter::All);
        }

        CandidateStatus::from_label(trimmed)
            .map(StatusFilter::Only)
            .ok_or_else(|| StatusFilterError(trimmed.to_string()))
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

/// One counter per status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "idoneo")]
    pub suitable: usize,
    #[serde(rename = "dubbio")]
    pub doubtful: usize,
    #[serde(rename = "da_valutare")]
    pub pending_review: usize,
    #[serde(rename = "contattato")]
    pub contacted: usize,
    #[serde(rename = "non_idoneo")]
    pub unsuitable: usize,
}

impl StatusCounts {
    fn record(&mut self, status: CandidateStatus) {
        let bucket = match status {
            CandidateStatus::Suitable => &mut self.suitable,
            CandidateStatus::Doubtful => &mut self.doubtful,
            CandidateStatus::PendingReview => &mut self.pending_review,
            CandidateStatus::Contacted => &mut self.contacted,
            CandidateStatus::Unsuitable => &mut self.unsuitable,
        };
        *bucket += 1;
    }

    pub fn get(&self, status: CandidateStatus) -> usize {
        match status {
            CandidateStatus::Suitable => self.suitable,
            CandidateStatus::Doubtful => self.doubtful,
            CandidateStatus::PendingReview => self.pending_review,
            CandidateStatus::Contacted => self.contacted,
            CandidateStatus::Unsuitable => self.unsuitable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateStats {
    pub total: usize,
    pub by_status: StatusCounts,
    /// Candidates with at least one delivered message.
    pub contacted: usize,
    pub last_sync: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationSnapshot {
    pub candidates: Vec<ResolvedCandidate>,
    pub stats: CandidateStats,
}

fn matches_search(view: &ResolvedCandidate, needle: &str) -> bool {
    [
        &view.candidate.name,
        &view.candidate.email,
        &view.candidate.city,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Builds the list and counters shown on the dashboard.
///
/// Counters cover the full batch before filtering. The list is filtered by
/// status and search term, then stably sorted by status rank.
pub fn present(
    views: Vec<ResolvedCandidate>,
    filter: &StatusFilter,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> PresentationSnapshot {
    let mut by_status = StatusCounts::default();
    let mut contacted = 0;
    for view in &views {
        by_status.record(view.status);
        if view.email_sent {
            contacted += 1;
        }
    }

    let stats = CandidateStats {
        total: views.len(),
        by_status,
        contacted,
        last_sync: now,
    };

    let needle = search
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty());

    let mut candidates: Vec<ResolvedCandidate> = views
        .into_iter()
        .filter(|view| filter.admits(view.status))
        .filter(|view| {
            needle
                .as_deref()
                .map_or(true, |needle| matches_search(view, needle))
        })
        .collect();

    candidates.sort_by_key(|view| view.status.sort_rank());

    PresentationSnapshot { candidates, stats }
}

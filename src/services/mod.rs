// Back-office services backed by in-memory stores seeded from bundled JSON.
//
// Every call can be delayed by the configured latency so callers exercise
// the same async paths a networked backend would need.

pub mod errors;
pub mod inspectors;
pub mod logs;
pub mod seed;
pub mod submission;
pub mod users;
pub mod visits;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::config::ServicesConfig;
use crate::wizard::FormData;

pub use errors::ServiceError;
pub use inspectors::{InMemoryInspectorService, Inspector, InspectorQuery, InspectorService, InspectorUpdate};
pub use logs::{InMemoryLogService, LogEntry, LogErrorType, LogQuery, LogService, LogSeverity, LogStats, LogType, LogUser, NewLogEntry};
pub use seed::InspectionRecord;
pub use submission::MockSubmissionService;
pub use users::{InMemoryUserService, NewUser, User, UserQuery, UserRole, UserService, UserUpdate};
pub use visits::{FilterOptions, InMemoryVisitService, NewVisit, Visit, VisitQuery, VisitService, VisitUpdate};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a filtered listing. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slice an already filtered and sorted listing. Pages past the end come back
/// empty with the real totals.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let data = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        data,
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }
}

/// Simulated round-trip delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency(Duration);

impl Latency {
    pub const NONE: Latency = Latency(Duration::ZERO);

    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn from_config(config: &ServicesConfig) -> Self {
        if config.simulate_latency {
            Self::from_millis(config.latency_ms)
        } else {
            Self::NONE
        }
    }

    pub async fn pause(self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Inclusive `[from, to]` day range; `to` covers the whole day.
pub(crate) fn within_days(at: NaiveDateTime, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if let Some(from) = from {
        if at < from.and_time(NaiveTime::MIN) {
            return false;
        }
    }
    match to {
        Some(to) => at.date() <= to,
        None => true,
    }
}

pub(crate) fn contains_folded(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Receipt for an accepted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub visit_id: String,
    pub log_id: String,
}

/// Where a completed inspection report goes once the wizard submits it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReportSubmitter: Send + Sync {
    async fn submit(&self, report: &FormData) -> Result<SubmissionReceipt, ServiceError>;
}

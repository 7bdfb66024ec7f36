use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::seed;
use super::{contains_folded, paginate, within_days, Latency, Page, ServiceError, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogType {
    UserCreated,
    FormSubmitted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogErrorType {
    Validation,
    Network,
    Server,
    Unknown,
}

impl std::str::FromStr for LogType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UserCreated" => Ok(Self::UserCreated),
            "FormSubmitted" => Ok(Self::FormSubmitted),
            "Error" => Ok(Self::Error),
            other => Err(ServiceError::invalid("type", format!("unknown log type '{other}'"))),
        }
    }
}

impl std::str::FromStr for LogErrorType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Validation" => Ok(Self::Validation),
            "Network" => Ok(Self::Network),
            "Server" => Ok(Self::Server),
            "Unknown" => Ok(Self::Unknown),
            other => Err(ServiceError::invalid("errorType", format!("unknown error type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogType,
    pub severity: LogSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<LogErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<LogUser>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    fn matches(&self, query: &LogQuery, needle: Option<&str>) -> bool {
        if query.kind.is_some_and(|k| k != self.kind) {
            return false;
        }
        if query.error_type.is_some() && query.error_type != self.error_type {
            return false;
        }
        if !within_days(self.timestamp.naive_utc(), query.from, query.to) {
            return false;
        }
        match needle {
            Some(lower) => {
                contains_folded(&self.message, lower)
                    || self.user.as_ref().is_some_and(|u| {
                        contains_folded(&u.name, lower) || contains_folded(&u.email, lower)
                    })
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub kind: Option<LogType>,
    pub error_type: Option<LogErrorType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            kind: None,
            error_type: None,
            from: None,
            to: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub kind: LogType,
    pub severity: LogSeverity,
    pub message: String,
    pub error_type: Option<LogErrorType>,
    pub user: Option<LogUser>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: usize,
    pub by_type: BTreeMap<LogType, usize>,
    pub by_severity: BTreeMap<LogSeverity, usize>,
    pub by_error_type: BTreeMap<LogErrorType, usize>,
}

impl LogStats {
    fn tally(entries: &[LogEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            by_type: [LogType::UserCreated, LogType::FormSubmitted, LogType::Error]
                .into_iter()
                .map(|k| (k, 0))
                .collect(),
            by_severity: [LogSeverity::Info, LogSeverity::Warning, LogSeverity::Error]
                .into_iter()
                .map(|s| (s, 0))
                .collect(),
            by_error_type: [
                LogErrorType::Validation,
                LogErrorType::Network,
                LogErrorType::Server,
                LogErrorType::Unknown,
            ]
            .into_iter()
            .map(|e| (e, 0))
            .collect(),
        };
        for entry in entries {
            *stats.by_type.entry(entry.kind).or_default() += 1;
            *stats.by_severity.entry(entry.severity).or_default() += 1;
            if let Some(error_type) = entry.error_type {
                *stats.by_error_type.entry(error_type).or_default() += 1;
            }
        }
        stats
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LogService: Send + Sync {
    async fn list(&self, query: LogQuery) -> Result<Page<LogEntry>, ServiceError>;
    async fn get(&self, id: &str) -> Result<LogEntry, ServiceError>;
    async fn add(&self, entry: NewLogEntry) -> Result<LogEntry, ServiceError>;
    async fn stats(&self) -> Result<LogStats, ServiceError>;
}

pub struct InMemoryLogService {
    entries: RwLock<Vec<LogEntry>>,
    latency: Latency,
}

impl InMemoryLogService {
    pub fn new(entries: Vec<LogEntry>, latency: Latency) -> Self {
        Self {
            entries: RwLock::new(entries),
            latency,
        }
    }

    pub fn seeded(latency: Latency) -> Result<Self, ServiceError> {
        Ok(Self::new(seed::logs()?, latency))
    }
}

#[async_trait]
impl LogService for InMemoryLogService {
    async fn list(&self, query: LogQuery) -> Result<Page<LogEntry>, ServiceError> {
        self.latency.pause().await;
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut matched: Vec<LogEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.matches(&query, needle.as_deref()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(matched = matched.len(), "Listed log entries");
        Ok(paginate(matched, query.page, query.page_size))
    }

    async fn get(&self, id: &str) -> Result<LogEntry, ServiceError> {
        self.latency.pause().await;
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("log entry", id))
    }

    async fn add(&self, entry: NewLogEntry) -> Result<LogEntry, ServiceError> {
        self.latency.pause().await;
        let mut entries = self.entries.write().await;
        let stored = LogEntry {
            id: (entries.len() + 1).to_string(),
            timestamp: Utc::now(),
            kind: entry.kind,
            severity: entry.severity,
            error_type: entry.error_type,
            user: entry.user,
            message: entry.message,
            details: entry.details,
        };
        entries.insert(0, stored.clone());
        debug!(log_id = %stored.id, kind = ?stored.kind, "Log entry added");
        Ok(stored)
    }

    async fn stats(&self) -> Result<LogStats, ServiceError> {
        self.latency.pause().await;
        Ok(LogStats::tally(&self.entries.read().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryLogService {
        InMemoryLogService::seeded(Latency::NONE).unwrap()
    }

    #[tokio::test]
    async fn filters_by_type_and_error_type() {
        let svc = service();
        let errors = LogQuery {
            kind: Some(LogType::Error),
            ..Default::default()
        };
        assert_eq!(svc.list(errors).await.unwrap().total, 5);

        let validation = LogQuery {
            error_type: Some(LogErrorType::Validation),
            ..Default::default()
        };
        let page = svc.list(validation).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].id, "9");
    }

    #[tokio::test]
    async fn search_covers_user_email() {
        let query = LogQuery {
            search: Some("OTAIBI".into()),
            ..Default::default()
        };
        assert_eq!(service().list(query).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 16);
        let query = LogQuery {
            from: day,
            to: day,
            ..Default::default()
        };
        assert_eq!(service().list(query).await.unwrap().total, 4);
    }

    #[tokio::test]
    async fn added_entries_are_counted_and_listed_first() {
        let svc = service();
        let entry = svc
            .add(NewLogEntry {
                kind: LogType::FormSubmitted,
                severity: LogSeverity::Info,
                message: "تم تقديم نموذج تفتيش".into(),
                error_type: None,
                user: None,
                details: None,
            })
            .await
            .unwrap();
        assert_eq!(entry.id, "11");

        let page = svc.list(LogQuery::default()).await.unwrap();
        assert_eq!(page.data[0].id, "11");

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total, 11);
        assert_eq!(stats.by_type[&LogType::FormSubmitted], 4);
        assert_eq!(stats.by_severity[&LogSeverity::Warning], 3);
        assert_eq!(stats.by_error_type[&LogErrorType::Unknown], 1);
    }
}

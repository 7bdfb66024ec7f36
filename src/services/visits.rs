use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::seed::{self, InspectionRecord};
use super::{contains_folded, paginate, within_days, Latency, Page, ServiceError, DEFAULT_PAGE_SIZE};

const DEFAULT_BRANCH: &str = "الفرع الرئيسي";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub date_time: NaiveDateTime,
    pub establishment_name: String,
    pub establishment_code: String,
    pub branch: String,
    pub region: String,
    pub city: String,
    pub sector: String,
    pub visit_type: String,
    pub compliance_status: String,
    pub violations_count: u32,
    pub samples_count: u32,
    pub fines_total: f64,
    pub is_archived: bool,
    pub can_edit: bool,
    pub inspector_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_id: Option<String>,
}

impl Visit {
    fn from_inspection(index: usize, record: &InspectionRecord) -> Self {
        Self {
            id: visit_id(index + 1),
            date_time: record.visit_date_time,
            establishment_name: record.facility_name.clone(),
            establishment_code: record.facility_code.clone(),
            branch: record
                .branch
                .clone()
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            region: record.region.clone(),
            city: record.city.clone(),
            sector: record.facility_type.clone(),
            visit_type: record.activity_type.clone(),
            compliance_status: record.compliance_status.clone(),
            violations_count: u32::from(record.violation_type.is_some()),
            samples_count: record.total_samples,
            fines_total: record.total_fine,
            is_archived: false,
            can_edit: true,
            inspector_name: record.main_inspector_name.clone(),
            inspector_id: record.main_inspector_id.clone(),
        }
    }

    fn matches(&self, query: &VisitQuery, current_inspector: &str) -> bool {
        if self.is_archived != query.archived {
            return false;
        }
        if let Some(needle) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = [
                &self.establishment_name,
                &self.establishment_code,
                &self.branch,
                &self.id,
            ]
            .iter()
            .any(|field| contains_folded(field, &needle));
            if !hit {
                return false;
            }
        }
        if !within_days(self.date_time, query.from, query.to) {
            return false;
        }
        let exact = [
            (&query.region, &self.region),
            (&query.city, &self.city),
            (&query.sector, &self.sector),
            (&query.compliance, &self.compliance_status),
            (&query.visit_type, &self.visit_type),
        ];
        if exact
            .iter()
            .any(|(wanted, actual)| wanted.as_ref().is_some_and(|w| w != *actual))
        {
            return false;
        }
        !query.assigned_to_me || self.inspector_name == current_inspector
    }
}

const VISIT_PREFIX: &str = "VISIT-";

fn visit_id(n: usize) -> String {
    format!("{VISIT_PREFIX}{n:04}")
}

/// One past the highest numbered id, so ids stay unique after a discard.
fn next_visit_number(visits: &[Visit]) -> usize {
    visits
        .iter()
        .filter_map(|v| v.id.strip_prefix(VISIT_PREFIX)?.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitQuery {
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub sector: Option<String>,
    pub compliance: Option<String>,
    pub visit_type: Option<String>,
    pub archived: bool,
    /// Only visits led by the configured current inspector.
    pub assigned_to_me: bool,
    pub page: usize,
    pub page_size: usize,
}

impl Default for VisitQuery {
    fn default() -> Self {
        Self {
            search: None,
            from: None,
            to: None,
            region: None,
            city: None,
            sector: None,
            compliance: None,
            visit_type: None,
            archived: false,
            assigned_to_me: false,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitUpdate {
    pub establishment_name: Option<String>,
    pub branch: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub sector: Option<String>,
    pub visit_type: Option<String>,
    pub compliance_status: Option<String>,
    pub violations_count: Option<u32>,
    pub samples_count: Option<u32>,
    pub fines_total: Option<f64>,
    pub inspector_name: Option<String>,
}

impl VisitUpdate {
    fn apply(self, visit: &mut Visit) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field { visit.$field = value; })*
            };
        }
        merge!(
            establishment_name,
            branch,
            region,
            city,
            sector,
            visit_type,
            compliance_status,
            violations_count,
            samples_count,
            fines_total,
            inspector_name
        );
    }
}

/// A visit produced by a submitted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub date_time: NaiveDateTime,
    pub establishment_name: String,
    pub establishment_code: String,
    pub branch: Option<String>,
    pub region: String,
    pub city: String,
    pub sector: String,
    pub visit_type: String,
    pub compliance_status: String,
    pub violations_count: u32,
    pub samples_count: u32,
    pub fines_total: f64,
    pub inspector_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub cities: Vec<String>,
    pub sectors: Vec<String>,
    pub visit_types: Vec<String>,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VisitService: Send + Sync {
    async fn list(&self, query: VisitQuery) -> Result<Page<Visit>, ServiceError>;
    async fn get(&self, id: &str) -> Result<Visit, ServiceError>;
    async fn update(&self, id: &str, update: VisitUpdate) -> Result<Visit, ServiceError>;
    async fn archive(&self, id: &str) -> Result<Visit, ServiceError>;
    async fn unarchive(&self, id: &str) -> Result<Visit, ServiceError>;
    async fn filter_options(&self) -> Result<FilterOptions, ServiceError>;
    async fn record(&self, visit: NewVisit) -> Result<Visit, ServiceError>;
    /// Drop a visit that was recorded but whose submission did not complete.
    async fn discard(&self, id: &str) -> Result<(), ServiceError>;
}

pub struct InMemoryVisitService {
    visits: RwLock<Vec<Visit>>,
    latency: Latency,
    current_inspector: String,
}

impl InMemoryVisitService {
    pub fn new(visits: Vec<Visit>, latency: Latency, current_inspector: impl Into<String>) -> Self {
        Self {
            visits: RwLock::new(visits),
            latency,
            current_inspector: current_inspector.into(),
        }
    }

    /// Visits derived from the bundled inspection records.
    pub fn seeded(latency: Latency, current_inspector: impl Into<String>) -> Result<Self, ServiceError> {
        let visits = seed::inspections()?
            .iter()
            .enumerate()
            .map(|(i, record)| Visit::from_inspection(i, record))
            .collect();
        Ok(Self::new(visits, latency, current_inspector))
    }

    async fn modify<F>(&self, id: &str, change: F) -> Result<Visit, ServiceError>
    where
        F: FnOnce(&mut Visit) + Send,
    {
        let mut visits = self.visits.write().await;
        let visit = visits
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| ServiceError::not_found("visit", id))?;
        change(visit);
        Ok(visit.clone())
    }
}

#[async_trait]
impl VisitService for InMemoryVisitService {
    async fn list(&self, query: VisitQuery) -> Result<Page<Visit>, ServiceError> {
        self.latency.pause().await;
        let visits = self.visits.read().await;
        let mut matched: Vec<Visit> = visits
            .iter()
            .filter(|v| v.matches(&query, &self.current_inspector))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date_time.cmp(&a.date_time));
        debug!(matched = matched.len(), page = query.page, "Listed visits");
        Ok(paginate(matched, query.page, query.page_size))
    }

    async fn get(&self, id: &str) -> Result<Visit, ServiceError> {
        self.latency.pause().await;
        self.visits
            .read()
            .await
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("visit", id))
    }

    async fn update(&self, id: &str, update: VisitUpdate) -> Result<Visit, ServiceError> {
        self.latency.pause().await;
        let visit = self.modify(id, |v| update.apply(v)).await?;
        info!(visit_id = %id, "Visit updated");
        Ok(visit)
    }

    async fn archive(&self, id: &str) -> Result<Visit, ServiceError> {
        self.latency.pause().await;
        let visit = self.modify(id, |v| v.is_archived = true).await?;
        info!(visit_id = %id, "Visit archived");
        Ok(visit)
    }

    async fn unarchive(&self, id: &str) -> Result<Visit, ServiceError> {
        self.latency.pause().await;
        let visit = self.modify(id, |v| v.is_archived = false).await?;
        info!(visit_id = %id, "Visit restored from archive");
        Ok(visit)
    }

    async fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        self.latency.pause().await;
        let visits = self.visits.read().await;
        let unique = |pick: fn(&Visit) -> &String| -> Vec<String> {
            visits
                .iter()
                .map(|v| pick(v).clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        Ok(FilterOptions {
            regions: unique(|v| &v.region),
            cities: unique(|v| &v.city),
            sectors: unique(|v| &v.sector),
            visit_types: unique(|v| &v.visit_type),
        })
    }

    async fn record(&self, visit: NewVisit) -> Result<Visit, ServiceError> {
        self.latency.pause().await;
        let mut visits = self.visits.write().await;
        let stored = Visit {
            id: visit_id(next_visit_number(&visits)),
            date_time: visit.date_time,
            establishment_name: visit.establishment_name,
            establishment_code: visit.establishment_code,
            branch: visit
                .branch
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            region: visit.region,
            city: visit.city,
            sector: visit.sector,
            visit_type: visit.visit_type,
            compliance_status: visit.compliance_status,
            violations_count: visit.violations_count,
            samples_count: visit.samples_count,
            fines_total: visit.fines_total,
            is_archived: false,
            can_edit: true,
            inspector_name: visit.inspector_name,
            inspector_id: None,
        };
        visits.push(stored.clone());
        info!(visit_id = %stored.id, code = %stored.establishment_code, "Visit recorded");
        Ok(stored)
    }

    async fn discard(&self, id: &str) -> Result<(), ServiceError> {
        self.latency.pause().await;
        let mut visits = self.visits.write().await;
        let index = visits
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| ServiceError::not_found("visit", id))?;
        visits.remove(index);
        info!(visit_id = %id, "Visit discarded");
        Ok(())
    }
}

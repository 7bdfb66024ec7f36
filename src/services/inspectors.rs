use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use super::seed;
use super::{contains_folded, paginate, Latency, Page, ServiceError, DEFAULT_PAGE_SIZE};

pub const STATUS_ACTIVE: &str = "نشط";
pub const STATUS_INACTIVE: &str = "غير نشط";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspector {
    pub id: String,
    pub name: String,
    pub employee_id: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    pub department: String,
    pub region: String,
    pub city: String,
    pub specialization: String,
    pub qualifications: String,
    pub total_inspections: u32,
    pub total_violations: u32,
    pub total_fines: f64,
    pub compliance_rate: f64,
    pub last_inspection_date: String,
    pub join_date: String,
    pub is_active: bool,
    pub status: String,
}

impl Inspector {
    fn matches(&self, query: &InspectorQuery) -> bool {
        if let Some(needle) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let lower = needle.to_lowercase();
            let hit = contains_folded(&self.name, &lower)
                || contains_folded(&self.employee_id, &lower)
                || contains_folded(&self.email, &lower)
                || self.phone.contains(needle)
                || contains_folded(&self.id, &lower);
            if !hit {
                return false;
            }
        }
        query.region.as_ref().map_or(true, |r| *r == self.region)
            && query
                .specialization
                .as_ref()
                .map_or(true, |s| *s == self.specialization)
            && query.active.map_or(true, |active| active == self.is_active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorQuery {
    pub search: Option<String>,
    pub region: Option<String>,
    pub specialization: Option<String>,
    pub active: Option<bool>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for InspectorQuery {
    fn default() -> Self {
        Self {
            search: None,
            region: None,
            specialization: None,
            active: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InspectorService: Send + Sync {
    async fn list(&self, query: InspectorQuery) -> Result<Page<Inspector>, ServiceError>;
    async fn get(&self, id: &str) -> Result<Inspector, ServiceError>;
    async fn update(&self, id: &str, update: InspectorUpdate) -> Result<Inspector, ServiceError>;
    /// Flip the active flag; the status text follows it.
    async fn toggle_active(&self, id: &str) -> Result<Inspector, ServiceError>;
}

pub struct InMemoryInspectorService {
    inspectors: RwLock<Vec<Inspector>>,
    latency: Latency,
}

impl InMemoryInspectorService {
    pub fn new(inspectors: Vec<Inspector>, latency: Latency) -> Self {
        Self {
            inspectors: RwLock::new(inspectors),
            latency,
        }
    }

    pub fn seeded(latency: Latency) -> Result<Self, ServiceError> {
        Ok(Self::new(seed::inspectors()?, latency))
    }
}

#[async_trait]
impl InspectorService for InMemoryInspectorService {
    async fn list(&self, query: InspectorQuery) -> Result<Page<Inspector>, ServiceError> {
        self.latency.pause().await;
        let matched = self
            .inspectors
            .read()
            .await
            .iter()
            .filter(|i| i.matches(&query))
            .cloned()
            .collect();
        Ok(paginate(matched, query.page, query.page_size))
    }

    async fn get(&self, id: &str) -> Result<Inspector, ServiceError> {
        self.latency.pause().await;
        self.inspectors
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("inspector", id))
    }

    async fn update(&self, id: &str, update: InspectorUpdate) -> Result<Inspector, ServiceError> {
        self.latency.pause().await;
        let mut inspectors = self.inspectors.write().await;
        let inspector = inspectors
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| ServiceError::not_found("inspector", id))?;

        let InspectorUpdate {
            name,
            email,
            phone,
            title,
            department,
            region,
            city,
            specialization,
            qualifications,
        } = update;
        for (slot, value) in [
            (&mut inspector.name, name),
            (&mut inspector.email, email),
            (&mut inspector.phone, phone),
            (&mut inspector.title, title),
            (&mut inspector.department, department),
            (&mut inspector.region, region),
            (&mut inspector.city, city),
            (&mut inspector.specialization, specialization),
            (&mut inspector.qualifications, qualifications),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }

        info!(inspector_id = %id, "Inspector updated");
        Ok(inspector.clone())
    }

    async fn toggle_active(&self, id: &str) -> Result<Inspector, ServiceError> {
        self.latency.pause().await;
        let mut inspectors = self.inspectors.write().await;
        let inspector = inspectors
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| ServiceError::not_found("inspector", id))?;
        inspector.is_active = !inspector.is_active;
        inspector.status = if inspector.is_active {
            STATUS_ACTIVE
        } else {
            STATUS_INACTIVE
        }
        .to_string();
        info!(inspector_id = %id, active = inspector.is_active, "Inspector status toggled");
        Ok(inspector.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryInspectorService {
        InMemoryInspectorService::seeded(Latency::NONE).unwrap()
    }

    #[tokio::test]
    async fn filters_by_region_and_specialization() {
        let query = InspectorQuery {
            region: Some("الرياض".into()),
            specialization: Some("تفتيش فني".into()),
            ..Default::default()
        };
        let page = service().list(query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id, "INS005");
    }

    #[tokio::test]
    async fn phone_search_is_verbatim() {
        let query = InspectorQuery {
            search: Some("+9665023".into()),
            ..Default::default()
        };
        let page = service().list(query).await.unwrap();
        assert_eq!(page.data[0].id, "INS002");
    }

    #[tokio::test]
    async fn toggle_keeps_status_text_in_step() {
        let svc = service();
        let off = svc.toggle_active("INS003").await.unwrap();
        assert!(!off.is_active);
        assert_eq!(off.status, STATUS_INACTIVE);

        let inactive = InspectorQuery {
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(svc.list(inactive).await.unwrap().total, 1);

        let on = svc.toggle_active("INS003").await.unwrap();
        assert_eq!(on.status, STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn update_of_missing_inspector_fails() {
        let err = service()
            .update("INS999", InspectorUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::InspectionWizardConfig;
use crate::services::{
    InMemoryInspectorService, InMemoryLogService, InMemoryUserService, InMemoryVisitService,
    Latency, MockSubmissionService, Page,
};
use crate::wizard::FormData;

pub mod dashboard;
pub mod fill;
pub mod inspectors;
pub mod logs;
pub mod steps;
pub mod users;
pub mod validate;
pub mod visits;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// The seeded in-memory services, wired together the way the binary uses them.
pub struct Services {
    pub visits: Arc<InMemoryVisitService>,
    pub inspectors: Arc<InMemoryInspectorService>,
    pub users: Arc<InMemoryUserService>,
    pub logs: Arc<InMemoryLogService>,
    pub page_size: usize,
}

impl Services {
    pub fn from_config(config: &InspectionWizardConfig) -> Result<Self> {
        let latency = Latency::from_config(&config.services);
        Ok(Self {
            visits: Arc::new(InMemoryVisitService::seeded(
                latency,
                config.wizard.current_inspector_name.clone(),
            )?),
            inspectors: Arc::new(InMemoryInspectorService::seeded(latency)?),
            users: Arc::new(InMemoryUserService::seeded(latency)?),
            logs: Arc::new(InMemoryLogService::seeded(latency)?),
            page_size: config.services.page_size,
        })
    }

    pub fn submitter(&self) -> Arc<MockSubmissionService> {
        Arc::new(MockSubmissionService::new(
            self.visits.clone(),
            self.logs.clone(),
        ))
    }
}

pub fn read_form(path: &Path) -> Result<FormData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(FormData::from_json(value)?)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_page_footer<T>(page: &Page<T>) {
    println!();
    println!(
        "📄 Page {} of {} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{LogService, ReportSubmitter, VisitQuery, VisitService};
    use crate::wizard::NO;

    #[test]
    fn submitter_writes_into_the_shared_stores() {
        let services = Services::from_config(&InspectionWizardConfig::default()).unwrap();
        let mut form = FormData::default();
        form.set("facilityName", "ورشة النور");
        form.set("facilityCode", "F-004");
        form.set("hasViolation", NO);

        tokio_test::block_on(async {
            let receipt = services.submitter().submit(&form).await.unwrap();

            let listed = services.visits.list(VisitQuery::default()).await.unwrap();
            assert_eq!(listed.total, 9);
            let visit = services.visits.get(&receipt.visit_id).await.unwrap();
            assert_eq!(visit.establishment_code, "F-004");
            assert_eq!(services.logs.stats().await.unwrap().total, 11);
        });
    }

    #[test]
    fn page_size_comes_from_config() {
        let mut config = InspectionWizardConfig::default();
        config.services.page_size = 25;
        let services = Services::from_config(&config).unwrap();
        assert_eq!(services.page_size, 25);
    }
}

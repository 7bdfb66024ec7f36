/// Shared report fixtures for the wizard and service integration tests
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use inspection_wizard::services::{ReportSubmitter, ServiceError, SubmissionReceipt};
use inspection_wizard::wizard::{FormData, Wizard, NO};

/// Saved answers for a seven-step report with devices, samples and fines
pub fn load_violation_report() -> FormData {
    let raw = include_str!("report.json");
    let value: serde_json::Value = serde_json::from_str(raw).expect("Failed to parse report fixture JSON");
    FormData::from_json(value).expect("Report fixture does not fit the field registry")
}

/// Every always-required visit-info answer, with no violation recorded
pub const VISIT_INFO: &[(&str, &str)] = &[
    ("facilityName", "مخبز الأمل"),
    ("facilityCode", "F-002"),
    ("branch", "الفرع الشمالي"),
    ("facilityType", "محل تجاري"),
    ("activityType", "تجاري"),
    ("activityCategory", "الفئة الثانية"),
    ("region", "مكة المكرمة"),
    ("city", "جدة"),
    ("facilityStatus", "نشطة"),
    ("dataUpdated", "نعم"),
    ("complianceStatus", "ملتزم"),
    ("visitCategory", "زيارة دورية"),
    ("addedToDatabase", "لا"),
    ("sector", "القطاع الخاص"),
    ("inspectionImage", "visit.jpg"),
    ("hasViolation", NO),
];

pub fn fill_visit_info(wizard: &mut Wizard) {
    for (field, value) in VISIT_INFO {
        wizard.update_form_data(field, *value);
    }
}

pub fn fill_inspectors(wizard: &mut Wizard) {
    wizard.update_form_data("mainInspectorName", "فهد سعد الغامدي");
    wizard.update_form_data("mainInspectorTitle", "مفتش إداري");
    wizard.update_form_data("hasAssistantInspector", NO);
}

/// Submitter that keeps every report it accepts
#[derive(Default)]
pub struct CollectingSubmitter {
    pub accepted: Mutex<Vec<FormData>>,
    pub offline: bool,
}

impl CollectingSubmitter {
    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            offline: true,
            ..Default::default()
        })
    }

    pub fn count(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportSubmitter for CollectingSubmitter {
    async fn submit(&self, report: &FormData) -> Result<SubmissionReceipt, ServiceError> {
        if self.offline {
            return Err(ServiceError::Unavailable("submission endpoint offline".into()));
        }
        let mut accepted = self.accepted.lock().unwrap();
        accepted.push(report.clone());
        Ok(SubmissionReceipt {
            visit_id: format!("VISIT-{:04}", accepted.len()),
            log_id: accepted.len().to_string(),
        })
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::json;
use tracing::{error, info, warn};

use super::logs::{LogService, LogSeverity, LogType, NewLogEntry};
use super::visits::{NewVisit, VisitService};
use super::{ReportSubmitter, ServiceError, SubmissionReceipt};
use crate::wizard::summary::total_fine;
use crate::wizard::validator::needs_custom_facility_code;
use crate::wizard::{FormData, YES};

const FORM_TIMESTAMP: &str = "%Y-%m-%dT%H:%M";

/// Accepts completed reports into the in-memory visit store and leaves a
/// `FormSubmitted` entry in the activity log.
pub struct MockSubmissionService {
    visits: Arc<dyn VisitService>,
    logs: Arc<dyn LogService>,
}

impl MockSubmissionService {
    pub fn new(visits: Arc<dyn VisitService>, logs: Arc<dyn LogService>) -> Self {
        Self { visits, logs }
    }
}

fn text(form: &FormData, field: &str) -> String {
    form.text(field).unwrap_or_default().trim().to_string()
}

fn visit_time(form: &FormData) -> NaiveDateTime {
    form.text("visitDateTime")
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, FORM_TIMESTAMP).ok())
        .unwrap_or_else(|| Local::now().naive_local())
}

/// Map a completed form onto the visit record the back office lists.
pub fn visit_from_form(form: &FormData) -> NewVisit {
    let has_violation = form.equals("hasViolation", YES);
    let violations_count = if has_violation {
        ["violationType", "violation2Type"]
            .iter()
            .filter(|f| form.is_filled(f))
            .count() as u32
    } else {
        0
    };
    let establishment_code = if needs_custom_facility_code(form) {
        text(form, "customFacilityCode")
    } else {
        text(form, "facilityCode")
    };

    NewVisit {
        date_time: visit_time(form),
        establishment_name: text(form, "facilityName"),
        establishment_code,
        branch: form.text("branch").map(str::to_string),
        region: text(form, "region"),
        city: text(form, "city"),
        sector: text(form, "facilityType"),
        visit_type: text(form, "activityType"),
        compliance_status: text(form, "complianceStatus"),
        violations_count,
        samples_count: form.samples().len() as u32,
        fines_total: if has_violation { total_fine(form) } else { 0.0 },
        inspector_name: text(form, "mainInspectorName"),
    }
}

#[async_trait]
impl ReportSubmitter for MockSubmissionService {
    async fn submit(&self, report: &FormData) -> Result<SubmissionReceipt, ServiceError> {
        let visit = self.visits.record(visit_from_form(report)).await?;

        let severity = if visit.violations_count > 0 {
            LogSeverity::Warning
        } else {
            LogSeverity::Info
        };
        let logged = self
            .logs
            .add(NewLogEntry {
                kind: LogType::FormSubmitted,
                severity,
                message: format!("تم تقديم نموذج تفتيش للمنشأة رقم {}", visit.establishment_code),
                error_type: None,
                user: None,
                details: Some(json!({
                    "visitId": visit.id,
                    "facilityCode": visit.establishment_code,
                    "facilityName": visit.establishment_name,
                    "violationsCount": visit.violations_count,
                    "totalFine": visit.fines_total,
                    "complianceStatus": visit.compliance_status,
                })),
            })
            .await;
        let log = match logged {
            Ok(log) => log,
            Err(e) => {
                warn!(visit_id = %visit.id, error = %e, "Activity log write failed, discarding visit");
                if let Err(rollback) = self.visits.discard(&visit.id).await {
                    error!(visit_id = %visit.id, error = %rollback, "Could not discard visit");
                }
                return Err(e);
            }
        };

        info!(visit_id = %visit.id, log_id = %log.id, "Inspection report accepted");
        Ok(SubmissionReceipt {
            visit_id: visit.id,
            log_id: log.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::logs::MockLogService;
    use crate::services::{InMemoryLogService, InMemoryVisitService, Latency, VisitQuery, VisitService};
    use crate::wizard::{SampleRecord, CODE_NOT_FOUND, NO};

    fn report() -> FormData {
        let mut form = FormData::default();
        form.set("visitDateTime", "2026-02-01T08:30");
        form.set("facilityName", "مخبز الأمل");
        form.set("facilityCode", CODE_NOT_FOUND);
        form.set("customFacilityCode", "F-900");
        form.set("region", "الرياض");
        form.set("city", "الرياض");
        form.set("facilityType", "محل تجاري");
        form.set("activityType", "تجاري");
        form.set("complianceStatus", "غير ملتزم");
        form.set("hasViolation", YES);
        form.set("violationType", "مخالفة إدارية");
        form.set("fine1", 2000.0);
        form.set("fine2", "500");
        form.set(
            "samples",
            vec![SampleRecord {
                sample_type: "عينة منتج".into(),
                number: "S-1".into(),
            }],
        );
        form.set("mainInspectorName", "أحمد محمد السالم");
        form
    }

    #[test]
    fn custom_code_replaces_sentinel() {
        let visit = visit_from_form(&report());
        assert_eq!(visit.establishment_code, "F-900");
        assert_eq!(visit.violations_count, 1);
        assert_eq!(visit.samples_count, 1);
        assert_eq!(visit.fines_total, 2500.0);
        assert_eq!(visit.date_time.to_string(), "2026-02-01 08:30:00");
    }

    #[test]
    fn fines_are_ignored_without_violation() {
        let mut form = report();
        form.set("hasViolation", NO);
        let visit = visit_from_form(&form);
        assert_eq!(visit.violations_count, 0);
        assert_eq!(visit.fines_total, 0.0);
    }

    #[tokio::test]
    async fn submission_records_visit_and_log() {
        let visits = Arc::new(InMemoryVisitService::seeded(Latency::NONE, "").unwrap());
        let logs = Arc::new(InMemoryLogService::seeded(Latency::NONE).unwrap());
        let service = MockSubmissionService::new(visits.clone(), logs.clone());

        let receipt = service.submit(&report()).await.unwrap();
        assert_eq!(receipt.visit_id, "VISIT-0009");
        assert_eq!(receipt.log_id, "11");

        let visit = visits.get("VISIT-0009").await.unwrap();
        assert_eq!(visit.establishment_name, "مخبز الأمل");
        let entry = logs.get("11").await.unwrap();
        assert_eq!(entry.kind, LogType::FormSubmitted);
        assert_eq!(entry.severity, LogSeverity::Warning);
    }

    #[tokio::test]
    async fn log_failure_surfaces_to_the_caller() {
        let visits = Arc::new(InMemoryVisitService::seeded(Latency::NONE, "").unwrap());
        let mut logs = MockLogService::new();
        logs.expect_add()
            .times(1)
            .returning(|_| Err(ServiceError::Unavailable("log store offline".into())));
        let service = MockSubmissionService::new(visits.clone(), Arc::new(logs));

        let err = service.submit(&report()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(visits.list(VisitQuery::default()).await.unwrap().total, 8);
        assert!(visits.get("VISIT-0009").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn retries_after_a_log_failure_do_not_pile_up_visits() {
        let visits = Arc::new(InMemoryVisitService::seeded(Latency::NONE, "").unwrap());
        let mut logs = MockLogService::new();
        logs.expect_add()
            .times(2)
            .returning(|_| Err(ServiceError::Unavailable("log store offline".into())));
        let service = MockSubmissionService::new(visits.clone(), Arc::new(logs));

        for _ in 0..2 {
            assert!(service.submit(&report()).await.is_err());
        }
        assert_eq!(visits.list(VisitQuery::default()).await.unwrap().total, 8);
    }
}

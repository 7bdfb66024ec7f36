// Review summary shown on the confirmation step

use serde::Serialize;

use super::form_state::{FieldValue, FormData, VISIT_DATE_TIME};
use super::registry::{self, StepId};
use super::sequencer::StepPlan;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySection {
    pub step: StepId,
    pub title: &'static str,
    pub entries: Vec<SummaryEntry>,
}

/// Everything the inspector entered, grouped by step, ready for review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub sections: Vec<SummarySection>,
    pub total_fine: Option<f64>,
}

impl ReportSummary {
    pub fn from_form(form: &FormData) -> Self {
        let plan = StepPlan::for_form(form);
        let sections = plan
            .steps()
            .iter()
            .filter(|step| **step != StepId::Confirmation)
            .map(|step| SummarySection {
                step: *step,
                title: step.title(),
                entries: entries_for(*step, form),
            })
            .filter(|section| !section.entries.is_empty())
            .collect();

        let total_fine = plan.includes_violation_steps().then(|| total_fine(form));

        Self {
            sections,
            total_fine,
        }
    }

    pub fn section(&self, step: StepId) -> Option<&SummarySection> {
        self.sections.iter().find(|s| s.step == step)
    }
}

/// `fine1 + fine2`, treating missing or unparsable amounts as zero.
pub fn total_fine(form: &FormData) -> f64 {
    ["fine1", "fine2"]
        .iter()
        .filter_map(|name| form.get(name).and_then(FieldValue::as_number))
        .sum()
}

fn entries_for(step: StepId, form: &FormData) -> Vec<SummaryEntry> {
    let mut entries: Vec<SummaryEntry> = registry::fields_for(step)
        .iter()
        .filter(|def| !matches!(def.name, "devices" | "samples"))
        .filter_map(|def| {
            let value = form.get(def.name).filter(|v| !v.is_blank())?;
            let rendered = if def.name == VISIT_DATE_TIME {
                value.display().replace('T', " ")
            } else {
                value.display()
            };
            Some(SummaryEntry {
                label: def.label.to_string(),
                value: rendered,
            })
        })
        .collect();

    match step {
        StepId::Devices => {
            for (i, device) in form.devices().iter().enumerate() {
                entries.push(SummaryEntry {
                    label: format!("الجهاز {}", i + 1),
                    value: format!("{} ({})", device.name, device.number),
                });
            }
        }
        StepId::Samples => {
            for (i, sample) in form.samples().iter().enumerate() {
                entries.push(SummaryEntry {
                    label: format!("العينة {}", i + 1),
                    value: format!("{} ({})", sample.sample_type, sample.number),
                });
            }
        }
        _ => {}
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::form_state::DeviceRecord;
    use crate::wizard::registry::{NO, YES};

    #[test]
    fn blank_fields_are_left_out() {
        let mut form = FormData::default();
        form.set("facilityName", "مخبز الأمل");
        form.set("branch", "");
        form.set("hasViolation", NO);

        let summary = ReportSummary::from_form(&form);
        let visit = summary.section(StepId::VisitInfo).unwrap();
        assert!(visit.entries.iter().any(|e| e.value == "مخبز الأمل"));
        assert!(visit.entries.iter().all(|e| e.label != "الفرع"));
        assert!(summary.section(StepId::Fines).is_none());
        assert_eq!(summary.total_fine, None);
    }

    #[test]
    fn fines_and_devices_are_summarised() {
        let mut form = FormData::default();
        form.set("hasViolation", YES);
        form.set("fine1", "15000");
        form.set("fine2", 8000.0);
        form.set("deviceCount", "1");
        form.set(
            "devices",
            vec![DeviceRecord {
                name: "جهاز قياس الضوضاء".into(),
                number: "D-002".into(),
            }],
        );

        let summary = ReportSummary::from_form(&form);
        assert_eq!(summary.total_fine, Some(23000.0));
        let devices = summary.section(StepId::Devices).unwrap();
        assert_eq!(devices.entries.last().unwrap().value, "جهاز قياس الضوضاء (D-002)");
    }
}

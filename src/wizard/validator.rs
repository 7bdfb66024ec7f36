// Step validator - recomputes the full error set for one step on every call

use serde::Serialize;

use super::form_state::{row_cell, FieldValue, FormData};
use super::registry::{
    self, FieldDef, Requirement, RowColumn, RowList, StepId, CODE_NOT_FOUND, MAX_ROWS, YES,
};
use super::sequencer::StepPlan;

/// Error against a single named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error against one cell of a repeating device/sample row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub list: RowList,
    pub index: usize,
    pub column: RowColumn,
    pub message: String,
}

impl RowError {
    /// Flat key in the `device_0_name` style used by form renderers.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.list.key_prefix(), self.index, self.column.key())
    }
}

/// Where the first invalid input sits, so a caller can scroll to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    Field(String),
    Row { list: RowList, index: usize, column: RowColumn },
}

/// Errors of the last validated step. Field errors keep registry order and
/// come before row errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<FieldError>,
    rows: Vec<RowError>,
}

impl ValidationErrors {
    pub fn from_fields(fields: Vec<FieldError>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.rows.is_empty()
    }

    /// Number of failing inputs, as shown in the "missing fields" toast.
    pub fn count(&self) -> usize {
        self.fields.len() + self.rows.len()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    pub fn rows(&self) -> &[RowError] {
        &self.rows
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|e| e.field == name)
            .map(|e| e.message.as_str())
    }

    pub fn row(&self, list: RowList, index: usize, column: RowColumn) -> Option<&str> {
        self.rows
            .iter()
            .find(|e| e.list == list && e.index == index && e.column == column)
            .map(|e| e.message.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn first_location(&self) -> Option<ErrorLocation> {
        if let Some(first) = self.fields.first() {
            return Some(ErrorLocation::Field(first.field.clone()));
        }
        self.rows.first().map(|e| ErrorLocation::Row {
            list: e.list,
            index: e.index,
            column: e.column,
        })
    }

    /// Flat `key -> message` pairs, field errors first.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .chain(self.rows.iter().map(|e| (e.key(), e.message.clone())))
            .collect()
    }

    pub(crate) fn clear_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|e| e.field != name);
        before != self.fields.len()
    }

    pub(crate) fn clear_row(&mut self, list: RowList, index: usize, column: RowColumn) {
        self.rows
            .retain(|e| !(e.list == list && e.index == index && e.column == column));
    }

    /// Drop row errors at or after `index`; used when rows shift.
    pub(crate) fn clear_rows_from(&mut self, list: RowList, index: usize) {
        self.rows.retain(|e| !(e.list == list && e.index >= index));
    }

    fn push_field(&mut self, field: &str, message: String) {
        self.fields.push(FieldError::new(field, message));
    }
}

/// Result of validating one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub step: Option<StepId>,
    pub is_valid: bool,
    pub errors: ValidationErrors,
}

impl ValidationOutcome {
    fn from_errors(step: Option<StepId>, errors: ValidationErrors) -> Self {
        Self {
            step,
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate the step found at `step_index` of the plan the form currently
/// selects. An index outside that plan has no rules to check.
pub fn validate(step_index: usize, form: &FormData) -> ValidationOutcome {
    let step = StepPlan::for_form(form).step_at(step_index);
    let errors = step.map(|s| validate_step(s, form)).unwrap_or_default();
    ValidationOutcome::from_errors(step, errors)
}

/// Validate a step by identity.
pub fn validate_step(step: StepId, form: &FormData) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if step.requires_violation() && !form.equals("hasViolation", YES) {
        return errors;
    }

    for def in registry::fields_for(step) {
        if is_required(def, form) && !is_list_field(def) && !form.is_filled(def.name) {
            errors.push_field(def.name, def.required_message());
        }
    }

    match step {
        StepId::Devices => check_rows(RowList::Devices, form, &mut errors),
        StepId::Samples => check_rows(RowList::Samples, form, &mut errors),
        StepId::Fines => check_fine_amounts(form, &mut errors),
        _ => {}
    }

    errors
}

fn is_required(def: &FieldDef, form: &FormData) -> bool {
    match def.requirement {
        Requirement::Optional => false,
        Requirement::Always => true,
        Requirement::When { field, equals } => form.equals(field, equals),
    }
}

// Counts and row lists have their own messages, checked in `check_rows`.
fn is_list_field(def: &FieldDef) -> bool {
    matches!(def.name, "deviceCount" | "devices" | "sampleCount" | "samples")
}

fn check_rows(list: RowList, form: &FormData, errors: &mut ValidationErrors) {
    if !form.equals(list.answer_field(), YES) {
        return;
    }

    let count = form.get(list.count_field()).and_then(FieldValue::as_count);
    match count {
        None => {
            let label = registry::label_of(list.count_field());
            errors.push_field(list.count_field(), format!("{label} {}", registry::REQUIRED_SUFFIX));
        }
        Some(n) if n <= 0 => {
            errors.push_field(list.count_field(), "يجب أن يكون العدد أكبر من صفر".to_string());
        }
        Some(n) if n > MAX_ROWS as i64 => {
            errors.push_field(
                list.count_field(),
                format!("يجب ألا يتجاوز العدد {MAX_ROWS}"),
            );
        }
        Some(_) => {}
    }

    let len = match list {
        RowList::Devices => form.devices().len(),
        RowList::Samples => form.samples().len(),
    };
    if len == 0 {
        let message = match list {
            RowList::Devices => "يجب إضافة جهاز واحد على الأقل",
            RowList::Samples => "يجب إضافة عينة واحدة على الأقل",
        };
        errors.push_field(list.field(), message.to_string());
        return;
    }

    for index in 0..len {
        for column in list.columns() {
            let filled = row_cell(form, list, index, column).is_some_and(|v| !v.trim().is_empty());
            if !filled {
                errors.rows.push(RowError {
                    list,
                    index,
                    column,
                    message: format!("{} {}", list.column_label(column), registry::REQUIRED_SUFFIX),
                });
            }
        }
    }
}

fn check_fine_amounts(form: &FormData, errors: &mut ValidationErrors) {
    for name in ["fine1", "fine2"] {
        if !form.is_filled(name) || errors.contains(name) {
            continue;
        }
        let valid = form
            .get(name)
            .and_then(FieldValue::as_number)
            .is_some_and(|amount| amount >= 0.0);
        if !valid {
            let label = registry::label_of(name);
            errors.push_field(name, format!("{label} يجب أن يكون رقماً غير سالب"));
        }
    }
}

/// True when the chosen facility code needs the manual code field.
pub fn needs_custom_facility_code(form: &FormData) -> bool {
    form.equals("facilityCode", CODE_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::form_state::{DeviceRecord, SampleRecord};
    use crate::wizard::registry::NO;

    fn visit_info_filled() -> FormData {
        let mut form = FormData::default();
        for def in registry::fields_for(StepId::VisitInfo) {
            if def.requirement == Requirement::Always {
                let value = def.options.first().copied().unwrap_or("قيمة");
                form.set(def.name, value);
            }
        }
        form.set("hasViolation", NO);
        form
    }

    #[test]
    fn empty_visit_info_reports_every_required_field() {
        let outcome = validate(0, &FormData::default());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.errors.count(), 16);
        assert_eq!(
            outcome.errors.field("facilityName"),
            Some("اسم المنشأة مطلوب")
        );
        assert_eq!(
            outcome.errors.first_location(),
            Some(ErrorLocation::Field("facilityName".to_string()))
        );
    }

    #[test]
    fn violation_answer_requires_violation_type() {
        let mut form = FormData::default();
        form.set("hasViolation", YES);
        let outcome = validate(0, &form);
        assert_eq!(outcome.errors.count(), 16);
        assert!(outcome.errors.contains("violationType"));
        assert!(!outcome.errors.contains("hasViolation"));
    }

    #[test]
    fn sentinel_code_requires_custom_code() {
        let mut form = visit_info_filled();
        form.set("facilityCode", CODE_NOT_FOUND);
        assert!(needs_custom_facility_code(&form));

        let errors = validate_step(StepId::VisitInfo, &form);
        assert_eq!(errors.count(), 1);
        assert!(errors.contains("customFacilityCode"));

        form.set("customFacilityCode", "F-900");
        assert!(validate_step(StepId::VisitInfo, &form).is_empty());
    }

    #[test]
    fn device_rows_get_one_error_per_missing_cell() {
        let mut form = FormData::default();
        form.set("hasDevices", YES);
        form.set("deviceCount", "2");
        form.set(
            "devices",
            vec![
                DeviceRecord {
                    name: "جهاز قياس الانبعاثات".into(),
                    number: String::new(),
                },
                DeviceRecord::default(),
            ],
        );

        let errors = validate_step(StepId::Devices, &form);
        assert_eq!(errors.rows().len(), 3);
        assert!(errors.row(RowList::Devices, 0, RowColumn::Number).is_some());
        assert!(errors.row(RowList::Devices, 0, RowColumn::Name).is_none());
        assert_eq!(errors.rows()[0].key(), "device_0_number");
    }

    #[test]
    fn zero_count_and_empty_list_are_rejected() {
        let mut form = FormData::default();
        form.set("hasSamples", YES);
        form.set("sampleCount", "0");

        let errors = validate_step(StepId::Samples, &form);
        assert!(errors.contains("sampleCount"));
        assert!(errors.contains("samples"));

        form.set("sampleCount", 1.0);
        form.set(
            "samples",
            vec![SampleRecord {
                sample_type: "عينة هواء".into(),
                number: "S-2026-001".into(),
            }],
        );
        assert!(validate_step(StepId::Samples, &form).is_empty());
    }

    #[test]
    fn count_above_the_row_cap_is_rejected() {
        let mut form = FormData::default();
        form.set("hasDevices", YES);
        form.set("deviceCount", "999999999999999999");
        form.set(
            "devices",
            vec![
                DeviceRecord {
                    name: "جهاز قياس الضوضاء".into(),
                    number: "D-1".into(),
                };
                MAX_ROWS
            ],
        );

        let errors = validate_step(StepId::Devices, &form);
        assert_eq!(errors.count(), 1);
        assert!(errors.contains("deviceCount"));
    }

    #[test]
    fn violation_steps_are_skipped_without_violation() {
        let form = FormData::default();
        assert!(validate_step(StepId::Violations, &form).is_empty());
        assert!(validate_step(StepId::Fines, &form).is_empty());

        let mut with_violation = FormData::default();
        with_violation.set("hasViolation", YES);
        assert_eq!(validate_step(StepId::Violations, &with_violation).count(), 3);
        assert_eq!(validate_step(StepId::Fines, &with_violation).count(), 2);
    }

    #[test]
    fn fines_must_be_non_negative_numbers() {
        let mut form = FormData::default();
        form.set("hasViolation", YES);
        form.set("fine1", "-5");
        form.set("fine2", 8000.0);

        let errors = validate_step(StepId::Fines, &form);
        assert_eq!(errors.count(), 1);
        assert!(errors.contains("fine1"));
    }

    #[test]
    fn assistant_name_required_only_when_present() {
        let mut form = FormData::default();
        form.set("mainInspectorName", "أحمد محمد السالم");
        form.set("mainInspectorTitle", "مفتش بيئي أول");
        form.set("hasAssistantInspector", NO);
        assert!(validate_step(StepId::Inspectors, &form).is_empty());

        form.set("hasAssistantInspector", YES);
        let errors = validate_step(StepId::Inspectors, &form);
        assert_eq!(errors.entries(), vec![(
            "assistantInspectorName".to_string(),
            "اسم المفتش المساعد مطلوب".to_string()
        )]);
    }

    #[test]
    fn index_outside_plan_has_nothing_to_check() {
        let outcome = validate(9, &FormData::default());
        assert!(outcome.is_valid);
        assert_eq!(outcome.step, None);
    }
}

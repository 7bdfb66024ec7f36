// Form state - the report being built plus the errors of the last validation
//
// Every edit goes through `FormState` so that editing a field clears the error
// recorded against it, and so the device/sample counts stay in sync with
// their row lists.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::{self, FieldKind, RowColumn, RowList, MAX_ROWS, NO};
use super::validator::ValidationErrors;

pub const VISIT_DATE_TIME: &str = "visitDateTime";

/// One device used during the visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub number: String,
}

/// One sample drawn during the visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(rename = "type")]
    pub sample_type: String,
    pub number: String,
}

trait Row {
    fn cell(&self, column: RowColumn) -> &str;
    fn set_cell(&mut self, column: RowColumn, value: String);
}

impl Row for DeviceRecord {
    fn cell(&self, column: RowColumn) -> &str {
        match column {
            RowColumn::Number => &self.number,
            _ => &self.name,
        }
    }

    fn set_cell(&mut self, column: RowColumn, value: String) {
        match column {
            RowColumn::Number => self.number = value,
            _ => self.name = value,
        }
    }
}

impl Row for SampleRecord {
    fn cell(&self, column: RowColumn) -> &str {
        match column {
            RowColumn::Number => &self.number,
            _ => &self.sample_type,
        }
    }

    fn set_cell(&mut self, column: RowColumn, value: String) {
        match column {
            RowColumn::Number => self.number = value,
            _ => self.sample_type = value,
        }
    }
}

/// Tagged value of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Devices(Vec<DeviceRecord>),
    Samples(Vec<SampleRecord>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// A value the inspector has not really filled in.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => n.is_nan(),
            FieldValue::Flag(_) => false,
            FieldValue::Devices(rows) => rows.is_empty(),
            FieldValue::Samples(rows) => rows.is_empty(),
        }
    }

    /// Numeric reading of the value; text is parsed leniently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if !n.is_nan() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Integer reading with form-input semantics: leading digits count,
    /// anything unparsable is `None`.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            FieldValue::Text(s) => parse_leading_int(s),
            _ => None,
        }
    }

    /// Human readable rendering used by summaries and the CLI.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            FieldValue::Number(n) => format!("{n:.2}"),
            FieldValue::Flag(b) => (if *b { registry::YES } else { NO }).to_string(),
            FieldValue::Devices(rows) => format!("{} أجهزة", rows.len()),
            FieldValue::Samples(rows) => format!("{} عينات", rows.len()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<Vec<DeviceRecord>> for FieldValue {
    fn from(value: Vec<DeviceRecord>) -> Self {
        FieldValue::Devices(value)
    }
}

impl From<Vec<SampleRecord>> for FieldValue {
    fn from(value: Vec<SampleRecord>) -> Self {
        FieldValue::Samples(value)
    }
}

/// Parse like a browser number input handed to `parseInt`: optional sign,
/// then leading digits.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[derive(Debug, Error)]
pub enum FormDataError {
    #[error("form input must be a JSON object")]
    NotAnObject,
    #[error("field {field} expects {expected}")]
    KindMismatch { field: String, expected: &'static str },
    #[error("field {field} has malformed rows: {source}")]
    MalformedRows {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The whole inspection report, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormData {
    values: BTreeMap<String, FieldValue>,
}

impl FormData {
    /// Empty report with the visit timestamp pre-filled.
    pub fn initial(now: DateTime<Local>) -> Self {
        let mut data = Self::default();
        data.set(VISIT_DATE_TIME, now.format("%Y-%m-%dT%H:%M").to_string());
        data
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.values.remove(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// True when the field holds exactly the given text.
    pub fn equals(&self, field: &str, expected: &str) -> bool {
        self.text(field) == Some(expected)
    }

    pub fn is_filled(&self, field: &str) -> bool {
        self.get(field).is_some_and(|value| !value.is_blank())
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        match self.get(RowList::Devices.field()) {
            Some(FieldValue::Devices(rows)) => rows,
            _ => &[],
        }
    }

    pub fn samples(&self) -> &[SampleRecord] {
        match self.get(RowList::Samples.field()) {
            Some(FieldValue::Samples(rows)) => rows,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Decode saved answers. Registered fields are decoded by their kind;
    /// unknown keys keep whatever scalar JSON gave them.
    pub fn from_json(input: serde_json::Value) -> Result<Self, FormDataError> {
        let serde_json::Value::Object(map) = input else {
            return Err(FormDataError::NotAnObject);
        };

        let mut data = Self::default();
        for (name, raw) in map {
            if raw.is_null() {
                continue;
            }
            let kind = registry::field(&name).map(|def| def.kind);
            let value = decode_value(&name, kind, raw)?;
            data.values.insert(name, value);
        }
        Ok(data)
    }
}

fn decode_value(
    name: &str,
    kind: Option<FieldKind>,
    raw: serde_json::Value,
) -> Result<FieldValue, FormDataError> {
    use serde_json::Value;

    let mismatch = |expected| FormDataError::KindMismatch {
        field: name.to_string(),
        expected,
    };
    let rows_error = |source| FormDataError::MalformedRows {
        field: name.to_string(),
        source,
    };

    match (kind, raw) {
        (Some(FieldKind::DeviceList), rows @ Value::Array(_)) => serde_json::from_value(rows)
            .map(FieldValue::Devices)
            .map_err(rows_error),
        (Some(FieldKind::SampleList), rows @ Value::Array(_)) => serde_json::from_value(rows)
            .map(FieldValue::Samples)
            .map_err(rows_error),
        (Some(FieldKind::DeviceList | FieldKind::SampleList), _) => Err(mismatch("a list of rows")),
        (Some(FieldKind::Number | FieldKind::Money), Value::Number(n)) => {
            n.as_f64().map(FieldValue::Number).ok_or_else(|| mismatch("a number"))
        }
        (_, Value::String(s)) => Ok(FieldValue::Text(s)),
        (_, Value::Number(n)) => n.as_f64().map(FieldValue::Number).ok_or_else(|| mismatch("a number")),
        (_, Value::Bool(b)) => Ok(FieldValue::Flag(b)),
        (_, _) => Err(mismatch("a scalar value")),
    }
}

/// Mutable wizard form: report values and the current validation errors.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    data: FormData,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new(data: FormData) -> Self {
        Self {
            data,
            errors: ValidationErrors::default(),
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub(crate) fn replace_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors = ValidationErrors::default();
    }

    /// Replace one field and drop the error recorded against it.
    pub fn update_form_data(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.data.set(field, value);
        if self.errors.clear_field(field) {
            tracing::debug!(field = %field, "cleared validation error after edit");
        }
    }

    pub fn reset(&mut self, data: FormData) {
        self.data = data;
        self.errors = ValidationErrors::default();
    }

    pub fn set_has_devices(&mut self, answer: &str) {
        self.set_list_answer(RowList::Devices, answer);
    }

    pub fn set_has_samples(&mut self, answer: &str) {
        self.set_list_answer(RowList::Samples, answer);
    }

    /// Apply a raw device count and grow/shrink the device rows to match.
    pub fn set_device_count(&mut self, raw: &str) {
        let mut rows = self.data.devices().to_vec();
        resize_rows(&mut rows, raw);
        self.update_form_data(RowList::Devices.count_field(), raw);
        self.update_form_data(RowList::Devices.field(), rows);
    }

    pub fn set_sample_count(&mut self, raw: &str) {
        let mut rows = self.data.samples().to_vec();
        resize_rows(&mut rows, raw);
        self.update_form_data(RowList::Samples.count_field(), raw);
        self.update_form_data(RowList::Samples.field(), rows);
    }

    pub fn add_device(&mut self) {
        let mut rows = self.data.devices().to_vec();
        if rows.len() >= MAX_ROWS {
            return;
        }
        rows.push(DeviceRecord::default());
        self.store_rows(RowList::Devices, rows);
    }

    pub fn add_sample(&mut self) {
        let mut rows = self.data.samples().to_vec();
        if rows.len() >= MAX_ROWS {
            return;
        }
        rows.push(SampleRecord::default());
        self.store_rows(RowList::Samples, rows);
    }

    /// Remove a device row. Out-of-range indices are ignored.
    pub fn remove_device(&mut self, index: usize) {
        let mut rows = self.data.devices().to_vec();
        if index < rows.len() {
            rows.remove(index);
            self.errors.clear_rows_from(RowList::Devices, index);
            self.store_rows(RowList::Devices, rows);
        }
    }

    pub fn remove_sample(&mut self, index: usize) {
        let mut rows = self.data.samples().to_vec();
        if index < rows.len() {
            rows.remove(index);
            self.errors.clear_rows_from(RowList::Samples, index);
            self.store_rows(RowList::Samples, rows);
        }
    }

    pub fn update_device(&mut self, index: usize, column: RowColumn, value: impl Into<String>) {
        let mut rows = self.data.devices().to_vec();
        if let Some(row) = rows.get_mut(index) {
            row.set_cell(column, value.into());
            self.errors.clear_row(RowList::Devices, index, column);
            self.data.set(RowList::Devices.field(), rows);
        }
    }

    pub fn update_sample(&mut self, index: usize, column: RowColumn, value: impl Into<String>) {
        let mut rows = self.data.samples().to_vec();
        if let Some(row) = rows.get_mut(index) {
            row.set_cell(column, value.into());
            self.errors.clear_row(RowList::Samples, index, column);
            self.data.set(RowList::Samples.field(), rows);
        }
    }

    fn set_list_answer(&mut self, list: RowList, answer: &str) {
        self.update_form_data(list.answer_field(), answer);
        if answer == NO {
            self.update_form_data(list.count_field(), "0");
            match list {
                RowList::Devices => self.update_form_data(list.field(), Vec::<DeviceRecord>::new()),
                RowList::Samples => self.update_form_data(list.field(), Vec::<SampleRecord>::new()),
            }
            self.errors.clear_rows_from(list, 0);
        }
    }

    fn store_rows<R>(&mut self, list: RowList, rows: Vec<R>)
    where
        Vec<R>: Into<FieldValue>,
    {
        let count = rows.len().to_string();
        self.update_form_data(list.field(), rows);
        self.update_form_data(list.count_field(), count);
    }
}

fn resize_rows<R: Default + Clone>(rows: &mut Vec<R>, raw: &str) {
    let target = parse_leading_int(raw).unwrap_or(0).clamp(0, MAX_ROWS as i64) as usize;
    rows.resize(target, R::default());
}

/// Read one cell of a device or sample row.
pub fn row_cell(data: &FormData, list: RowList, index: usize, column: RowColumn) -> Option<&str> {
    match list {
        RowList::Devices => data.devices().get(index).map(|row| row.cell(column)),
        RowList::Samples => data.samples().get(index).map(|row| row.cell(column)),
    }
}

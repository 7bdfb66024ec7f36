// Dashboard aggregations over recorded inspections

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::services::InspectionRecord;

pub const COMPLIANT: &str = "ملتزم";
pub const NON_COMPLIANT: &str = "غير ملتزم";
pub const FOLLOW_UP_VISIT: &str = "زيارة متابعة";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_inspections: usize,
    pub total_violations: usize,
    pub total_fines: f64,
    pub active_facilities: usize,
    /// Percentage of compliant inspections, 0 when there are none.
    pub compliance_rate: f64,
    pub total_samples: u32,
    pub total_devices: u32,
    pub pending_followups: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceTally {
    pub compliant: usize,
    pub non_compliant: usize,
    pub partial: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorPerformance {
    pub name: String,
    pub title: String,
    pub total_inspections: usize,
    pub total_violations: usize,
    pub total_fines: f64,
    pub facilities_count: usize,
    pub regions_count: usize,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub compliance_rate: f64,
    pub last_inspection: NaiveDateTime,
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn is_compliant(record: &InspectionRecord) -> bool {
    record.compliance_status == COMPLIANT
}

pub fn summary(records: &[InspectionRecord]) -> DashboardSummary {
    let compliant = records.iter().filter(|r| is_compliant(r)).count();
    DashboardSummary {
        total_inspections: records.len(),
        total_violations: records.iter().filter(|r| r.violation_type.is_some()).count(),
        total_fines: records.iter().map(|r| r.total_fine).sum(),
        active_facilities: records
            .iter()
            .map(|r| r.facility_code.as_str())
            .collect::<BTreeSet<_>>()
            .len(),
        compliance_rate: rate(compliant, records.len()),
        total_samples: records.iter().map(|r| r.total_samples).sum(),
        total_devices: records.iter().map(|r| r.device_count).sum(),
        pending_followups: records
            .iter()
            .filter(|r| r.visit_type == FOLLOW_UP_VISIT)
            .count(),
    }
}

fn count_by<'a>(
    records: &'a [InspectionRecord],
    key: impl Fn(&'a InspectionRecord) -> Option<&'a str>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in records.iter().filter_map(key) {
        *counts.entry(key.to_string()).or_default() += 1;
    }
    counts
}

pub fn by_region(records: &[InspectionRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| Some(r.region.as_str()))
}

pub fn by_violation_type(records: &[InspectionRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| r.violation_type.as_deref())
}

pub fn by_facility_type(records: &[InspectionRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| Some(r.facility_type.as_str()))
}

pub fn by_activity_type(records: &[InspectionRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| Some(r.activity_type.as_str()))
}

/// Keyed by `YYYY-MM`. Anything neither compliant nor non-compliant counts
/// as partial.
pub fn compliance_by_month(records: &[InspectionRecord]) -> BTreeMap<String, ComplianceTally> {
    let mut months: BTreeMap<String, ComplianceTally> = BTreeMap::new();
    for record in records {
        let tally = months
            .entry(record.visit_date_time.format("%Y-%m").to_string())
            .or_default();
        match record.compliance_status.as_str() {
            COMPLIANT => tally.compliant += 1,
            NON_COMPLIANT => tally.non_compliant += 1,
            _ => tally.partial += 1,
        }
    }
    months
}

/// Per main inspector, busiest first.
pub fn inspector_performance(records: &[InspectionRecord]) -> Vec<InspectorPerformance> {
    struct Acc<'a> {
        first: &'a InspectionRecord,
        inspections: usize,
        violations: usize,
        fines: f64,
        facilities: BTreeSet<&'a str>,
        regions: BTreeSet<&'a str>,
        compliant: usize,
        last: NaiveDateTime,
    }

    let mut by_name: BTreeMap<&str, Acc<'_>> = BTreeMap::new();
    for record in records {
        let acc = by_name
            .entry(record.main_inspector_name.as_str())
            .or_insert_with(|| Acc {
                first: record,
                inspections: 0,
                violations: 0,
                fines: 0.0,
                facilities: BTreeSet::new(),
                regions: BTreeSet::new(),
                compliant: 0,
                last: record.visit_date_time,
            });
        acc.inspections += 1;
        acc.violations += usize::from(record.violation_type.is_some());
        acc.fines += record.total_fine;
        acc.facilities.insert(&record.facility_code);
        acc.regions.insert(&record.region);
        acc.compliant += usize::from(is_compliant(record));
        acc.last = acc.last.max(record.visit_date_time);
    }

    let mut rows: Vec<InspectorPerformance> = by_name
        .into_values()
        .map(|acc| InspectorPerformance {
            name: acc.first.main_inspector_name.clone(),
            title: acc.first.main_inspector_title.clone(),
            total_inspections: acc.inspections,
            total_violations: acc.violations,
            total_fines: acc.fines,
            facilities_count: acc.facilities.len(),
            regions_count: acc.regions.len(),
            compliant_count: acc.compliant,
            non_compliant_count: acc.inspections - acc.compliant,
            compliance_rate: rate(acc.compliant, acc.inspections),
            last_inspection: acc.last,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_inspections
            .cmp(&a.total_inspections)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

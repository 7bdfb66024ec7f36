use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::json;

use super::{print_json, Command};
use crate::dashboard;
use crate::services::seed;

pub struct DashboardCommand {
    pub json: bool,
}

fn print_counts(title: &str, counts: &BTreeMap<String, usize>) {
    println!("   {title}:");
    for (key, count) in counts {
        println!("      {key}: {count}");
    }
}

impl Command for DashboardCommand {
    async fn execute(&self) -> Result<()> {
        let records = seed::inspections()?;
        let summary = dashboard::summary(&records);
        let regions = dashboard::by_region(&records);
        let violations = dashboard::by_violation_type(&records);
        let facilities = dashboard::by_facility_type(&records);
        let months = dashboard::compliance_by_month(&records);
        let inspectors = dashboard::inspector_performance(&records);

        if self.json {
            return print_json(&json!({
                "summary": summary,
                "byRegion": regions,
                "byViolationType": violations,
                "byFacilityType": facilities,
                "complianceByMonth": months,
                "inspectors": inspectors,
            }));
        }

        println!("📈 Inspection dashboard");
        println!(
            "   {} inspections │ {} facilities │ {:.1}% compliant │ {:.0} in fines",
            summary.total_inspections,
            summary.active_facilities,
            summary.compliance_rate,
            summary.total_fines
        );
        println!(
            "   {} samples │ {} devices │ {} follow-ups pending",
            summary.total_samples, summary.total_devices, summary.pending_followups
        );
        println!();
        print_counts("By region", &regions);
        print_counts("By violation type", &violations);
        print_counts("By facility type", &facilities);
        println!("   Compliance by month:");
        for (month, tally) in &months {
            println!(
                "      {month}: ✅ {} │ ❌ {} │ ➖ {}",
                tally.compliant, tally.non_compliant, tally.partial
            );
        }
        println!();
        println!("👷 Inspector performance:");
        for row in &inspectors {
            println!(
                "   {} ({}) │ {} visits │ {} facilities │ {:.1}% compliant │ last {}",
                row.name,
                row.title,
                row.total_inspections,
                row.facilities_count,
                row.compliance_rate,
                row.last_inspection.format("%Y-%m-%d")
            );
        }
        Ok(())
    }
}

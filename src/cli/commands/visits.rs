use anyhow::Result;

use super::{print_json, print_page_footer, Command, Services};
use crate::config::config;
use crate::services::{Visit, VisitQuery, VisitService};

pub struct VisitsCommand {
    pub query: VisitQuery,
    pub json: bool,
}

impl Command for VisitsCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let query = VisitQuery {
            page_size: services.page_size,
            ..self.query.clone()
        };
        let page = services.visits.list(query).await?;
        if self.json {
            return print_json(&page);
        }

        if page.data.is_empty() {
            println!("📋 No visits match these filters");
            return Ok(());
        }
        println!("🏭 Inspection visits:");
        for visit in &page.data {
            println!(
                "   {} │ {} │ {} ({}) │ {} │ {}",
                visit.id,
                visit.date_time.format("%Y-%m-%d %H:%M"),
                visit.establishment_name,
                visit.establishment_code,
                visit.region,
                visit.compliance_status
            );
        }
        print_page_footer(&page);
        Ok(())
    }
}

pub struct VisitCommand {
    pub id: String,
    pub archive: bool,
    pub unarchive: bool,
    pub json: bool,
}

impl Command for VisitCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let visit = if self.archive {
            services.visits.archive(&self.id).await?
        } else if self.unarchive {
            services.visits.unarchive(&self.id).await?
        } else {
            services.visits.get(&self.id).await?
        };

        if self.json {
            return print_json(&visit);
        }
        print_visit(&visit);
        Ok(())
    }
}

fn print_visit(visit: &Visit) {
    println!("🏭 {} - {}", visit.id, visit.establishment_name);
    println!("   📅 {}", visit.date_time.format("%Y-%m-%d %H:%M"));
    println!("   🔖 Code: {} │ Branch: {}", visit.establishment_code, visit.branch);
    println!("   📍 {} / {}", visit.region, visit.city);
    println!("   🏷️  {} │ {}", visit.sector, visit.visit_type);
    println!("   ⚖️  {}", visit.compliance_status);
    println!(
        "   📊 Violations: {} │ Samples: {} │ Fines: {:.2}",
        visit.violations_count, visit.samples_count, visit.fines_total
    );
    println!("   👤 {}", visit.inspector_name);
    if visit.is_archived {
        println!("   🗄️  Archived");
    }
}

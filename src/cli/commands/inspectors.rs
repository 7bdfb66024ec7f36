use anyhow::Result;

use super::{print_json, print_page_footer, Command, Services};
use crate::config::config;
use crate::services::{InspectorQuery, InspectorService};

pub struct InspectorsCommand {
    pub query: InspectorQuery,
    pub json: bool,
}

impl Command for InspectorsCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let query = InspectorQuery {
            page_size: services.page_size,
            ..self.query.clone()
        };
        let page = services.inspectors.list(query).await?;
        if self.json {
            return print_json(&page);
        }

        if page.data.is_empty() {
            println!("📋 No inspectors match these filters");
            return Ok(());
        }
        println!("👷 Inspectors:");
        for inspector in &page.data {
            let marker = if inspector.is_active { "🟢" } else { "⚪" };
            println!(
                "   {} {} │ {} │ {} │ {} │ {} inspections, {:.0}% compliant",
                marker,
                inspector.id,
                inspector.name,
                inspector.title,
                inspector.region,
                inspector.total_inspections,
                inspector.compliance_rate
            );
        }
        print_page_footer(&page);
        Ok(())
    }
}

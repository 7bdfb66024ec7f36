use anyhow::Result;

use super::{print_json, print_page_footer, Command, Services};
use crate::config::config;
use crate::services::{LogQuery, LogService, LogSeverity};

pub struct LogsCommand {
    pub query: LogQuery,
    pub json: bool,
}

impl Command for LogsCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let query = LogQuery {
            page_size: services.page_size,
            ..self.query.clone()
        };
        let page = services.logs.list(query).await?;
        if self.json {
            return print_json(&page);
        }

        if page.data.is_empty() {
            println!("📋 No log entries match these filters");
            return Ok(());
        }
        println!("📜 Activity log:");
        for entry in &page.data {
            let icon = match entry.severity {
                LogSeverity::Info => "ℹ️ ",
                LogSeverity::Warning => "⚠️ ",
                LogSeverity::Error => "❌",
            };
            let who = entry.user.as_ref().map(|u| u.name.as_str()).unwrap_or("-");
            println!(
                "   {} {} │ {} │ {:?} │ {} │ {}",
                icon,
                entry.id,
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.kind,
                who,
                entry.message
            );
        }
        print_page_footer(&page);
        Ok(())
    }
}

pub struct LogStatsCommand {
    pub json: bool,
}

impl Command for LogStatsCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let stats = services.logs.stats().await?;
        if self.json {
            return print_json(&stats);
        }

        println!("📊 Activity log: {} entries", stats.total);
        println!("   By type:");
        for (kind, count) in &stats.by_type {
            println!("      {kind:?}: {count}");
        }
        println!("   By severity:");
        for (severity, count) in &stats.by_severity {
            println!("      {severity:?}: {count}");
        }
        println!("   By error type:");
        for (error_type, count) in &stats.by_error_type {
            println!("      {error_type:?}: {count}");
        }
        Ok(())
    }
}

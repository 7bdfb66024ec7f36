use anyhow::Result;

use super::{print_json, print_page_footer, Command, Services};
use crate::config::config;
use crate::services::{UserQuery, UserService};

pub struct UsersCommand {
    pub query: UserQuery,
    pub json: bool,
}

impl Command for UsersCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let query = UserQuery {
            page_size: services.page_size,
            ..self.query.clone()
        };
        let page = services.users.list(query).await?;
        if self.json {
            return print_json(&page);
        }

        if page.data.is_empty() {
            println!("📋 No users match these filters");
            return Ok(());
        }
        println!("👥 Users:");
        for user in &page.data {
            let active = if user.is_active { "active" } else { "inactive" };
            let verified = if user.is_verified { "✅" } else { "⏳" };
            println!(
                "   {} {} │ {} │ {} │ {:?} │ {}",
                verified, user.id, user.name, user.email, user.role, active
            );
        }
        print_page_footer(&page);
        Ok(())
    }
}

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use super::{print_json, read_form, Command};
use crate::wizard::{self, StepPlan};

pub struct ValidateCommand {
    pub file: PathBuf,
    pub step: usize,
    pub json: bool,
}

impl Command for ValidateCommand {
    async fn execute(&self) -> Result<()> {
        let form = read_form(&self.file)?;
        let plan = StepPlan::for_form(&form);
        let outcome = wizard::validate(self.step, &form);

        if self.json {
            let errors: serde_json::Map<String, serde_json::Value> = outcome
                .errors
                .entries()
                .into_iter()
                .map(|(key, message)| (key, json!(message)))
                .collect();
            return print_json(&json!({
                "step": outcome.step,
                "isValid": outcome.is_valid,
                "errors": errors,
            }));
        }

        let Some(step) = outcome.step else {
            println!(
                "⚠️  Step {} is outside the active plan ({} steps); nothing to check",
                self.step,
                plan.len()
            );
            return Ok(());
        };

        println!("🔍 Validating step {} of {}: {}", self.step + 1, plan.len(), step.title());
        if outcome.is_valid {
            println!("✅ All required answers are present");
        } else {
            println!("❌ {} problem(s) found:", outcome.errors.count());
            for (key, message) in outcome.errors.entries() {
                println!("   • {key}: {message}");
            }
        }
        Ok(())
    }
}

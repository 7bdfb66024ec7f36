use std::path::PathBuf;

use anyhow::{bail, Result};
use serde_json::json;

use super::{print_json, read_form, Command, Services};
use crate::config::config;
use crate::wizard::{ReportSummary, StepOutcome, Wizard};

pub struct FillCommand {
    pub file: PathBuf,
    pub submit: bool,
    pub json: bool,
}

impl Command for FillCommand {
    async fn execute(&self) -> Result<()> {
        let services = Services::from_config(config()?)?;
        let form = read_form(&self.file)?;
        let mut wizard = Wizard::with_form(services.submitter(), form);

        if !self.json {
            println!("🧭 Active steps: {}", wizard.active_steps().join(" → "));
        }
        while !wizard.is_final_step() {
            let title = wizard.current_step().map(|s| s.title()).unwrap_or_default();
            match wizard.next() {
                StepOutcome::Advanced { from, .. } => {
                    if !self.json {
                        println!("   ✅ {}. {}", from + 1, title);
                    }
                }
                StepOutcome::Blocked { errors } => {
                    let index = wizard.current_step_index();
                    let entries = wizard.validation_errors().entries();
                    if self.json {
                        let fields: serde_json::Map<String, serde_json::Value> =
                            entries.into_iter().map(|(k, m)| (k, json!(m))).collect();
                        print_json(&json!({
                            "blockedAt": index,
                            "step": wizard.current_step(),
                            "errors": fields,
                        }))?;
                    } else {
                        println!("   ❌ {}. {} ({} problem(s))", index + 1, title, errors);
                        for (key, message) in entries {
                            println!("      • {key}: {message}");
                        }
                    }
                    bail!("step {} ({}) failed validation with {} problem(s)", index + 1, title, errors);
                }
                StepOutcome::Stayed { .. } => break,
            }
        }

        let summary = ReportSummary::from_form(wizard.form_data());
        if self.json {
            let receipt = if self.submit {
                Some(wizard.submit().await?)
            } else {
                None
            };
            return print_json(&json!({ "summary": summary, "receipt": receipt }));
        }

        println!();
        println!("📋 Report summary:");
        for section in &summary.sections {
            println!("   {}", section.title);
            for entry in &section.entries {
                println!("      {}: {}", entry.label, entry.value);
            }
        }
        if let Some(total) = summary.total_fine {
            println!("   💰 Total fine: {total:.2}");
        }

        println!();
        if self.submit {
            let receipt = wizard.submit().await?;
            println!("📨 Submitted as {} (log entry {})", receipt.visit_id, receipt.log_id);
        } else {
            println!("💡 Re-run with --submit to record this report");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(file: PathBuf) -> Result<()> {
        tokio_test::block_on(
            FillCommand {
                file,
                submit: false,
                json: true,
            }
            .execute(),
        )
    }

    #[test]
    fn blocked_step_is_an_error() {
        let path = std::env::temp_dir().join(format!("fill-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"facilityName": "مخبز الأمل"}"#).unwrap();

        let err = fill(path.clone()).unwrap_err();

        assert!(err.to_string().contains("failed validation"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn complete_report_reaches_the_summary() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/report.json");
        assert!(fill(path).is_ok());
    }
}

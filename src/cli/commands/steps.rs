use anyhow::Result;

use super::{print_json, Command};
use crate::wizard::{registry, StepPlan, NO, YES};

pub struct StepsCommand {
    pub violation: bool,
    pub json: bool,
}

impl Command for StepsCommand {
    async fn execute(&self) -> Result<()> {
        let plan = StepPlan::for_answer(Some(if self.violation { YES } else { NO }));
        if self.json {
            return print_json(&plan.steps());
        }

        println!("🧭 Inspection report steps ({}):", plan.len());
        for (index, step) in plan.steps().iter().enumerate() {
            let required = registry::fields_for(*step)
                .iter()
                .filter(|f| !matches!(f.requirement, registry::Requirement::Optional))
                .count();
            println!("   {}. {} [{}] {} required fields", index + 1, step.title(), step, required);
        }
        if !self.violation {
            println!();
            println!("💡 Answer 'نعم' to the violation question to add the violation and fine steps");
        }
        Ok(())
    }
}

// Step sequencer - which steps apply, derived fresh from the form every time

use super::form_state::FormData;
use super::registry::{StepId, YES};

const WITH_VIOLATION: &[StepId] = &[
    StepId::VisitInfo,
    StepId::Devices,
    StepId::Samples,
    StepId::Violations,
    StepId::Fines,
    StepId::Inspectors,
    StepId::Confirmation,
];

const WITHOUT_VIOLATION: &[StepId] = &[
    StepId::VisitInfo,
    StepId::Devices,
    StepId::Samples,
    StepId::Inspectors,
    StepId::Confirmation,
];

/// Ordered steps active for the current answers. Never stored; ask for a new
/// plan whenever the form may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    steps: &'static [StepId],
}

impl StepPlan {
    /// Plan selected by the `hasViolation` answer; anything but "نعم",
    /// including no answer, drops the violation and fine steps.
    pub fn for_answer(has_violation: Option<&str>) -> Self {
        let steps = if has_violation == Some(YES) {
            WITH_VIOLATION
        } else {
            WITHOUT_VIOLATION
        };
        Self { steps }
    }

    pub fn for_form(form: &FormData) -> Self {
        Self::for_answer(form.text("hasViolation"))
    }

    pub fn steps(&self) -> &'static [StepId] {
        self.steps
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.title()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn step_at(&self, index: usize) -> Option<StepId> {
        self.steps.get(index).copied()
    }

    pub fn index_of(&self, step: StepId) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn includes_violation_steps(&self) -> bool {
        self.steps.iter().any(|step| step.requires_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::registry::NO;

    #[test]
    fn violation_answer_selects_seven_steps() {
        let plan = StepPlan::for_answer(Some(YES));
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.step_at(4), Some(StepId::Fines));
        assert_eq!(plan.titles()[3], "المخالفات والإجراءات");
    }

    #[test]
    fn any_other_answer_selects_five_steps() {
        for answer in [None, Some(NO), Some(""), Some("ربما")] {
            let plan = StepPlan::for_answer(answer);
            assert_eq!(plan.len(), 5);
            assert!(!plan.includes_violation_steps());
            assert!((0..10).all(|i| !matches!(
                plan.step_at(i),
                Some(StepId::Violations | StepId::Fines)
            )));
        }
    }

    #[test]
    fn index_mapping_differs_between_plans() {
        let with = StepPlan::for_answer(Some(YES));
        let without = StepPlan::for_answer(None);
        assert_eq!(with.step_at(3), Some(StepId::Violations));
        assert_eq!(without.step_at(3), Some(StepId::Inspectors));
        assert_eq!(without.step_at(5), None);
        assert_eq!(without.last_index(), 4);
        assert_eq!(with.index_of(StepId::Confirmation), Some(6));
    }
}

// Wizard controller - step navigation gated on validation
//
// The editing/reviewing phases live in a statig machine; the form, errors and
// step index live in the session that is handed to every handler as context.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use statig::blocking::StateMachine;
use statig::prelude::*;
use thiserror::Error;

use super::form_state::{FieldValue, FormData, FormState};
use super::registry::{RowColumn, StepId};
use super::sequencer::StepPlan;
use super::validator::{self, ValidationErrors};
use crate::services::{ReportSubmitter, ServiceError, SubmissionReceipt};
use crate::telemetry::{create_wizard_span, generate_correlation_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    Next,
    Previous,
    /// Ask to submit; only honoured while reviewing the final step.
    RequestSubmit,
    /// The submission boundary accepted the report.
    Submitted,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("submit is only available on the final step (at step {index} of {steps})")]
    NotAtFinalStep { index: usize, steps: usize },
    #[error("submission failed: {0}")]
    Submission(#[from] ServiceError),
}

/// What a call to `next()` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Validation failed; the index did not move.
    Blocked { errors: usize },
    /// Validation passed and the index moved forward.
    Advanced { from: usize, to: usize },
    /// Validation passed but there is no further step.
    Stayed { index: usize },
}

impl StepOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, StepOutcome::Blocked { .. })
    }
}

/// Step index that no longer fits the active plan after the branching
/// answer changed mid-wizard. Reported, never corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDesync {
    pub index: usize,
    pub plan_len: usize,
}

/// Mutable data the state machine works on.
#[derive(Debug)]
pub struct WizardSession {
    form: FormState,
    step_index: usize,
    last_outcome: Option<StepOutcome>,
    submission_armed: bool,
}

impl WizardSession {
    fn new(data: FormData) -> Self {
        Self {
            form: FormState::new(data),
            step_index: 0,
            last_outcome: None,
            submission_armed: false,
        }
    }

    fn plan(&self) -> StepPlan {
        StepPlan::for_form(self.form.data())
    }

    fn at_final_step(&self) -> bool {
        self.step_index == self.plan().last_index()
    }

    fn advance(&mut self) -> StepOutcome {
        let outcome = validator::validate(self.step_index, self.form.data());
        let result = if !outcome.is_valid {
            let errors = outcome.errors.count();
            self.form.replace_errors(outcome.errors);
            StepOutcome::Blocked { errors }
        } else {
            self.form.clear_errors();
            let plan = self.plan();
            if self.step_index < plan.last_index() {
                let from = self.step_index;
                self.step_index += 1;
                StepOutcome::Advanced {
                    from,
                    to: self.step_index,
                }
            } else {
                StepOutcome::Stayed {
                    index: self.step_index,
                }
            }
        };
        self.last_outcome = Some(result.clone());
        result
    }

    fn retreat(&mut self) {
        self.step_index = self.step_index.saturating_sub(1);
    }

    fn reset(&mut self) {
        self.form.reset(FormData::initial(Local::now()));
        self.step_index = 0;
        self.submission_armed = false;
    }
}

/// statig machine driving the wizard phases.
#[derive(Debug)]
pub struct WizardFlow {
    wizard_id: String,
}

#[state_machine(initial = "State::editing()")]
impl WizardFlow {
    #[state]
    fn editing(&mut self, context: &mut WizardSession, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Next => match context.advance() {
                StepOutcome::Advanced { to, .. } if context.at_final_step() => {
                    tracing::info!(wizard_id = %self.wizard_id, step = to, "Reached review step");
                    Transition(State::reviewing())
                }
                StepOutcome::Advanced { from, to } => {
                    tracing::info!(wizard_id = %self.wizard_id, from, to, "Advanced to next step");
                    Handled
                }
                StepOutcome::Blocked { errors } => {
                    tracing::info!(
                        wizard_id = %self.wizard_id,
                        step = context.step_index,
                        errors,
                        "Step validation failed"
                    );
                    Handled
                }
                // The plan shrank under the index and left it on the review step.
                StepOutcome::Stayed { index } if context.at_final_step() => {
                    tracing::info!(wizard_id = %self.wizard_id, step = index, "Reached review step");
                    Transition(State::reviewing())
                }
                StepOutcome::Stayed { index } => {
                    tracing::debug!(wizard_id = %self.wizard_id, index, "No step after current index");
                    Handled
                }
            },
            WizardEvent::Previous => {
                context.retreat();
                Handled
            }
            WizardEvent::RequestSubmit | WizardEvent::Submitted => {
                tracing::warn!(
                    wizard_id = %self.wizard_id,
                    step = context.step_index,
                    "Submit requested before reaching the review step"
                );
                Handled
            }
        }
    }

    #[state]
    fn reviewing(&mut self, context: &mut WizardSession, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Next => match context.advance() {
                StepOutcome::Advanced { from, to } if !context.at_final_step() => {
                    tracing::warn!(
                        wizard_id = %self.wizard_id,
                        from,
                        to,
                        "Step plan grew while reviewing"
                    );
                    Transition(State::editing())
                }
                _ => Handled,
            },
            WizardEvent::Previous => {
                context.retreat();
                Transition(State::editing())
            }
            WizardEvent::RequestSubmit => {
                if context.at_final_step() {
                    context.submission_armed = true;
                } else {
                    tracing::warn!(
                        wizard_id = %self.wizard_id,
                        step = context.step_index,
                        plan_len = context.plan().len(),
                        "Submit refused: step plan changed under the review step"
                    );
                }
                Handled
            }
            WizardEvent::Submitted => {
                context.reset();
                tracing::info!(wizard_id = %self.wizard_id, "Report submitted, wizard reset");
                Transition(State::editing())
            }
        }
    }
}

/// Inspection report wizard: form state, navigation and submission.
pub struct Wizard {
    machine: StateMachine<WizardFlow>,
    session: WizardSession,
    submitter: Arc<dyn ReportSubmitter>,
    wizard_id: String,
}

impl Wizard {
    pub fn new(submitter: Arc<dyn ReportSubmitter>) -> Self {
        Self::with_form(submitter, FormData::initial(Local::now()))
    }

    /// Start from previously entered answers (the step index still starts at 0).
    pub fn with_form(submitter: Arc<dyn ReportSubmitter>, data: FormData) -> Self {
        let wizard_id = generate_correlation_id();
        let machine = WizardFlow {
            wizard_id: wizard_id.clone(),
        }
        .state_machine();
        Self {
            machine,
            session: WizardSession::new(data),
            submitter,
            wizard_id,
        }
    }

    pub fn id(&self) -> &str {
        &self.wizard_id
    }

    pub fn plan(&self) -> StepPlan {
        self.session.plan()
    }

    pub fn active_steps(&self) -> Vec<&'static str> {
        self.plan().titles()
    }

    pub fn current_step_index(&self) -> usize {
        self.session.step_index
    }

    pub fn current_step(&self) -> Option<StepId> {
        self.plan().step_at(self.session.step_index)
    }

    pub fn is_final_step(&self) -> bool {
        self.session.at_final_step()
    }

    pub fn form_data(&self) -> &FormData {
        self.session.form.data()
    }

    pub fn validation_errors(&self) -> &ValidationErrors {
        self.session.form.errors()
    }

    pub fn plan_desync(&self) -> Option<PlanDesync> {
        let plan_len = self.plan().len();
        (self.session.step_index >= plan_len).then_some(PlanDesync {
            index: self.session.step_index,
            plan_len,
        })
    }

    pub fn update_form_data(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.session.form.update_form_data(field, value);
        if let Some(desync) = self.plan_desync() {
            tracing::warn!(
                wizard_id = %self.wizard_id,
                field = %field,
                index = desync.index,
                plan_len = desync.plan_len,
                "Step index is outside the active step plan"
            );
        }
    }

    pub fn set_has_devices(&mut self, answer: &str) {
        self.session.form.set_has_devices(answer);
    }

    pub fn set_device_count(&mut self, raw: &str) {
        self.session.form.set_device_count(raw);
    }

    pub fn add_device(&mut self) {
        self.session.form.add_device();
    }

    pub fn remove_device(&mut self, index: usize) {
        self.session.form.remove_device(index);
    }

    pub fn update_device(&mut self, index: usize, column: RowColumn, value: impl Into<String>) {
        self.session.form.update_device(index, column, value);
    }

    pub fn set_has_samples(&mut self, answer: &str) {
        self.session.form.set_has_samples(answer);
    }

    pub fn set_sample_count(&mut self, raw: &str) {
        self.session.form.set_sample_count(raw);
    }

    pub fn add_sample(&mut self) {
        self.session.form.add_sample();
    }

    pub fn remove_sample(&mut self, index: usize) {
        self.session.form.remove_sample(index);
    }

    pub fn update_sample(&mut self, index: usize, column: RowColumn, value: impl Into<String>) {
        self.session.form.update_sample(index, column, value);
    }

    /// Validate the current step and move forward when it passes.
    pub fn next(&mut self) -> StepOutcome {
        let span = create_wizard_span("next", &self.wizard_id, self.session.step_index);
        let _guard = span.enter();
        self.machine
            .handle_with_context(&WizardEvent::Next, &mut self.session);
        self.session
            .last_outcome
            .take()
            .unwrap_or(StepOutcome::Stayed {
                index: self.session.step_index,
            })
    }

    /// Go back one step without validating.
    pub fn previous(&mut self) {
        self.machine
            .handle_with_context(&WizardEvent::Previous, &mut self.session);
    }

    /// Send the report to the submission boundary and reset on success.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, WizardError> {
        let index = self.session.step_index;
        self.machine
            .handle_with_context(&WizardEvent::RequestSubmit, &mut self.session);
        if !std::mem::take(&mut self.session.submission_armed) {
            return Err(WizardError::NotAtFinalStep {
                index,
                steps: self.plan().len(),
            });
        }

        let span = create_wizard_span("submit", &self.wizard_id, index);
        let receipt = {
            let _guard = span.enter();
            tracing::info!(fields = self.session.form.data().len(), "Submitting inspection report");
            self.submitter.submit(self.session.form.data())
        }
        .await
        .map_err(|e| {
            tracing::error!(wizard_id = %self.wizard_id, error = %e, "Report submission failed");
            WizardError::from(e)
        })?;

        self.machine
            .handle_with_context(&WizardEvent::Submitted, &mut self.session);
        Ok(receipt)
    }
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("wizard_id", &self.wizard_id)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::registry::{NO, YES};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        reports: Mutex<Vec<FormData>>,
        fail: bool,
    }

    #[async_trait]
    impl ReportSubmitter for RecordingSubmitter {
        async fn submit(&self, report: &FormData) -> Result<SubmissionReceipt, ServiceError> {
            if self.fail {
                return Err(ServiceError::Unavailable("simulated outage".into()));
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(SubmissionReceipt {
                visit_id: "VISIT-0001".into(),
                log_id: "1".into(),
            })
        }
    }

    fn wizard() -> Wizard {
        Wizard::new(Arc::new(RecordingSubmitter::default()))
    }

    #[test]
    fn starts_with_timestamp_only() {
        let wizard = wizard();
        assert_eq!(wizard.current_step_index(), 0);
        assert_eq!(wizard.form_data().len(), 1);
        assert!(wizard.form_data().is_filled("visitDateTime"));
        assert_eq!(wizard.active_steps().len(), 5);
    }

    #[test]
    fn failed_next_keeps_index_and_records_errors() {
        let mut wizard = wizard();
        let outcome = wizard.next();
        assert_eq!(outcome, StepOutcome::Blocked { errors: 16 });
        assert_eq!(wizard.current_step_index(), 0);
        assert_eq!(wizard.validation_errors().count(), 16);

        wizard.update_form_data("facilityName", "مصنع الأمل");
        assert_eq!(wizard.validation_errors().count(), 15);
    }

    #[test]
    fn previous_is_a_no_op_at_first_step() {
        let mut wizard = wizard();
        wizard.previous();
        assert_eq!(wizard.current_step_index(), 0);
    }

    #[test]
    fn toggling_violation_changes_plan_without_moving() {
        let mut wizard = wizard();
        wizard.update_form_data("hasViolation", YES);
        assert_eq!(wizard.active_steps().len(), 7);
        wizard.update_form_data("hasViolation", NO);
        assert_eq!(wizard.active_steps().len(), 5);
        assert_eq!(wizard.current_step_index(), 0);
        assert!(wizard.plan_desync().is_none());
    }

    #[tokio::test]
    async fn submit_before_review_is_refused() {
        let mut wizard = wizard();
        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, WizardError::NotAtFinalStep { index: 0, steps: 5 }));
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_report() {
        let submitter = Arc::new(RecordingSubmitter {
            fail: true,
            ..Default::default()
        });
        let mut wizard = Wizard::new(submitter);
        // start on the inspectors step of the five-step plan
        wizard.session.step_index = 3;
        wizard.update_form_data("mainInspectorName", "أحمد");
        wizard.update_form_data("mainInspectorTitle", "مفتش");
        wizard.update_form_data("hasAssistantInspector", NO);
        assert!(matches!(wizard.next(), StepOutcome::Advanced { from: 3, to: 4 }));

        let err = wizard.submit().await.unwrap_err();
        assert!(matches!(err, WizardError::Submission(ServiceError::Unavailable(_))));
        assert_eq!(wizard.current_step_index(), 4);
        assert!(wizard.form_data().is_filled("mainInspectorName"));
    }
}

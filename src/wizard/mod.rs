// Inspection report wizard
//
// registry -> form_state -> sequencer/validator -> controller, with the
// review summary built from the same registry.

pub mod controller;
pub mod form_state;
pub mod registry;
pub mod sequencer;
pub mod summary;
pub mod validator;

pub use controller::{PlanDesync, StepOutcome, Wizard, WizardError, WizardEvent, WizardFlow};
pub use form_state::{DeviceRecord, FieldValue, FormData, FormDataError, FormState, SampleRecord};
pub use registry::{
    FieldDef, FieldKind, Requirement, RowColumn, RowList, StepId, CODE_NOT_FOUND, MAX_ROWS, NO, YES,
};
pub use sequencer::StepPlan;
pub use summary::{ReportSummary, SummaryEntry, SummarySection};
pub use validator::{
    validate, validate_step, ErrorLocation, FieldError, RowError, ValidationErrors, ValidationOutcome,
};

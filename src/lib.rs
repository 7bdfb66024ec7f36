// Inspection Wizard Library - multi-step field inspection reports
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod services;
pub mod telemetry;
pub mod wizard;

// Re-export key types for easy access
pub use crate::config::{config, init_config, InspectionWizardConfig};
pub use services::{
    MockSubmissionService, Page, ReportSubmitter, ServiceError, SubmissionReceipt,
};
pub use telemetry::{create_wizard_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use wizard::{
    FieldValue, FormData, FormState, ReportSummary, StepId, StepOutcome, StepPlan, ValidationErrors,
    Wizard, WizardError,
};

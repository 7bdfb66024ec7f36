use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::services::{LogErrorType, LogType};

pub mod commands;

#[derive(Parser)]
#[command(name = "inspection-wizard")]
#[command(about = "Field inspection reports and the back-office records around them")]
#[command(long_about = "Walks an inspection report through its steps, validating each one before \
                       moving on, and browses the visits, inspectors, users and activity log kept \
                       by the in-memory services.")]
pub struct Cli {
    /// Print results as JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the steps the wizard will walk through
    Steps {
        /// Plan for a report that records a violation
        #[arg(long, help = "Include the violation and fine steps")]
        violation: bool,
    },
    /// Validate one step of a report stored as JSON
    Validate {
        /// Path to a JSON object of field answers
        file: PathBuf,
        /// Zero-based step index within the active plan
        #[arg(long, default_value = "0")]
        step: usize,
    },
    /// Drive a stored report through the wizard, stopping at the first failing step
    Fill {
        /// Path to a JSON object of field answers
        file: PathBuf,
        /// Submit the report once the final step is reached
        #[arg(long)]
        submit: bool,
    },
    /// List inspection visits
    Visits {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        compliance: Option<String>,
        /// Earliest visit date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest visit date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// List archived visits instead of active ones
        #[arg(long)]
        archived: bool,
        /// Only visits led by the configured current inspector
        #[arg(long)]
        mine: bool,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show a single visit
    Visit {
        id: String,
        /// Archive the visit
        #[arg(long, conflicts_with = "unarchive")]
        archive: bool,
        /// Restore an archived visit
        #[arg(long)]
        unarchive: bool,
    },
    /// List inspectors
    Inspectors {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        specialization: Option<String>,
        /// Filter by active flag
        #[arg(long)]
        active: Option<bool>,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// List system users
    Users {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        active_only: bool,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// List activity log entries
    Logs {
        /// UserCreated, FormSubmitted or Error
        #[arg(long = "type")]
        kind: Option<LogType>,
        /// Validation, Network, Server or Unknown
        #[arg(long)]
        error_type: Option<LogErrorType>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Activity log totals by type, severity and error type
    LogStats,
    /// Headline figures and breakdowns over recorded inspections
    Dashboard,
}

use anyhow::Result;
use clap::Parser;

use inspection_wizard::cli::commands::dashboard::DashboardCommand;
use inspection_wizard::cli::commands::fill::FillCommand;
use inspection_wizard::cli::commands::inspectors::InspectorsCommand;
use inspection_wizard::cli::commands::logs::{LogStatsCommand, LogsCommand};
use inspection_wizard::cli::commands::steps::StepsCommand;
use inspection_wizard::cli::commands::users::UsersCommand;
use inspection_wizard::cli::commands::validate::ValidateCommand;
use inspection_wizard::cli::commands::visits::{VisitCommand, VisitsCommand};
use inspection_wizard::cli::commands::Command;
use inspection_wizard::cli::{Cli, Commands};
use inspection_wizard::config::InspectionWizardConfig;
use inspection_wizard::services::{InspectorQuery, LogQuery, UserQuery, VisitQuery};
use inspection_wizard::{init_config, init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = InspectionWizardConfig::load_env_file();
    let config = init_config()?;
    init_telemetry(&config.observability)?;

    let json = cli.json;
    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            None => StepsCommand { violation: false, json }.execute().await,
            Some(Commands::Steps { violation }) => StepsCommand { violation, json }.execute().await,
            Some(Commands::Validate { file, step }) => {
                ValidateCommand { file, step, json }.execute().await
            }
            Some(Commands::Fill { file, submit }) => FillCommand { file, submit, json }.execute().await,
            Some(Commands::Visits {
                search,
                region,
                city,
                sector,
                compliance,
                from,
                to,
                archived,
                mine,
                page,
            }) => {
                let query = VisitQuery {
                    search,
                    from,
                    to,
                    region,
                    city,
                    sector,
                    compliance,
                    archived,
                    assigned_to_me: mine,
                    page,
                    ..Default::default()
                };
                VisitsCommand { query, json }.execute().await
            }
            Some(Commands::Visit {
                id,
                archive,
                unarchive,
            }) => {
                VisitCommand {
                    id,
                    archive,
                    unarchive,
                    json,
                }
                .execute()
                .await
            }
            Some(Commands::Inspectors {
                search,
                region,
                specialization,
                active,
                page,
            }) => {
                let query = InspectorQuery {
                    search,
                    region,
                    specialization,
                    active,
                    page,
                    ..Default::default()
                };
                InspectorsCommand { query, json }.execute().await
            }
            Some(Commands::Users {
                search,
                active_only,
                page,
            }) => {
                let query = UserQuery {
                    search,
                    active_only,
                    page,
                    ..Default::default()
                };
                UsersCommand { query, json }.execute().await
            }
            Some(Commands::Logs {
                kind,
                error_type,
                search,
                from,
                to,
                page,
            }) => {
                let query = LogQuery {
                    kind,
                    error_type,
                    from,
                    to,
                    search,
                    page,
                    ..Default::default()
                };
                LogsCommand { query, json }.execute().await
            }
            Some(Commands::LogStats) => LogStatsCommand { json }.execute().await,
            Some(Commands::Dashboard) => DashboardCommand { json }.execute().await,
        }
    });

    shutdown_telemetry();
    result
}

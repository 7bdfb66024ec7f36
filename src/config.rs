use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "inspection-wizard.toml";
pub const ENV_PREFIX: &str = "INSPECTION_WIZARD";

/// Main configuration structure for the inspection wizard
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InspectionWizardConfig {
    /// In-memory service settings
    pub services: ServicesConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Wizard settings
    pub wizard: WizardConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServicesConfig {
    /// Delay every service call to mimic a network round trip
    pub simulate_latency: bool,
    /// Simulated delay in milliseconds
    pub latency_ms: u64,
    /// Default page size for listings
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON log lines instead of human readable ones
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WizardConfig {
    /// Inspector treated as "me" by the assigned-to-me visit filter
    pub current_inspector_name: String,
}

impl Default for InspectionWizardConfig {
    fn default() -> Self {
        Self {
            services: ServicesConfig {
                simulate_latency: false,
                latency_ms: 500,
                page_size: 10,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            wizard: WizardConfig {
                current_inspector_name: "أحمد محمد السالم".to_string(),
            },
        }
    }
}

impl InspectionWizardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (inspection-wizard.toml)
    /// 3. Environment variables (INSPECTION_WIZARD__SECTION__KEY)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&InspectionWizardConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<InspectionWizardConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = InspectionWizardConfig::load_env_file();
        InspectionWizardConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static InspectionWizardConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<&'static InspectionWizardConfig> {
    let config = config()?;
    tracing::info!(
        latency = config.services.simulate_latency,
        page_size = config.services.page_size,
        "Configuration loaded successfully"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let loaded = InspectionWizardConfig::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(loaded.services.page_size, 10);
        assert!(!loaded.services.simulate_latency);
    }

    #[test]
    fn file_overrides_defaults_and_round_trips() {
        let dir = std::env::temp_dir().join(format!("inspection-wizard-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("inspection-wizard.toml");

        let mut custom = InspectionWizardConfig::default();
        custom.services.page_size = 25;
        custom.wizard.current_inspector_name = "فهد سعد الغامدي".to_string();
        custom.save_to_file(&path).unwrap();

        let loaded = InspectionWizardConfig::load_from(&path).unwrap();
        assert_eq!(loaded, custom);
        std::fs::remove_dir_all(dir).ok();
    }
}

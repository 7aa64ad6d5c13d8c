//! Application configuration module
//!
//! Configuration is layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then environment variables with the `CAMPAIGN_OPT`
//! prefix and `__` between nested keys. A `.env` file is loaded first when
//! present.
//!
//! - `CAMPAIGN_OPT__CAMPAIGN__BUDGET=5000` -> `campaign.budget = 5000`
//! - `CAMPAIGN_OPT__OPTIMISATION__SOLVER=cbc` -> `optimisation.solver = "cbc"`
//!
//! The loaded [`AppConfig`] is passed explicitly into the pipeline and the
//! HTTP service; nothing reads configuration from global state.

mod error;
mod io;
mod optimisation;
mod server;

pub use error::{ConfigError, ValidationError};
pub use io::{InputConfig, InputSource, OutputConfig, OutputDestination, TrackingConfig};
pub use optimisation::{FallbackExecutables, OptimisationConfig, SolverOptions, SolverOptionsTable};
pub use server::{LoggingConfig, ServerConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::records::CampaignTargets;

const ENV_PREFIX: &str = "CAMPAIGN_OPT";
const DEFAULT_FILE: &str = "campaign-opt";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub campaign: CampaignConfig,

    #[serde(default)]
    pub optimisation: OptimisationConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Campaign targets used when a request does not override them
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CampaignConfig {
    #[serde(default = "default_budget")]
    pub budget: f64,

    /// Minimum ROI in percent; `120` means a 20% hurdle rate
    #[serde(default = "default_min_roi_percent")]
    pub min_roi_percent: f64,
}

impl CampaignConfig {
    pub fn targets(&self) -> CampaignTargets {
        CampaignTargets {
            budget: self.budget,
            min_roi_percent: self.min_roi_percent,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(ValidationError::InvalidBudget(self.budget));
        }
        if !self.min_roi_percent.is_finite() || self.min_roi_percent < 0.0 {
            return Err(ValidationError::InvalidMinRoi(self.min_roi_percent));
        }
        Ok(())
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            min_roi_percent: default_min_roi_percent(),
        }
    }
}

fn default_budget() -> f64 {
    200.0
}

fn default_min_roi_percent() -> f64 {
    120.0
}

impl AppConfig {
    /// Load configuration.
    ///
    /// With `path`, that TOML file must exist. Without it, `campaign-opt.toml`
    /// in the working directory is read when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or a value cannot be
    /// parsed into its expected type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.campaign.validate()?;
        self.optimisation.validate()?;
        self.server.validate()?;
        self.logging.validate()?;
        if self.input.tables.cluster.trim().is_empty() {
            return Err(ValidationError::MissingRequired("input.tables.cluster"));
        }
        if self.tracking.enabled && self.tracking.experiment.trim().is_empty() {
            return Err(ValidationError::MissingRequired("tracking.experiment"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SolverBackend;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use testresult::TestResult;

    // Environment variables are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.campaign.targets().min_roi_percent, 120.0);
        assert_eq!(config.output.destination, OutputDestination::Csv);
        assert!(!config.tracking.enabled);
    }

    #[test]
    fn loads_toml_file_over_defaults() -> TestResult {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
[campaign]
budget = 2000

[optimisation]
solver = "glpk"

[optimisation.executables]
glpk = "/usr/local/bin/glpsol"

[output]
destination = "none"
"#
        )?;

        let config = AppConfig::load(Some(file.path()))?;

        assert_eq!(config.campaign.budget, 2000.0);
        assert_eq!(config.campaign.min_roi_percent, 120.0);
        assert_eq!(config.optimisation.solver, SolverBackend::Glpk);
        assert_eq!(
            config.optimisation.fallback_for(SolverBackend::Glpk),
            Some(Path::new("/usr/local/bin/glpsol"))
        );
        assert_eq!(config.output.destination, OutputDestination::None);
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> TestResult {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[server]\nport = 3000")?;

        env::set_var("CAMPAIGN_OPT__SERVER__PORT", "8081");
        let result = AppConfig::load(Some(file.path()));
        env::remove_var("CAMPAIGN_OPT__SERVER__PORT");

        assert_eq!(result?.server.port, 8081);
        Ok(())
    }

    #[test]
    fn missing_explicit_file_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let result = AppConfig::load(Some(Path::new("/nonexistent/campaign.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn negative_budget_is_rejected() {
        let mut config = AppConfig::default();
        config.campaign.budget = -1.0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidBudget(-1.0)));
    }
}

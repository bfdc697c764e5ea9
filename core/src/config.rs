//! Configuration loading
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. a config file (`ruleflow.toml` in the working directory, or an explicit path)
//! 3. `RULEFLOW_*` environment variables, with `__` between section and key
//!    (`RULEFLOW_ENGINE__INPUT_BINDING=order`)
//! 4. explicit overrides set on the builder

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::expression::semantic_validator::is_valid_binding;
use crate::expression::Interpreter;

const DEFAULT_CONFIG_FILE: &str = "ruleflow";
const ENV_PREFIX: &str = "RULEFLOW";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Identifier through which expressions see the input
    #[serde(default = "default_input_binding")]
    pub input_binding: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_input_binding() -> String {
    Interpreter::DEFAULT_BINDING.to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            input_binding: default_input_binding(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    input_binding: Option<String>,
    log_filter: Option<String>,
}

impl ConfigBuilder {
    /// Read this file instead of searching for `ruleflow.toml`; the file must exist
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn input_binding(mut self, binding: Option<String>) -> Self {
        self.input_binding = binding;
        self
    }

    pub fn log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let file = match &self.config_path {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Config = config::Config::builder()
            .set_default("engine.input_binding", default_input_binding())?
            .set_default("logging.filter", default_log_filter())?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("engine.input_binding", self.input_binding)?
            .set_override_option("logging.filter", self.log_filter)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_binding(&self.engine.input_binding) {
            return Err(ConfigError::Message(format!(
                "engine.input_binding '{}' is not a valid identifier",
                self.engine.input_binding
            )));
        }
        Ok(())
    }
}

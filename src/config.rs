use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

use crate::returns::{EligibilityRules, OrderStatus};

/// Main configuration structure for the return workflow
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReturnWorkflowConfig {
    /// Order return service connection
    pub service: ServiceConfig,
    /// Eligibility rules supplied by the order source
    pub eligibility: EligibilityConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL of the order return API
    pub base_url: String,
    /// Bearer token (can be set via env var)
    pub api_token: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// How long a fetched return policy stays cached
    pub policy_cache_ttl_seconds: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EligibilityConfig {
    /// Order statuses that may be returned
    pub returnable_statuses: Vec<OrderStatus>,
}

impl EligibilityConfig {
    pub fn rules(&self) -> EligibilityRules {
        EligibilityRules::new(self.returnable_statuses.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ReturnWorkflowConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://localhost:8080/api".to_string(),
                api_token: None, // Will be read from env var
                timeout_seconds: 10,
                policy_cache_ttl_seconds: 300, // 5 minutes
                rate_limit: RateLimitConfig {
                    requests_per_second: 5,
                    burst_capacity: 10,
                },
            },
            eligibility: EligibilityConfig {
                returnable_statuses: vec![OrderStatus::Delivered, OrderStatus::Completed],
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl ReturnWorkflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (return-workflow.toml, .return-workflow-rc)
    /// 3. Environment variables (prefixed with RETURN_WORKFLOW__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`ReturnWorkflowConfig::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let defaults = Config::try_from(&ReturnWorkflowConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        let toml_path = dir.join("return-workflow.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".return-workflow-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("RETURN_WORKFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut workflow_config: ReturnWorkflowConfig = config.try_deserialize()?;

        if workflow_config.service.api_token.is_none() {
            if let Ok(token) = std::env::var("RETURN_WORKFLOW_API_TOKEN") {
                workflow_config.service.api_token = Some(token);
            }
        }

        Ok(workflow_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Read `.env` from `dir` into the process environment, if there is one
    pub fn load_env_file_from(dir: &Path) -> Result<bool> {
        let path = dir.join(".env");
        if !path.is_file() {
            return Ok(false);
        }
        dotenvy::from_path(&path)?;
        Ok(true)
    }

    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new("."))
    }
}

// Loaded on first use; the error is kept as text so the static stays `Sync`
static CONFIG: LazyLock<Result<ReturnWorkflowConfig, String>> =
    LazyLock::new(|| ReturnWorkflowConfig::load().map_err(|e| format!("{e:#}")));

pub fn config() -> Result<&'static ReturnWorkflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|message| anyhow!("Invalid return workflow configuration: {message}"))
}

/// Startup entry point: `.env` first, so it can feed the env layer
pub fn init_config() -> Result<&'static ReturnWorkflowConfig> {
    ReturnWorkflowConfig::load_env_file()?;
    config()
}

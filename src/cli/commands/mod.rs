use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;

use crate::config::ReturnWorkflowConfig;
use crate::returns::{ItemCondition, LineItemUpdate, OrderReturnService, ReturnPolicy, ValidationError};
use crate::services::HttpOrderReturnService;

pub mod check;
pub mod estimate;
pub mod submit;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// `index:quantity[:condition[:reason]]` from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSelection {
    pub index: usize,
    pub quantity: u32,
    pub condition: Option<ItemCondition>,
    pub reason: Option<String>,
}

impl ItemSelection {
    /// Updates to apply, in order; `default_reason` fills a missing reason
    pub fn updates(&self, default_reason: Option<&str>) -> Vec<LineItemUpdate> {
        let mut updates = vec![LineItemUpdate::ReturnQuantity(self.quantity)];
        if let Some(condition) = self.condition {
            updates.push(LineItemUpdate::Condition(condition));
        }
        if let Some(reason) = self.reason.as_deref().or(default_reason) {
            updates.push(LineItemUpdate::Reason(reason.to_string()));
        }
        updates
    }
}

impl FromStr for ItemSelection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "item".to_string(),
            value: s.to_string(),
        };
        let mut parts = s.splitn(4, ':');
        let index = parts
            .next()
            .and_then(|part| part.trim().parse().ok())
            .ok_or_else(invalid)?;
        let quantity = parts
            .next()
            .and_then(|part| part.trim().parse().ok())
            .ok_or_else(invalid)?;
        let condition = match parts.next().map(str::trim) {
            Some("") | None => None,
            Some(tag) => Some(tag.parse()?),
        };
        let reason = parts
            .next()
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());

        Ok(Self {
            index,
            quantity,
            condition,
            reason,
        })
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn http_service(config: &ReturnWorkflowConfig) -> Result<HttpOrderReturnService> {
    HttpOrderReturnService::new(&config.service).context("Failed to build return service client")
}

/// Policy from a local file, or from the service when no file is given
pub async fn load_policy(path: Option<&Path>, config: &ReturnWorkflowConfig) -> Result<ReturnPolicy> {
    let policy: ReturnPolicy = match path {
        Some(path) => read_json(path)?,
        None => {
            let service = http_service(config)?;
            service
                .get_return_policy()
                .await
                .with_context(|| format!("Failed to fetch return policy from {}", service.base_url()))?
        }
    };
    policy.validate()?;
    Ok(policy)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

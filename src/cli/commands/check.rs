use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use super::{http_service, load_policy, print_json, read_json, Command};
use crate::config::ReturnWorkflowConfig;
use crate::returns::{check_eligibility, EligibilityResult, Order, ReturnWorkflow};

pub struct CheckCommand {
    pub order: PathBuf,
    pub policy: Option<PathBuf>,
    pub now: Option<String>,
    pub json: bool,
    pub config: ReturnWorkflowConfig,
}

impl CheckCommand {
    fn evaluation_time(&self) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(now) => Ok(DateTime::parse_from_rfc3339(now)
                .with_context(|| format!("Invalid --now timestamp '{now}'"))?
                .with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }

    /// Local rules only when a policy file is given, otherwise the full service-backed check
    async fn eligibility(&self, order: Order, now: DateTime<Utc>) -> Result<EligibilityResult> {
        if self.policy.is_some() {
            let policy = load_policy(self.policy.as_deref(), &self.config).await?;
            let rules = self.config.eligibility.rules();
            return Ok(check_eligibility(&order, &policy, &rules, now));
        }

        let service = Arc::new(http_service(&self.config)?);
        let workflow = ReturnWorkflow::new(service, self.config.eligibility.rules());
        let eligibility = workflow.open_at(order, now).await?;
        workflow.cancel().await;
        Ok(eligibility)
    }
}

impl Command for CheckCommand {
    async fn execute(&self) -> Result<()> {
        let order: Order = read_json(&self.order)?;
        let now = self.evaluation_time()?;
        let order_id = order.id.clone();
        let eligibility = self.eligibility(order, now).await?;

        if self.json {
            return print_json(&eligibility);
        }

        match &eligibility.reason {
            None if eligibility.can_return => {
                println!("✅ Order {order_id} is eligible for return");
            }
            Some(reason) => {
                println!("❌ Order {order_id} cannot be returned");
                println!("   {reason}");
            }
            None => println!("❌ Order {order_id} cannot be returned"),
        }
        Ok(())
    }
}

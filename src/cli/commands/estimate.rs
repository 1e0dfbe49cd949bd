use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::{load_policy, print_json, read_json, Command, ItemSelection};
use crate::config::ReturnWorkflowConfig;
use crate::returns::{
    compute_estimated_refund, initialize_line_items, update_line_item, LineItemUpdate, Order,
    RefundEstimate, ReturnLineItem, ReturnPolicy, ValidationError,
};

pub struct EstimateCommand {
    pub order: PathBuf,
    pub policy: Option<PathBuf>,
    pub reason: Option<String>,
    pub items: Vec<ItemSelection>,
    pub json: bool,
    pub config: ReturnWorkflowConfig,
}

#[derive(Serialize)]
struct EstimateReport<'a> {
    order_id: &'a str,
    items: &'a [ReturnLineItem],
    estimate: &'a RefundEstimate,
}

/// Apply command-line selections the same way the workflow applies edits
pub fn apply_selections(
    policy: &ReturnPolicy,
    mut items: Vec<ReturnLineItem>,
    selections: &[ItemSelection],
    default_reason: Option<&str>,
) -> Result<Vec<ReturnLineItem>, ValidationError> {
    for selection in selections {
        for update in selection.updates(default_reason) {
            if let LineItemUpdate::Reason(reason) = &update {
                if !policy.allows_reason(reason) {
                    return Err(ValidationError::UnknownReason {
                        value: reason.clone(),
                    });
                }
            }
            items = update_line_item(&items, selection.index, &update)?;
        }
    }
    Ok(items)
}

impl Command for EstimateCommand {
    async fn execute(&self) -> Result<()> {
        let order: Order = read_json(&self.order)?;
        let policy = load_policy(self.policy.as_deref(), &self.config).await?;

        let items = apply_selections(
            &policy,
            initialize_line_items(&order),
            &self.items,
            self.reason.as_deref(),
        )?;
        let estimate = compute_estimated_refund(&items, &policy);

        if self.json {
            return print_json(&EstimateReport {
                order_id: &order.id,
                items: &items,
                estimate: &estimate,
            });
        }

        println!("🧾 Refund estimate for order {}", order.id);
        for (index, item) in items.iter().enumerate() {
            let marker = if item.contributes() { "✔" } else { " " };
            println!(
                "  {marker} [{index}] {} x{}/{} ({}) {}",
                item.product_name,
                item.return_quantity,
                item.original_quantity,
                item.condition,
                if item.reason.is_empty() { "-" } else { item.reason.as_str() },
            );
        }
        println!("💰 Estimated refund: {:.2}", estimate.amount);
        for warning in &estimate.warnings {
            println!("⚠️  {warning}");
        }
        Ok(())
    }
}

use anyhow::{bail, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use super::{http_service, print_json, read_json, Command, ItemSelection};
use crate::config::ReturnWorkflowConfig;
use crate::returns::{DraftDetails, LineItemUpdate, Order, RefundEstimate, ReturnWorkflow};

pub struct SubmitCommand {
    pub order: PathBuf,
    pub reason: String,
    pub items: Vec<ItemSelection>,
    pub description: String,
    pub notes: String,
    pub json: bool,
    pub config: ReturnWorkflowConfig,
}

impl SubmitCommand {
    /// Walk the wizard from eligibility to confirmation and submit
    pub async fn run(
        &self,
        workflow: &ReturnWorkflow,
        order: Order,
    ) -> Result<(String, Option<RefundEstimate>)> {
        let eligibility = workflow.open(order).await?;
        if !eligibility.can_return {
            let reason = eligibility
                .reason
                .map(|reason| reason.to_string())
                .unwrap_or_else(|| "not eligible".to_string());
            workflow.cancel().await;
            bail!("Order cannot be returned: {reason}");
        }
        workflow.advance().await?;

        for selection in &self.items {
            for update in selection.updates(Some(&self.reason)) {
                workflow.update_item(selection.index, update).await?;
            }
        }
        // items not named on the command line are not returned
        let selected: Vec<usize> = self.items.iter().map(|selection| selection.index).collect();
        let count = workflow.line_items().await.len();
        for index in (0..count).filter(|index| !selected.contains(index)) {
            workflow
                .update_item(index, LineItemUpdate::ReturnQuantity(0))
                .await?;
        }
        workflow.advance().await?;

        workflow
            .update_details(DraftDetails {
                primary_reason: Some(self.reason.clone()),
                description: Some(self.description.clone()),
                customer_notes: Some(self.notes.clone()),
            })
            .await?;
        let estimate = workflow.estimated_refund().await;

        match workflow.submit().await {
            Ok(receipt) => Ok((receipt.return_id, estimate)),
            Err(e) => {
                workflow.cancel().await;
                Err(e.into())
            }
        }
    }
}

impl Command for SubmitCommand {
    async fn execute(&self) -> Result<()> {
        let order: Order = read_json(&self.order)?;
        let order_id = order.id.clone();
        let service = Arc::new(http_service(&self.config)?);
        let workflow = ReturnWorkflow::new(service, self.config.eligibility.rules());

        if !self.json {
            println!("📦 Submitting return request for order {order_id}...");
        }
        let (return_id, estimate) = self.run(&workflow, order).await?;

        if self.json {
            return print_json(&json!({
                "orderId": order_id,
                "returnId": return_id,
                "estimatedRefund": estimate.as_ref().map(|estimate| estimate.amount),
                "correlationId": workflow.correlation_id(),
            }));
        }
        println!("✅ Return request submitted");
        println!("   Return ID: {return_id}");
        if let Some(estimate) = estimate {
            println!("💰 Estimated refund: {:.2}", estimate.amount);
        }
        Ok(())
    }
}

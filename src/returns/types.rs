// Core types for the return request workflow

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;

/// Lifecycle status of an order as reported by the order source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
    Returned,
    PartiallyReturned,
}

impl OrderStatus {
    /// The order has not reached the customer yet
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Shipped
        )
    }

    /// A return has already been recorded against the order
    pub fn is_returned(&self) -> bool {
        matches!(self, OrderStatus::Returned | OrderStatus::PartiallyReturned)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
            OrderStatus::PartiallyReturned => "partially_returned",
        };
        f.write_str(tag)
    }
}

/// A single line of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Reference data for the order being returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    /// Delivery or completion time; absent until the order completes
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
}

/// Physical state of a returned item, drives the refund percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    Unopened,
    Opened,
    Damaged,
    Expired,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 4] = [
        ItemCondition::Unopened,
        ItemCondition::Opened,
        ItemCondition::Damaged,
        ItemCondition::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::Unopened => "unopened",
            ItemCondition::Opened => "opened",
            ItemCondition::Damaged => "damaged",
            ItemCondition::Expired => "expired",
        }
    }
}

impl Default for ItemCondition {
    fn default() -> Self {
        ItemCondition::Unopened
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCondition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemCondition::ALL
            .into_iter()
            .find(|condition| condition.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownCondition {
                value: s.to_string(),
            })
    }
}

/// Return rules loaded once per workflow invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPolicy {
    pub max_return_days: u32,
    /// Refund percentage (0-100) by condition
    pub refund_percentages: BTreeMap<ItemCondition, Decimal>,
    pub allowed_reasons: Vec<String>,
}

impl ReturnPolicy {
    pub fn refund_percentage(&self, condition: ItemCondition) -> Option<Decimal> {
        self.refund_percentages.get(&condition).copied()
    }

    pub fn allows_reason(&self, reason: &str) -> bool {
        self.allowed_reasons.iter().any(|allowed| allowed == reason)
    }

    /// Reject policies the refund calculation cannot work with
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.allowed_reasons.is_empty() {
            return Err(ValidationError::InvalidPolicy {
                reason: "no return reasons are allowed".to_string(),
            });
        }
        for (condition, percentage) in &self.refund_percentages {
            if *percentage < Decimal::ZERO || *percentage > Decimal::ONE_HUNDRED {
                return Err(ValidationError::InvalidPolicy {
                    reason: format!("refund percentage for {condition} is {percentage}, expected 0-100"),
                });
            }
        }
        Ok(())
    }
}

/// Why an order cannot be returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IneligibilityReason {
    WindowExpired { elapsed_days: i64, max_days: u32 },
    NotYetCompleted { status: OrderStatus },
    AlreadyReturned,
    Cancelled,
    StatusNotReturnable { status: OrderStatus },
    RejectedByService { message: String },
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibilityReason::WindowExpired { elapsed_days, max_days } => write!(
                f,
                "The return window has expired: the order was completed {elapsed_days} days ago and returns are accepted for {max_days} days"
            ),
            IneligibilityReason::NotYetCompleted { status } => write!(
                f,
                "The order has not been completed yet (status: {status})"
            ),
            IneligibilityReason::AlreadyReturned => {
                write!(f, "A return has already been requested for this order")
            }
            IneligibilityReason::Cancelled => write!(f, "The order was cancelled"),
            IneligibilityReason::StatusNotReturnable { status } => {
                write!(f, "Orders with status {status} cannot be returned")
            }
            IneligibilityReason::RejectedByService { message } => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub can_return: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<IneligibilityReason>,
}

impl EligibilityResult {
    pub fn eligible() -> Self {
        Self {
            can_return: true,
            reason: None,
        }
    }

    pub fn ineligible(reason: IneligibilityReason) -> Self {
        Self {
            can_return: false,
            reason: Some(reason),
        }
    }
}

/// One selectable line of the return request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLineItem {
    pub order_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub original_quantity: u32,
    pub return_quantity: u32,
    pub condition: ItemCondition,
    pub reason: String,
    pub unit_price: Decimal,
}

impl ReturnLineItem {
    /// Counts toward the refund and the submission payload
    pub fn contributes(&self) -> bool {
        self.return_quantity > 0 && !self.reason.is_empty()
    }
}

/// Accumulated state of one workflow invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestDraft {
    pub order: Order,
    pub items: Vec<ReturnLineItem>,
    pub primary_reason: String,
    pub description: String,
    pub customer_notes: String,
}

impl ReturnRequestDraft {
    pub fn new(order: Order, items: Vec<ReturnLineItem>) -> Self {
        Self {
            order,
            items,
            primary_reason: String::new(),
            description: String::new(),
            customer_notes: String::new(),
        }
    }

    pub fn has_contributing_item(&self) -> bool {
        self.items.iter().any(ReturnLineItem::contributes)
    }

    pub fn is_submittable(&self) -> bool {
        self.has_contributing_item() && !self.primary_reason.trim().is_empty()
    }

    pub fn with_items(&self, items: Vec<ReturnLineItem>) -> Self {
        Self {
            items,
            ..self.clone()
        }
    }

    pub fn with_details(&self, details: &DraftDetails) -> Self {
        let mut next = self.clone();
        if let Some(primary_reason) = &details.primary_reason {
            next.primary_reason = primary_reason.clone();
        }
        if let Some(description) = &details.description {
            next.description = description.clone();
        }
        if let Some(customer_notes) = &details.customer_notes {
            next.customer_notes = customer_notes.clone();
        }
        next
    }
}

/// Partial update of the free-text part of the draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDetails {
    pub primary_reason: Option<String>,
    pub description: Option<String>,
    pub customer_notes: Option<String>,
}

/// Per-item part of the submission payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemRequest {
    pub order_item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub reason: String,
    pub condition: ItemCondition,
}

/// Payload sent to the return submission service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSubmission {
    pub order_id: String,
    pub customer_id: String,
    pub reason: String,
    pub description: String,
    pub items: Vec<ReturnItemRequest>,
    pub customer_notes: String,
}

/// Answer of the service-side returnability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnabilityVerdict {
    pub can_return: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Raw answer of the return submission service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default)]
    pub return_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub return_id: String,
}

/// Steps of the return wizard as seen by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    #[default]
    Idle,
    Eligibility,
    Items,
    Details,
    Confirmation,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStep::Idle => "idle",
            WorkflowStep::Eligibility => "eligibility",
            WorkflowStep::Items => "items",
            WorkflowStep::Details => "details",
            WorkflowStep::Confirmation => "confirmation",
        };
        f.write_str(name)
    }
}

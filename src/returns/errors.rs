use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{IneligibilityReason, ItemCondition, WorkflowStep};

/// Fallback shown when the submission failed for reasons the service did not explain
pub const SUBMISSION_FALLBACK_MESSAGE: &str =
    "Failed to submit the return request. Please try again later.";

/// Invalid field value during an item or detail update
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Return quantity {requested} is outside 0..={original}")]
    QuantityOutOfRange { requested: i64, original: u32 },
    #[error("Unknown item condition '{value}'")]
    UnknownCondition { value: String },
    #[error("Unknown return reason '{value}'")]
    UnknownReason { value: String },
    #[error("No line item at index {index} (draft has {len} items)")]
    NoSuchItem { index: usize, len: usize },
    #[error("Unknown line item field '{field}'")]
    UnknownField { field: String },
    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },
    #[error("Invalid return policy: {reason}")]
    InvalidPolicy { reason: String },
}

/// A line item the refund calculation had to treat as contributing nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataInconsistencyWarning {
    MissingRefundPercentage {
        order_item_id: String,
        condition: ItemCondition,
    },
    RefundPercentageOutOfRange {
        order_item_id: String,
        condition: ItemCondition,
        percentage: Decimal,
    },
    NegativeUnitPrice {
        order_item_id: String,
        unit_price: Decimal,
    },
    AmountOverflow {
        order_item_id: String,
    },
}

impl std::fmt::Display for DataInconsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataInconsistencyWarning::MissingRefundPercentage {
                order_item_id,
                condition,
            } => write!(
                f,
                "item {order_item_id}: policy has no refund percentage for condition '{condition}'"
            ),
            DataInconsistencyWarning::RefundPercentageOutOfRange {
                order_item_id,
                condition,
                percentage,
            } => write!(
                f,
                "item {order_item_id}: refund percentage {percentage} for '{condition}' is outside 0-100"
            ),
            DataInconsistencyWarning::NegativeUnitPrice {
                order_item_id,
                unit_price,
            } => write!(f, "item {order_item_id}: negative unit price {unit_price}"),
            DataInconsistencyWarning::AmountOverflow { order_item_id } => {
                write!(f, "item {order_item_id}: refund amount exceeds the representable range")
            }
        }
    }
}

/// Transport-level failure talking to the order return service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Network error: {message}")]
    Network { message: String },
    #[error("Service responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response from return service: {message}")]
    InvalidResponse { message: String },
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Submission failed or was refused before reaching the service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{message}")]
    Rejected { message: String },
    #[error("{}", SUBMISSION_FALLBACK_MESSAGE)]
    Unavailable,
    #[error("A submission for this return request is already in progress")]
    AlreadyInFlight,
    #[error("Cannot submit from the {step} step")]
    WrongStep { step: WorkflowStep },
    #[error("Select at least one item with a reason and choose a primary reason before submitting")]
    Incomplete,
    #[error("The workflow was closed before the submission completed")]
    Discarded,
}

/// Navigation and editing errors of the workflow driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Operation not allowed in the {step} step")]
    WrongStep { step: WorkflowStep },
    #[error("A return workflow is already open")]
    AlreadyOpen,
    #[error("The workflow was cancelled before it finished opening")]
    OpenCancelled,
    #[error("Order is not eligible for return: {reason}")]
    NotEligible { reason: IneligibilityReason },
    #[error("Select at least one item with a quantity and a reason")]
    NothingSelected,
    #[error("No step before {step}")]
    CannotGoBack { step: WorkflowStep },
    #[error("A submission is in progress")]
    SubmissionInProgress,
    #[error("Return policy unavailable: {message}")]
    PolicyUnavailable { message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

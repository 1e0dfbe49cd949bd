// Item selection and refund estimation

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::errors::{DataInconsistencyWarning, ValidationError};
use super::types::{ItemCondition, Order, ReturnLineItem, ReturnPolicy};

/// One line per order item, everything selected, condition unopened, no reason
pub fn initialize_line_items(order: &Order) -> Vec<ReturnLineItem> {
    order
        .items
        .iter()
        .map(|item| ReturnLineItem {
            order_item_id: item.id.clone(),
            product_id: item.product_id.clone(),
            product_name: item.name.clone(),
            original_quantity: item.quantity,
            return_quantity: item.quantity,
            condition: ItemCondition::default(),
            reason: String::new(),
            unit_price: item.unit_price,
        })
        .collect()
}

/// A change to a single field of a line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum LineItemUpdate {
    ReturnQuantity(u32),
    Condition(ItemCondition),
    Reason(String),
}

impl LineItemUpdate {
    /// Build an update from form-style field/value strings
    pub fn parse(field: &str, value: &str) -> Result<Self, ValidationError> {
        match field {
            "returnQuantity" | "return_quantity" | "quantity" => {
                let requested: i64 = value.trim().parse().map_err(|_| ValidationError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                })?;
                let quantity = u32::try_from(requested).map_err(|_| {
                    ValidationError::QuantityOutOfRange {
                        requested,
                        original: 0,
                    }
                })?;
                Ok(LineItemUpdate::ReturnQuantity(quantity))
            }
            "condition" => Ok(LineItemUpdate::Condition(value.parse()?)),
            "reason" => Ok(LineItemUpdate::Reason(value.trim().to_string())),
            _ => Err(ValidationError::UnknownField {
                field: field.to_string(),
            }),
        }
    }
}

/// Returns a new list with only the targeted field changed
pub fn update_line_item(
    items: &[ReturnLineItem],
    index: usize,
    update: &LineItemUpdate,
) -> Result<Vec<ReturnLineItem>, ValidationError> {
    let current = items.get(index).ok_or(ValidationError::NoSuchItem {
        index,
        len: items.len(),
    })?;

    let mut changed = current.clone();
    match update {
        LineItemUpdate::ReturnQuantity(quantity) => {
            if *quantity > current.original_quantity {
                return Err(ValidationError::QuantityOutOfRange {
                    requested: i64::from(*quantity),
                    original: current.original_quantity,
                });
            }
            changed.return_quantity = *quantity;
        }
        LineItemUpdate::Condition(condition) => changed.condition = *condition,
        LineItemUpdate::Reason(reason) => changed.reason = reason.clone(),
    }

    let mut next = items.to_vec();
    next[index] = changed;
    Ok(next)
}

/// Estimated refund plus anything the calculation had to ignore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEstimate {
    pub amount: Decimal,
    pub warnings: Vec<DataInconsistencyWarning>,
}

impl RefundEstimate {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Round to cents, halves away from zero (half-up for non-negative amounts)
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn compute_estimated_refund(items: &[ReturnLineItem], policy: &ReturnPolicy) -> RefundEstimate {
    let mut total = Decimal::ZERO;
    let mut warnings = Vec::new();

    for item in items.iter().filter(|item| item.contributes()) {
        let Some(percentage) = policy.refund_percentage(item.condition) else {
            warnings.push(DataInconsistencyWarning::MissingRefundPercentage {
                order_item_id: item.order_item_id.clone(),
                condition: item.condition,
            });
            continue;
        };
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            warnings.push(DataInconsistencyWarning::RefundPercentageOutOfRange {
                order_item_id: item.order_item_id.clone(),
                condition: item.condition,
                percentage,
            });
            continue;
        }
        if item.unit_price < Decimal::ZERO {
            warnings.push(DataInconsistencyWarning::NegativeUnitPrice {
                order_item_id: item.order_item_id.clone(),
                unit_price: item.unit_price,
            });
            continue;
        }

        let line_total = percentage
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|share| item.unit_price.checked_mul(share))
            .and_then(|amount| amount.checked_mul(Decimal::from(item.return_quantity)))
            .and_then(|amount| total.checked_add(amount));
        match line_total {
            Some(sum) => total = sum,
            None => warnings.push(DataInconsistencyWarning::AmountOverflow {
                order_item_id: item.order_item_id.clone(),
            }),
        }
    }

    for warning in &warnings {
        warn!(warning = %warning, "Refund calculation skipped inconsistent line item");
    }

    RefundEstimate {
        amount: round_currency(total),
        warnings,
    }
}

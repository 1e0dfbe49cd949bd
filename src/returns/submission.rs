// Submission payload construction and service response interpretation

use tracing::{error, warn};

use super::errors::{ServiceError, SubmissionError};
use super::types::{
    ReturnItemRequest, ReturnLineItem, ReturnRequestDraft, ReturnSubmission, SubmissionReceipt,
    SubmissionResponse,
};

/// Payload for a submittable draft; `None` otherwise
///
/// Only contributing line items are carried, the rest are left out entirely.
pub fn build_submission_payload(draft: &ReturnRequestDraft) -> Option<ReturnSubmission> {
    if !draft.is_submittable() {
        return None;
    }

    let items = draft
        .items
        .iter()
        .filter(|item| item.contributes())
        .map(to_item_request)
        .collect();

    Some(ReturnSubmission {
        order_id: draft.order.id.clone(),
        customer_id: draft.order.customer_id.clone(),
        reason: draft.primary_reason.trim().to_string(),
        description: draft.description.clone(),
        items,
        customer_notes: draft.customer_notes.clone(),
    })
}

fn to_item_request(item: &ReturnLineItem) -> ReturnItemRequest {
    ReturnItemRequest {
        order_item_id: item.order_item_id.clone(),
        product_id: item.product_id.clone(),
        quantity: item.return_quantity,
        reason: item.reason.clone(),
        condition: item.condition,
    }
}

/// Map the raw service outcome onto the workflow's error vocabulary
pub fn interpret_submission_outcome(
    outcome: Result<SubmissionResponse, ServiceError>,
) -> Result<SubmissionReceipt, SubmissionError> {
    match outcome {
        Ok(SubmissionResponse {
            success: true,
            return_id: Some(return_id),
            ..
        }) if !return_id.is_empty() => Ok(SubmissionReceipt { return_id }),
        Ok(SubmissionResponse { success: true, .. }) => {
            warn!("Return service reported success without a return id");
            Err(SubmissionError::Unavailable)
        }
        Ok(SubmissionResponse {
            error: Some(message),
            ..
        }) if !message.trim().is_empty() => Err(SubmissionError::Rejected { message }),
        Ok(_) => Err(SubmissionError::Unavailable),
        Err(e) => {
            error!(error = %e, "Return submission failed");
            Err(SubmissionError::Unavailable)
        }
    }
}

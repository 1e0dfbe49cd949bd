// Integration tests for the return workflow driver
// Exercises the public API end to end against an in-memory order return service

use async_trait::async_trait;
use chrono::{Duration, Utc};
use return_workflow::returns::{
    DraftDetails, EligibilityRules, IneligibilityReason, ItemCondition, LineItemUpdate, Order,
    OrderItem, OrderReturnService, OrderStatus, ReturnPolicy, ReturnSubmission, ReturnWorkflow,
    ReturnabilityVerdict, ServiceError, SubmissionError, SubmissionResponse, WorkflowError,
    WorkflowStep,
};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

// In-memory service that replays scripted submission responses
#[derive(Default)]
struct ScriptedService {
    refuse_with: Option<String>,
    responses: Mutex<VecDeque<Result<SubmissionResponse, ServiceError>>>,
    submissions: Mutex<Vec<ReturnSubmission>>,
}

impl ScriptedService {
    fn respond(self, response: Result<SubmissionResponse, ServiceError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    fn submissions(&self) -> Vec<ReturnSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderReturnService for ScriptedService {
    async fn get_return_policy(&self) -> Result<ReturnPolicy, ServiceError> {
        Ok(ReturnPolicy {
            max_return_days: 30,
            refund_percentages: BTreeMap::from([
                (ItemCondition::Unopened, dec!(100)),
                (ItemCondition::Opened, dec!(80)),
                (ItemCondition::Damaged, dec!(50)),
                (ItemCondition::Expired, dec!(0)),
            ]),
            allowed_reasons: vec![
                "defective".to_string(),
                "wrong_item".to_string(),
                "no_longer_needed".to_string(),
            ],
        })
    }

    async fn check_order_returnability(
        &self,
        _order: &Order,
    ) -> Result<ReturnabilityVerdict, ServiceError> {
        Ok(ReturnabilityVerdict {
            can_return: self.refuse_with.is_none(),
            reason: self.refuse_with.clone(),
        })
    }

    async fn submit_return_request(
        &self,
        payload: &ReturnSubmission,
    ) -> Result<SubmissionResponse, ServiceError> {
        self.submissions.lock().unwrap().push(payload.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::Network {
                message: "no scripted response".to_string(),
            }))
    }
}

fn delivered_order(days_ago: i64) -> Order {
    Order {
        id: "ord-1001".to_string(),
        customer_id: "cust-42".to_string(),
        items: vec![
            OrderItem {
                id: "line-1".to_string(),
                product_id: "sku-bandage".to_string(),
                name: "Elastic bandage".to_string(),
                quantity: 3,
                unit_price: dec!(12.50),
            },
            OrderItem {
                id: "line-2".to_string(),
                product_id: "sku-thermo".to_string(),
                name: "Digital thermometer".to_string(),
                quantity: 1,
                unit_price: dec!(24.99),
            },
        ],
        completed_at: Some(Utc::now() - Duration::days(days_ago)),
        status: OrderStatus::Delivered,
    }
}

fn success(return_id: &str) -> Result<SubmissionResponse, ServiceError> {
    Ok(SubmissionResponse {
        success: true,
        return_id: Some(return_id.to_string()),
        error: None,
    })
}

async fn fill_to_details(workflow: &ReturnWorkflow) {
    workflow.advance().await.unwrap();
    workflow
        .update_item(0, LineItemUpdate::ReturnQuantity(2))
        .await
        .unwrap();
    workflow
        .update_item(0, LineItemUpdate::Reason("defective".to_string()))
        .await
        .unwrap();
    workflow
        .update_item(1, LineItemUpdate::ReturnQuantity(0))
        .await
        .unwrap();
    workflow.advance().await.unwrap();
    workflow
        .update_details(DraftDetails {
            primary_reason: Some("defective".to_string()),
            description: Some("Elastic lost its stretch".to_string()),
            customer_notes: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_return_request_happy_path() {
    let service = Arc::new(ScriptedService::default().respond(success("RET-9001")));
    let workflow = ReturnWorkflow::new(service.clone(), EligibilityRules::default());

    let eligibility = workflow.open(delivered_order(5)).await.unwrap();
    assert!(eligibility.can_return);
    assert_eq!(workflow.step().await, WorkflowStep::Eligibility);

    fill_to_details(&workflow).await;
    assert_eq!(workflow.step().await, WorkflowStep::Details);
    assert_eq!(workflow.estimated_refund().await.unwrap().amount, dec!(25.00));

    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.return_id, "RET-9001");
    assert_eq!(workflow.step().await, WorkflowStep::Confirmation);
    assert_eq!(workflow.return_id().await.as_deref(), Some("RET-9001"));

    let submissions = service.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].order_id, "ord-1001");
    assert_eq!(submissions[0].reason, "defective");
    assert_eq!(submissions[0].items.len(), 1);
    assert_eq!(submissions[0].items[0].order_item_id, "line-1");
    assert_eq!(submissions[0].items[0].quantity, 2);
}

#[tokio::test]
async fn test_expired_window_blocks_advance() {
    let service = Arc::new(ScriptedService::default());
    let workflow = ReturnWorkflow::new(service, EligibilityRules::default());

    let eligibility = workflow.open(delivered_order(45)).await.unwrap();
    assert!(!eligibility.can_return);
    assert!(matches!(
        eligibility.reason,
        Some(IneligibilityReason::WindowExpired { max_days: 30, .. })
    ));
    assert!(matches!(
        workflow.advance().await,
        Err(WorkflowError::NotEligible { .. })
    ));
    assert_eq!(workflow.step().await, WorkflowStep::Eligibility);
}

#[tokio::test]
async fn test_service_refusal_is_reported_as_ineligible() {
    let service = Arc::new(ScriptedService {
        refuse_with: Some("Prescription items cannot be returned".to_string()),
        ..ScriptedService::default()
    });
    let workflow = ReturnWorkflow::new(service, EligibilityRules::default());

    let eligibility = workflow.open(delivered_order(2)).await.unwrap();
    assert!(!eligibility.can_return);
    assert_eq!(
        eligibility.reason.unwrap().to_string(),
        "Prescription items cannot be returned"
    );
}

#[tokio::test]
async fn test_rejection_keeps_draft_for_retry() {
    let service = Arc::new(
        ScriptedService::default()
            .respond(Ok(SubmissionResponse {
                success: false,
                return_id: None,
                error: Some("Return window closed".to_string()),
            }))
            .respond(success("RET-9002")),
    );
    let workflow = ReturnWorkflow::new(service.clone(), EligibilityRules::default());
    workflow.open(delivered_order(5)).await.unwrap();
    fill_to_details(&workflow).await;

    let err = workflow.submit().await.unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Rejected {
            message: "Return window closed".to_string()
        }
    );
    assert_eq!(workflow.step().await, WorkflowStep::Details);
    assert!(!workflow.is_submitting().await);
    assert!(workflow.draft().await.is_some());

    let receipt = workflow.submit().await.unwrap();
    assert_eq!(receipt.return_id, "RET-9002");
    assert_eq!(service.submissions().len(), 2);
}

#[tokio::test]
async fn test_transport_failure_uses_fallback_message() {
    let service = Arc::new(ScriptedService::default().respond(Err(ServiceError::Timeout {
        timeout_ms: 10_000,
    })));
    let workflow = ReturnWorkflow::new(service, EligibilityRules::default());
    workflow.open(delivered_order(5)).await.unwrap();
    fill_to_details(&workflow).await;

    let err = workflow.submit().await.unwrap_err();
    assert_eq!(err, SubmissionError::Unavailable);
    assert_eq!(
        err.to_string(),
        "Failed to submit the return request. Please try again later."
    );
    assert_eq!(workflow.last_error().await, Some(SubmissionError::Unavailable));
}

#[tokio::test]
async fn test_cancel_then_reopen_starts_fresh() {
    let service = Arc::new(ScriptedService::default());
    let workflow = ReturnWorkflow::new(service, EligibilityRules::default());
    workflow.open(delivered_order(5)).await.unwrap();
    fill_to_details(&workflow).await;

    workflow.cancel().await;
    assert_eq!(workflow.step().await, WorkflowStep::Idle);
    assert!(workflow.draft().await.is_none());

    workflow.open(delivered_order(5)).await.unwrap();
    workflow.advance().await.unwrap();
    let items = workflow.line_items().await;
    assert_eq!(items[0].return_quantity, 3);
    assert!(items[0].reason.is_empty());
}

#[tokio::test]
async fn test_unknown_reason_is_rejected_in_items_step() {
    let service = Arc::new(ScriptedService::default());
    let workflow = ReturnWorkflow::new(service, EligibilityRules::default());
    workflow.open(delivered_order(5)).await.unwrap();
    workflow.advance().await.unwrap();

    let before = workflow.line_items().await;
    let err = workflow
        .update_item(0, LineItemUpdate::Reason("changed_my_mind".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(workflow.line_items().await, before);
}

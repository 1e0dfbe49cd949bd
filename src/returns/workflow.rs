// Return workflow driver - owns the wizard state machine and talks to the service

use chrono::{DateTime, Utc};
use statig::prelude::*;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use super::eligibility::{check_eligibility, EligibilityRules};
use super::errors::{SubmissionError, ValidationError, WorkflowError};
use super::items::{initialize_line_items, update_line_item, LineItemUpdate, RefundEstimate};
use super::state_machine::{ReturnWizard, WizardEvent};
use super::submission::{build_submission_payload, interpret_submission_outcome};
use super::traits::OrderReturnService;
use super::types::{
    DraftDetails, EligibilityResult, IneligibilityReason, Order, ReturnLineItem, ReturnPolicy,
    ReturnRequestDraft, SubmissionReceipt, WorkflowStep,
};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

const DEFAULT_SERVICE_REFUSAL: &str = "This order cannot be returned";

/// Drives one return request at a time for a single user
///
/// Cloning the handle shares the same wizard. The lock is never held while
/// awaiting the service: `open` re-checks the step after its calls, and the
/// in-flight flag keeps a second `submit` from reaching the service.
#[derive(Clone)]
pub struct ReturnWorkflow {
    machine: Arc<Mutex<StateMachine<ReturnWizard>>>,
    service: Arc<dyn OrderReturnService>,
    rules: EligibilityRules,
    correlation_id: String,
}

impl ReturnWorkflow {
    pub fn new(service: Arc<dyn OrderReturnService>, rules: EligibilityRules) -> Self {
        Self {
            machine: Arc::new(Mutex::new(ReturnWizard::new().state_machine())),
            service,
            rules,
            correlation_id: generate_correlation_id(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Open the workflow for an order, checking eligibility as of now
    pub async fn open(&self, order: Order) -> Result<EligibilityResult, WorkflowError> {
        self.open_at(order, Utc::now()).await
    }

    pub async fn open_at(
        &self,
        order: Order,
        now: DateTime<Utc>,
    ) -> Result<EligibilityResult, WorkflowError> {
        let span = create_workflow_span("open", Some(&order.id), Some(&self.correlation_id));
        async move {
            let generation = {
                let machine = self.machine.lock().await;
                if machine.inner().step() != WorkflowStep::Idle {
                    return Err(WorkflowError::AlreadyOpen);
                }
                machine.inner().generation()
            };

            // service calls run unlocked so cancel() and the accessors stay responsive
            let policy = self
                .service
                .get_return_policy()
                .await
                .map_err(|e| WorkflowError::PolicyUnavailable {
                    message: e.to_string(),
                })?;
            policy.validate()?;
            let eligibility = self.resolve_eligibility(&order, &policy, now).await;

            let mut machine = self.machine.lock().await;
            if machine.inner().generation() != generation {
                info!(order_id = %order.id, "Workflow cancelled while opening");
                return Err(WorkflowError::OpenCancelled);
            }
            if machine.inner().step() != WorkflowStep::Idle {
                warn!(order_id = %order.id, "Another workflow opened first, dropping this one");
                return Err(WorkflowError::AlreadyOpen);
            }
            let items = initialize_line_items(&order);
            machine.handle(&WizardEvent::Open {
                policy,
                eligibility: eligibility.clone(),
                draft: ReturnRequestDraft::new(order, items),
            });
            Ok(eligibility)
        }
        .instrument(span)
        .await
    }

    /// Local date rules first, then the service's own rules
    async fn resolve_eligibility(
        &self,
        order: &Order,
        policy: &ReturnPolicy,
        now: DateTime<Utc>,
    ) -> EligibilityResult {
        let local = check_eligibility(order, policy, &self.rules, now);
        if !local.can_return {
            info!(order_id = %order.id, reason = ?local.reason, "Order not eligible for return");
            return local;
        }

        match self.service.check_order_returnability(order).await {
            Ok(verdict) if verdict.can_return => local,
            Ok(verdict) => {
                let message = verdict
                    .reason
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SERVICE_REFUSAL.to_string());
                info!(order_id = %order.id, %message, "Return service refused the order");
                EligibilityResult::ineligible(IneligibilityReason::RejectedByService { message })
            }
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    error = %e,
                    "Returnability check failed, falling back to local rules"
                );
                local
            }
        }
    }

    pub async fn advance(&self) -> Result<WorkflowStep, WorkflowError> {
        let mut machine = self.machine.lock().await;
        let wizard = machine.inner();
        let step = wizard.step();
        match step {
            WorkflowStep::Eligibility if !wizard.can_return() => {
                let reason = wizard
                    .eligibility_result()
                    .and_then(|eligibility| eligibility.reason.clone())
                    .unwrap_or(IneligibilityReason::RejectedByService {
                        message: DEFAULT_SERVICE_REFUSAL.to_string(),
                    });
                return Err(WorkflowError::NotEligible { reason });
            }
            WorkflowStep::Items if !wizard.has_contributing_item() => {
                return Err(WorkflowError::NothingSelected);
            }
            WorkflowStep::Eligibility | WorkflowStep::Items => {}
            WorkflowStep::Idle | WorkflowStep::Details | WorkflowStep::Confirmation => {
                return Err(WorkflowError::WrongStep { step });
            }
        }

        machine.handle(&WizardEvent::Advance);
        Ok(machine.inner().step())
    }

    pub async fn back(&self) -> Result<WorkflowStep, WorkflowError> {
        let mut machine = self.machine.lock().await;
        let wizard = machine.inner();
        let step = wizard.step();
        match step {
            WorkflowStep::Eligibility => return Err(WorkflowError::CannotGoBack { step }),
            WorkflowStep::Details if wizard.is_submitting() => {
                return Err(WorkflowError::SubmissionInProgress)
            }
            WorkflowStep::Items | WorkflowStep::Details => {}
            WorkflowStep::Idle | WorkflowStep::Confirmation => {
                return Err(WorkflowError::WrongStep { step });
            }
        }

        machine.handle(&WizardEvent::Back);
        Ok(machine.inner().step())
    }

    /// Discard all progress and return to idle
    pub async fn cancel(&self) {
        let mut machine = self.machine.lock().await;
        machine.handle(&WizardEvent::Cancel);
    }

    /// Change one field of one line item, returning the new refund estimate
    pub async fn update_item(
        &self,
        index: usize,
        update: LineItemUpdate,
    ) -> Result<RefundEstimate, WorkflowError> {
        let mut machine = self.machine.lock().await;
        let wizard = machine.inner();
        if wizard.step() != WorkflowStep::Items {
            return Err(WorkflowError::WrongStep {
                step: wizard.step(),
            });
        }
        let policy = wizard
            .policy()
            .ok_or(WorkflowError::WrongStep { step: wizard.step() })?;
        let update = match update {
            LineItemUpdate::Reason(reason) => {
                check_reason(policy, &reason)?;
                LineItemUpdate::Reason(reason.trim().to_string())
            }
            other => other,
        };

        let items = update_line_item(wizard.line_items(), index, &update)?;
        machine.handle(&WizardEvent::ReplaceItems { items });
        machine
            .inner()
            .estimated_refund()
            .ok_or(WorkflowError::WrongStep {
                step: WorkflowStep::Items,
            })
    }

    /// Form-style variant of [`ReturnWorkflow::update_item`]
    pub async fn update_item_field(
        &self,
        index: usize,
        field: &str,
        value: &str,
    ) -> Result<RefundEstimate, WorkflowError> {
        let update = LineItemUpdate::parse(field, value)?;
        self.update_item(index, update).await
    }

    pub async fn update_details(&self, details: DraftDetails) -> Result<(), WorkflowError> {
        let mut machine = self.machine.lock().await;
        let wizard = machine.inner();
        if wizard.step() != WorkflowStep::Details {
            return Err(WorkflowError::WrongStep {
                step: wizard.step(),
            });
        }
        if wizard.is_submitting() {
            return Err(WorkflowError::SubmissionInProgress);
        }
        if let (Some(policy), Some(reason)) = (wizard.policy(), &details.primary_reason) {
            check_reason(policy, reason)?;
        }

        machine.handle(&WizardEvent::ReplaceDetails { details });
        Ok(())
    }

    /// Submit the draft; only one submission may be in flight
    pub async fn submit(&self) -> Result<SubmissionReceipt, SubmissionError> {
        let (payload, generation) = {
            let mut machine = self.machine.lock().await;
            let wizard = machine.inner();
            if wizard.step() != WorkflowStep::Details {
                return Err(SubmissionError::WrongStep {
                    step: wizard.step(),
                });
            }
            if wizard.is_submitting() {
                warn!(correlation_id = %self.correlation_id, "Rejected duplicate submission");
                return Err(SubmissionError::AlreadyInFlight);
            }
            let payload = wizard
                .draft()
                .and_then(build_submission_payload)
                .ok_or(SubmissionError::Incomplete)?;
            let generation = wizard.generation();
            machine.handle(&WizardEvent::BeginSubmission);
            (payload, generation)
        };

        let span = create_workflow_span(
            "submit",
            Some(&payload.order_id),
            Some(&self.correlation_id),
        );
        let outcome = self
            .service
            .submit_return_request(&payload)
            .instrument(span)
            .await;
        let result = interpret_submission_outcome(outcome);

        let mut machine = self.machine.lock().await;
        if machine.inner().generation() != generation {
            warn!(
                order_id = %payload.order_id,
                "Workflow closed while submitting, discarding late response"
            );
            return Err(SubmissionError::Discarded);
        }
        match &result {
            Ok(receipt) => machine.handle(&WizardEvent::SubmissionSucceeded {
                return_id: receipt.return_id.clone(),
            }),
            Err(error) => machine.handle(&WizardEvent::SubmissionFailed {
                error: error.clone(),
            }),
        }
        result
    }

    pub async fn step(&self) -> WorkflowStep {
        self.machine.lock().await.inner().step()
    }

    pub async fn eligibility(&self) -> Option<EligibilityResult> {
        self.machine.lock().await.inner().eligibility_result().cloned()
    }

    pub async fn draft(&self) -> Option<ReturnRequestDraft> {
        self.machine.lock().await.inner().draft().cloned()
    }

    pub async fn line_items(&self) -> Vec<ReturnLineItem> {
        self.machine.lock().await.inner().line_items().to_vec()
    }

    pub async fn estimated_refund(&self) -> Option<RefundEstimate> {
        self.machine.lock().await.inner().estimated_refund()
    }

    pub async fn is_submitting(&self) -> bool {
        self.machine.lock().await.inner().is_submitting()
    }

    pub async fn return_id(&self) -> Option<String> {
        self.machine.lock().await.inner().return_id().map(str::to_string)
    }

    pub async fn last_error(&self) -> Option<SubmissionError> {
        self.machine.lock().await.inner().last_error().cloned()
    }
}

fn check_reason(policy: &ReturnPolicy, reason: &str) -> Result<(), ValidationError> {
    let reason = reason.trim();
    if reason.is_empty() || policy.allows_reason(reason) {
        Ok(())
    } else {
        Err(ValidationError::UnknownReason {
            value: reason.to_string(),
        })
    }
}

impl std::fmt::Debug for ReturnWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReturnWorkflow")
            .field("machine", &"Arc<Mutex<StateMachine<ReturnWizard>>>")
            .field("rules", &self.rules)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

use statig::prelude::*;

use super::errors::SubmissionError;
use super::items::{compute_estimated_refund, RefundEstimate};
use super::types::{
    DraftDetails, EligibilityResult, ReturnLineItem, ReturnPolicy, ReturnRequestDraft,
    WorkflowStep,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    Open {
        policy: ReturnPolicy,
        eligibility: EligibilityResult,
        draft: ReturnRequestDraft,
    },
    Advance,
    Back,
    ReplaceItems {
        items: Vec<ReturnLineItem>,
    },
    ReplaceDetails {
        details: DraftDetails,
    },
    BeginSubmission,
    SubmissionSucceeded {
        return_id: String,
    },
    SubmissionFailed {
        error: SubmissionError,
    },
    Cancel,
}

/// Shared storage of the return wizard state machine
///
/// Guards live in the state handlers: an event that is not allowed in the
/// current state is logged and left unhandled.
#[derive(Debug, Default)]
pub struct ReturnWizard {
    step: WorkflowStep,
    policy: Option<ReturnPolicy>,
    eligibility: Option<EligibilityResult>,
    draft: Option<ReturnRequestDraft>,
    submitting: bool,
    generation: u64,
    return_id: Option<String>,
    last_error: Option<SubmissionError>,
}

impl ReturnWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[state_machine(initial = "State::idle()")]
impl ReturnWizard {
    #[state(entry_action = "enter_idle")]
    fn idle(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Open {
                policy,
                eligibility,
                draft,
            } => {
                self.policy = Some(policy.clone());
                self.eligibility = Some(eligibility.clone());
                self.draft = Some(draft.clone());
                self.return_id = None;
                self.last_error = None;
                tracing::info!(
                    order_id = %draft.order.id,
                    can_return = eligibility.can_return,
                    "Return workflow opened"
                );
                Transition(State::eligibility())
            }
            // nothing to reset, but an open still awaiting the service must not land
            WizardEvent::Cancel => {
                self.generation += 1;
                Handled
            }
            _ => Handled,
        }
    }

    #[superstate]
    fn active(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Cancel => {
                let order_id = self.order_id();
                self.reset_state();
                tracing::info!(order_id = ?order_id, "Return workflow cancelled");
                Transition(State::idle())
            }
            _ => {
                tracing::warn!(step = %self.step, event = ?event, "Event ignored in current step");
                Handled
            }
        }
    }

    #[state(superstate = "active", entry_action = "enter_eligibility")]
    fn eligibility(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Advance => {
                if self.can_return() {
                    Transition(State::items())
                } else {
                    tracing::warn!(
                        order_id = ?self.order_id(),
                        "Order is not eligible for return, staying on eligibility step"
                    );
                    Handled
                }
            }
            _ => Super,
        }
    }

    #[state(superstate = "active", entry_action = "enter_items")]
    fn items(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Advance => {
                if self.has_contributing_item() {
                    Transition(State::details())
                } else {
                    tracing::warn!(
                        order_id = ?self.order_id(),
                        "No line item selected with quantity and reason"
                    );
                    Handled
                }
            }
            WizardEvent::Back => Transition(State::eligibility()),
            WizardEvent::ReplaceItems { items } => {
                self.draft = self.draft.as_ref().map(|draft| draft.with_items(items.clone()));
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "active", entry_action = "enter_details")]
    fn details(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Back if !self.submitting => Transition(State::items()),
            WizardEvent::ReplaceDetails { details } if !self.submitting => {
                self.draft = self.draft.as_ref().map(|draft| draft.with_details(details));
                Handled
            }
            WizardEvent::BeginSubmission if !self.submitting => {
                self.submitting = true;
                self.last_error = None;
                tracing::info!(order_id = ?self.order_id(), "Submitting return request");
                Handled
            }
            WizardEvent::SubmissionSucceeded { return_id } if self.submitting => {
                self.submitting = false;
                self.return_id = Some(return_id.clone());
                self.draft = None;
                tracing::info!(return_id = %return_id, "Return request submitted");
                Transition(State::confirmation())
            }
            WizardEvent::SubmissionFailed { error } if self.submitting => {
                self.submitting = false;
                self.last_error = Some(error.clone());
                tracing::warn!(error = %error, "Return request submission failed");
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "active", entry_action = "enter_confirmation")]
    fn confirmation(&mut self, event: &WizardEvent) -> Outcome<State> {
        match event {
            WizardEvent::Cancel => Super,
            _ => Handled,
        }
    }

    #[action]
    fn enter_idle(&mut self) {
        self.step = WorkflowStep::Idle;
    }

    #[action]
    fn enter_eligibility(&mut self) {
        self.step = WorkflowStep::Eligibility;
    }

    #[action]
    fn enter_items(&mut self) {
        self.step = WorkflowStep::Items;
    }

    #[action]
    fn enter_details(&mut self) {
        self.step = WorkflowStep::Details;
    }

    #[action]
    fn enter_confirmation(&mut self) {
        self.step = WorkflowStep::Confirmation;
    }
}

impl ReturnWizard {
    fn reset_state(&mut self) {
        self.policy = None;
        self.eligibility = None;
        self.draft = None;
        self.submitting = false;
        self.return_id = None;
        self.last_error = None;
        // late submission responses compare against this
        self.generation += 1;
    }

    fn order_id(&self) -> Option<String> {
        self.draft.as_ref().map(|draft| draft.order.id.clone())
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn policy(&self) -> Option<&ReturnPolicy> {
        self.policy.as_ref()
    }

    pub fn eligibility_result(&self) -> Option<&EligibilityResult> {
        self.eligibility.as_ref()
    }

    pub fn draft(&self) -> Option<&ReturnRequestDraft> {
        self.draft.as_ref()
    }

    pub fn line_items(&self) -> &[ReturnLineItem] {
        self.draft
            .as_ref()
            .map(|draft| draft.items.as_slice())
            .unwrap_or_default()
    }

    /// Recomputed from the current items and policy on every call
    pub fn estimated_refund(&self) -> Option<RefundEstimate> {
        match (&self.draft, &self.policy) {
            (Some(draft), Some(policy)) => Some(compute_estimated_refund(&draft.items, policy)),
            _ => None,
        }
    }

    pub fn can_return(&self) -> bool {
        self.eligibility
            .as_ref()
            .map(|eligibility| eligibility.can_return)
            .unwrap_or(false)
    }

    pub fn has_contributing_item(&self) -> bool {
        self.draft
            .as_ref()
            .map(ReturnRequestDraft::has_contributing_item)
            .unwrap_or(false)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn return_id(&self) -> Option<&str> {
        self.return_id.as_deref()
    }

    pub fn last_error(&self) -> Option<&SubmissionError> {
        self.last_error.as_ref()
    }
}

// Return Request Workflow - eligibility, item selection, refund estimate, submission
//
// The pure calculations live in their own modules; the wizard state machine
// and its async driver sit on top and delegate all backend work to an
// injected `OrderReturnService`.

pub mod types;
pub mod errors;
pub mod eligibility;
pub mod items;
pub mod submission;
pub mod traits;
pub mod state_machine;
pub mod workflow;

#[cfg(test)]
pub mod mocks;


pub use eligibility::{check_eligibility, EligibilityRules};
pub use errors::{
    DataInconsistencyWarning, ServiceError, SubmissionError, ValidationError, WorkflowError,
};
pub use items::{
    compute_estimated_refund, initialize_line_items, round_currency, update_line_item,
    LineItemUpdate, RefundEstimate,
};
pub use state_machine::{ReturnWizard, WizardEvent};
pub use submission::build_submission_payload;
pub use traits::OrderReturnService;
pub use types::*;
pub use workflow::ReturnWorkflow;

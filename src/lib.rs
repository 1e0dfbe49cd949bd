// Return Request Workflow Library
// Exposes the workflow engine, its HTTP collaborator and the CLI plumbing

pub mod cli;
pub mod config;
pub mod returns;
pub mod services;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, ReturnWorkflowConfig};
pub use returns::{
    check_eligibility, compute_estimated_refund, initialize_line_items, update_line_item,
    EligibilityResult, EligibilityRules, ItemCondition, LineItemUpdate, Order, OrderReturnService,
    RefundEstimate, ReturnPolicy, ReturnWorkflow, SubmissionError, WorkflowError, WorkflowStep,
};
pub use services::HttpOrderReturnService;
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};

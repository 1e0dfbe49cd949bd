// Collaborator interface - the order return service the workflow delegates to

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::errors::ServiceError;
use super::types::{Order, ReturnPolicy, ReturnSubmission, ReturnabilityVerdict, SubmissionResponse};

/// Order return service operations
///
/// Errors are transport failures only. A refused return is reported in the
/// response body (`ReturnabilityVerdict::can_return`, `SubmissionResponse::success`).
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait OrderReturnService: Send + Sync {
    /// Current return policy
    async fn get_return_policy(&self) -> Result<ReturnPolicy, ServiceError>;

    /// Server-side returnability rules for a specific order
    async fn check_order_returnability(
        &self,
        order: &Order,
    ) -> Result<ReturnabilityVerdict, ServiceError>;

    /// Submit a return request
    async fn submit_return_request(
        &self,
        payload: &ReturnSubmission,
    ) -> Result<SubmissionResponse, ServiceError>;
}

// Mock order return service for testing - no network, records every payload

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::errors::ServiceError;
use super::traits::OrderReturnService;
use super::types::*;

/// Canned responses plus a log of what the workflow sent
#[derive(Debug)]
pub struct RecordingReturnService {
    pub policy: Mutex<Option<ReturnPolicy>>,
    pub verdict: Mutex<Option<ReturnabilityVerdict>>,
    pub responses: Mutex<VecDeque<Result<SubmissionResponse, ServiceError>>>,
    pub submitted: Mutex<Vec<ReturnSubmission>>,
    pub returnability_checks: Mutex<Vec<String>>,
    /// When set, each submission waits for a permit before answering
    pub gate: Option<Arc<Semaphore>>,
    pub policy_requests: Mutex<usize>,
    /// Same, for policy fetches
    pub policy_gate: Option<Arc<Semaphore>>,
}

impl RecordingReturnService {
    pub fn new(policy: ReturnPolicy) -> Self {
        Self {
            policy: Mutex::new(Some(policy)),
            verdict: Mutex::new(None),
            responses: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            returnability_checks: Mutex::new(Vec::new()),
            gate: None,
            policy_requests: Mutex::new(0),
            policy_gate: None,
        }
    }

    pub fn gated(policy: ReturnPolicy, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(policy)
        }
    }

    pub fn with_slow_policy(policy: ReturnPolicy, policy_gate: Arc<Semaphore>) -> Self {
        Self {
            policy_gate: Some(policy_gate),
            ..Self::new(policy)
        }
    }

    pub fn without_policy() -> Self {
        let service = Self::new(super::tests::pharmacy_policy());
        *service.policy.lock().unwrap() = None;
        service
    }

    pub fn set_verdict(&self, verdict: ReturnabilityVerdict) {
        *self.verdict.lock().unwrap() = Some(verdict);
    }

    pub fn push_response(&self, response: Result<SubmissionResponse, ServiceError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_success(&self, return_id: &str) {
        self.push_response(Ok(SubmissionResponse {
            success: true,
            return_id: Some(return_id.to_string()),
            error: None,
        }));
    }

    pub fn submitted(&self) -> Vec<ReturnSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn returnability_checks(&self) -> Vec<String> {
        self.returnability_checks.lock().unwrap().clone()
    }

    pub fn policy_requests(&self) -> usize {
        *self.policy_requests.lock().unwrap()
    }
}

#[async_trait]
impl OrderReturnService for RecordingReturnService {
    async fn get_return_policy(&self) -> Result<ReturnPolicy, ServiceError> {
        *self.policy_requests.lock().unwrap() += 1;
        if let Some(gate) = &self.policy_gate {
            gate.acquire()
                .await
                .map_err(|e| ServiceError::Network {
                    message: e.to_string(),
                })?
                .forget();
        }
        self.policy
            .lock()
            .unwrap()
            .clone()
            .ok_or(ServiceError::Status {
                status: 503,
                body: "policy service down".to_string(),
            })
    }

    async fn check_order_returnability(
        &self,
        order: &Order,
    ) -> Result<ReturnabilityVerdict, ServiceError> {
        self.returnability_checks
            .lock()
            .unwrap()
            .push(order.id.clone());
        Ok(self
            .verdict
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ReturnabilityVerdict {
                can_return: true,
                reason: None,
            }))
    }

    async fn submit_return_request(
        &self,
        payload: &ReturnSubmission,
    ) -> Result<SubmissionResponse, ServiceError> {
        self.submitted.lock().unwrap().push(payload.clone());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ServiceError::Network {
                    message: e.to_string(),
                })?
                .forget();
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::Network {
                message: "no canned response".to_string(),
            }))
    }
}

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::returns::{
    Order, OrderReturnService, ReturnPolicy, ReturnSubmission, ReturnabilityVerdict, ServiceError,
    SubmissionResponse,
};

const POLICY_CACHE_KEY: &str = "return-policy";

/// Order return service over HTTP with client-side rate limiting
///
/// The return policy changes rarely, so it is cached for the configured TTL;
/// eligibility checks and submissions always go to the server.
#[derive(Debug)]
pub struct HttpOrderReturnService {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    policy_cache: Cache<&'static str, ReturnPolicy>,
}

impl HttpOrderReturnService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network {
                message: e.to_string(),
            })?;

        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        let policy_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.policy_cache_ttl_seconds))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            policy_cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Wait for rate limit permission, send, and decode a JSON body
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Return service returned an error status");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::InvalidResponse {
                message: e.to_string(),
            })
    }

    fn transport_error(&self, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ServiceError::Network {
                message: error.to_string(),
            }
        }
    }

    /// Drop the cached policy so the next workflow fetches a fresh one
    pub async fn invalidate_policy(&self) {
        self.policy_cache.invalidate(POLICY_CACHE_KEY).await;
        info!("Return policy cache cleared");
    }
}

#[async_trait]
impl OrderReturnService for HttpOrderReturnService {
    async fn get_return_policy(&self) -> Result<ReturnPolicy, ServiceError> {
        if let Some(policy) = self.policy_cache.get(POLICY_CACHE_KEY).await {
            debug!("Cache hit for return policy");
            return Ok(policy);
        }

        let policy: ReturnPolicy = self
            .execute(self.client.get(self.url("returns/policy")))
            .await?;
        self.policy_cache
            .insert(POLICY_CACHE_KEY, policy.clone())
            .await;
        debug!(max_return_days = policy.max_return_days, "Fetched return policy");
        Ok(policy)
    }

    async fn check_order_returnability(
        &self,
        order: &Order,
    ) -> Result<ReturnabilityVerdict, ServiceError> {
        self.execute(self.client.post(self.url("returns/eligibility")).json(order))
            .await
    }

    async fn submit_return_request(
        &self,
        payload: &ReturnSubmission,
    ) -> Result<SubmissionResponse, ServiceError> {
        let request = self.client.post(self.url("returns")).json(payload);
        match self.execute::<SubmissionResponse>(request).await {
            // a refusal may come back as 4xx with the usual body
            Err(ServiceError::Status { status, body })
                if StatusCode::from_u16(status).is_ok_and(|s| s.is_client_error()) =>
            {
                match serde_json::from_str::<SubmissionResponse>(&body) {
                    Ok(response) => Ok(response),
                    Err(_) => Err(ServiceError::Status { status, body }),
                }
            }
            other => other,
        }
    }
}

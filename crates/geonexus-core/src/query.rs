use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::QueryError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/api/query";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Client for the GraphRAG query backend
#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST one query and return the decoded JSON body.
    ///
    /// Exactly one attempt is made. Non-2xx statuses and bodies that are not
    /// JSON are errors, as is exceeding the configured timeout.
    pub async fn query(&self, query: &str) -> Result<Value, QueryError> {
        tracing::debug!(endpoint = %self.endpoint, "sending query");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "query backend returned an error status");
            return Err(QueryError::Status(status));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| QueryError::Decode(e.to_string()))?;

        tracing::debug!(bytes = body.len(), "query answered");
        Ok(value)
    }

    fn classify(&self, error: reqwest::Error) -> QueryError {
        if error.is_timeout() {
            tracing::warn!(timeout = ?self.timeout, "query timed out");
            QueryError::Timeout(self.timeout.as_secs())
        } else {
            tracing::warn!(%error, "query transport failure");
            QueryError::Transport(error)
        }
    }
}

//! Remote candidate generator over HTTP (`remote-generator` feature).
//!
//! Posts `{ "query", "prior" }` as JSON to `{endpoint}/generate` and expects a
//! candidate set back.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vibecation_application::{CandidateGenerator, GeneratorError};
use vibecation_domain::CandidateSet;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    query: &'a str,
    prior: &'a CandidateSet,
}

#[derive(Debug, Clone)]
pub struct HttpCandidateGenerator {
    client: reqwest::Client,
    url: String,
}

impl HttpCandidateGenerator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeneratorError::RequestFailed(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/generate", endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CandidateGenerator for HttpCandidateGenerator {
    async fn generate(
        &self,
        query: &str,
        prior: &CandidateSet,
    ) -> Result<CandidateSet, GeneratorError> {
        debug!("POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { query, prior })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeneratorError::RequestFailed(format!(
                "generator returned {}",
                response.status()
            )));
        }

        let set: CandidateSet = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        if set.is_empty() {
            return Err(GeneratorError::InvalidResponse(
                "no activities or cuisines".to_string(),
            ));
        }
        Ok(set)
    }
}

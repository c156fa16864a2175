//! Candidate generator port
//!
//! The natural-language itinerary generator is an external collaborator,
//! consumed as `generate(query, prior) -> new`. It is only invoked while a
//! member is authoring a suggestion set.

use async_trait::async_trait;
use thiserror::Error;
use vibecation_domain::{CandidateSet, DomainError};

/// Errors that can occur when calling the generator
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator request failed: {0}")]
    RequestFailed(String),

    #[error("Generator returned an unusable candidate set: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,
}

impl From<GeneratorError> for DomainError {
    fn from(err: GeneratorError) -> Self {
        DomainError::DownstreamFailure(err.to_string())
    }
}

/// Produces a revised candidate set from a free-form request
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// `prior` is empty on the first request of a member.
    async fn generate(
        &self,
        query: &str,
        prior: &CandidateSet,
    ) -> Result<CandidateSet, GeneratorError>;
}

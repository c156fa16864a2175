//! Option derivation, the brainstorm phase's completion action.

use crate::ports::store::{OptionStore, SuggestionStore};
use crate::use_cases::complete_phase::CompletionAction;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use vibecation_domain::{DomainError, TripId, derive_catalogue};

/// Replaces the trip's option catalogue with the union of submitted sets.
///
/// Derivation is deterministic, so re-running after a partial failure
/// rewrites the same catalogue.
pub struct OptionDerivation {
    suggestions: Arc<dyn SuggestionStore>,
    options: Arc<dyn OptionStore>,
}

impl OptionDerivation {
    pub fn new(suggestions: Arc<dyn SuggestionStore>, options: Arc<dyn OptionStore>) -> Self {
        Self {
            suggestions,
            options,
        }
    }
}

#[async_trait]
impl CompletionAction for OptionDerivation {
    fn name(&self) -> &'static str {
        "option-derivation"
    }

    async fn run(&self, trip_id: &TripId) -> Result<(), DomainError> {
        let submitted = self.suggestions.submitted(trip_id).await?;
        let catalogue = derive_catalogue(&submitted);
        info!(
            "Derived {} options for {} from {} submitted sets",
            catalogue.len(),
            trip_id,
            submitted.len()
        );
        self.options.replace_options(trip_id, catalogue).await?;
        Ok(())
    }
}

//! Suggestion sets - each member's proposed itinerary
//!
//! A [`SuggestionSet`] is created on a member's first authoring action and
//! moves from [`SuggestionStatus::Draft`] to [`SuggestionStatus::Submitted`]
//! exactly once. Only submitted sets feed option derivation.

use crate::core::error::DomainError;
use crate::core::ids::{TripId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of an itinerary activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Attraction,
    Travel,
    Food,
    Entertainment,
    Accommodation,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Attraction => "attraction",
            ActivityType::Travel => "travel",
            ActivityType::Food => "food",
            ActivityType::Entertainment => "entertainment",
            ActivityType::Accommodation => "accommodation",
        }
    }
}

/// A single itinerary activity.
///
/// Coordinates are carried as opaque data for rendering; nothing in the
/// coordination core computes with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: String,
    pub activity_name: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub activity_description: String,
    pub from_date_time: DateTime<Utc>,
    pub to_date_time: DateTime<Utc>,
    pub start_location: String,
    #[serde(default)]
    pub start_lat: f64,
    #[serde(default)]
    pub start_lon: f64,
    pub end_location: String,
    #[serde(default)]
    pub end_lat: f64,
    #[serde(default)]
    pub end_lon: f64,
}

/// One day of a proposed itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    /// 1-based day number
    pub day: u32,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A candidate set as exchanged with the external generator.
///
/// This is the `priorCandidateSet` / `newCandidateSet` of
/// `generate(query, prior)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateSet {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub days: Vec<ItineraryDay>,
    #[serde(default)]
    pub cuisines: Vec<String>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.activities.is_empty()) && self.cuisines.is_empty()
    }
}

/// Authoring status of a suggestion set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Draft,
    Submitted,
}

/// A member's proposed itinerary for a trip (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub candidates: CandidateSet,
    pub status: SuggestionStatus,
}

impl SuggestionSet {
    /// Start a new draft
    pub fn draft(trip_id: TripId, user_id: UserId, candidates: CandidateSet) -> Self {
        Self {
            trip_id,
            user_id,
            candidates,
            status: SuggestionStatus::Draft,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == SuggestionStatus::Submitted
    }

    /// Replace the draft content; rejected once submitted.
    pub fn revise(&mut self, candidates: CandidateSet) -> Result<(), DomainError> {
        self.ensure_draft()?;
        self.candidates = candidates;
        Ok(())
    }

    /// Flip draft -> submitted; a second submit is rejected.
    pub fn submit(&mut self) -> Result<(), DomainError> {
        self.ensure_draft()?;
        self.status = SuggestionStatus::Submitted;
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), DomainError> {
        if self.is_submitted() {
            return Err(DomainError::AlreadySubmitted {
                trip: self.trip_id.to_string(),
                user: self.user_id.to_string(),
            });
        }
        Ok(())
    }
}

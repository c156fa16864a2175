//! Application layer for vibecation
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatParams, SessionParams};
pub use ports::{
    audit_log::{AuditEvent, AuditLog, NoAuditLog},
    candidate_generator::{CandidateGenerator, GeneratorError},
    message_broker::{BrokerEnvelope, BrokerError, BrokerStream, MessageBroker},
    phase_notifier::{NoPhaseNotifier, PhaseNotifier},
    store::{
        ChatStore, CompletionStore, DecisionStore, MembershipDirectory, NewTrip, OptionStore,
        StoreError, SuggestionStore, Versioned, VoteStore,
    },
    subscriber_registry::{
        ConnectionId, DeliveryReport, LocalSubscriberRegistry, SubscriberRegistry,
    },
};
pub use use_cases::cast_vote::{CastVoteInput, CastVoteUseCase};
pub use use_cases::chat::{ChatConnection, ChatHub, ChatService};
pub use use_cases::complete_phase::{CompletePhaseUseCase, CompletionAction};
pub use use_cases::derive_options::OptionDerivation;
pub use use_cases::finalize_decision::DecisionFinalizer;
pub use use_cases::poll::PollUseCase;
pub use use_cases::suggestions::SuggestionUseCase;
pub use use_cases::trips::TripUseCase;

//! Candidate generator adapters
//!
//! | Adapter | When |
//! |---------|------|
//! | [`SampleItineraryGenerator`] | default, no network |
//! | `HttpCandidateGenerator` | `[generator] endpoint` set, `remote-generator` feature |

#[cfg(feature = "remote-generator")]
mod http;
mod sample;

#[cfg(feature = "remote-generator")]
pub use http::HttpCandidateGenerator;
pub use sample::SampleItineraryGenerator;

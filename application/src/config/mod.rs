//! Application-level configuration.
//!
//! - [`SessionParams`] - retry limits, decision policy and chat sizing
//! - [`ChatParams`] - live channel sizing

pub mod session_params;

pub use session_params::{ChatParams, SessionParams};

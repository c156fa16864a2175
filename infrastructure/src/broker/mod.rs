//! Message broker adapters

mod in_process;

pub use in_process::InProcessBroker;

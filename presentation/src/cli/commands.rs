//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for vibecation
#[derive(Parser, Debug)]
#[command(name = "vibecation")]
#[command(author, version, about = "Group trip planning coordinator")]
#[command(long_about = r#"
Vibecation coordinates a group deciding on a trip together.

A trip moves through two phases, each closed once every member marks it done:
1. Brainstorm: members draft and submit itinerary suggestions
2. Polling: members vote up or down on the derived activities, locations
   and cuisines; the top-ranked options become the trip's decision

Members can talk in a live per-trip chat the whole time.

Configuration files are loaded from (in priority order):
1. VIBECATION_* environment variables (e.g. VIBECATION_SERVER__BIND)
2. --config <path>        Explicit config file
3. ./vibecation.toml      Project-level config
4. ~/.config/vibecation/config.toml   Global config

Example:
  vibecation serve --bind 0.0.0.0:8080
  vibecation -vv --config ./staging.toml serve
  vibecation show-config
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Show configuration file locations and the effective configuration
    ShowConfig,
}

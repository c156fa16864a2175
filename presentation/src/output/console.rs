//! Console output for the `serve` banner and `show-config`

use colored::Colorize;
use std::net::SocketAddr;
use std::path::PathBuf;
use vibecation_application::SessionParams;

/// Formats startup and configuration reports for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Banner printed once the server is listening
    pub fn server_banner(addr: &SocketAddr, params: &SessionParams) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Vibecation"));
        output.push('\n');
        output.push_str(&format!(
            "{} http://{}\n{} ws://{}/trips/{{trip}}/chat\n",
            "Listening:".cyan().bold(),
            addr,
            "Chat:".cyan().bold(),
            addr
        ));
        output.push_str(&Self::session_params(params));
        output.push_str(&Self::footer());
        output
    }

    /// Config file locations, marking which ones exist
    pub fn config_sources(sources: &[(&'static str, PathBuf, bool)]) -> String {
        let mut output = Self::section_header("Configuration files");
        if sources.is_empty() {
            output.push_str(&format!("  {}\n", "(none)".dimmed()));
        }
        for (label, path, exists) in sources {
            let marker = if *exists {
                "found".green()
            } else {
                "missing".dimmed()
            };
            output.push_str(&format!("  {:<8} {} [{}]\n", label, path.display(), marker));
        }
        output
    }

    /// Effective tuning parameters
    pub fn session_params(params: &SessionParams) -> String {
        let mut output = Self::section_header("Session parameters");
        let rows = [
            ("CAS retries", params.max_cas_retries.to_string()),
            ("Min net score", params.decision.min_net_score.to_string()),
            ("Top N", params.decision.top_n.to_string()),
            ("Conn buffer", params.chat.connection_buffer.to_string()),
            (
                "History page",
                format!(
                    "{} (max {})",
                    params.chat.default_history_limit, params.chat.max_history_limit
                ),
            ),
            (
                "Reconnect",
                format!("{}s", params.chat.reconnect_backoff_secs),
            ),
        ];
        for (label, value) in rows {
            output.push_str(&format!("  {:<14} {}\n", label.dimmed(), value));
        }
        output
    }

    /// One validation finding
    pub fn issue(is_error: bool, message: &str) -> String {
        if is_error {
            format!("{} {}", "error:".red().bold(), message)
        } else {
            format!("{} {}", "warning:".yellow().bold(), message)
        }
    }

    /// Merged configuration rendered as TOML
    pub fn effective_config(toml: &str) -> String {
        format!(
            "{}{}\n",
            Self::section_header("Effective configuration"),
            Self::indent(toml.trim_end(), "  ")
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

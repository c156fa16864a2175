//! Configuration issues reported by [`FileConfig::validate`](super::FileConfig::validate)

/// How serious a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the service cannot start with this configuration.
    Error,
    /// Non-fatal: a fallback value is used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A value is outside its allowed range.
    InvalidConstraint { field: String },
    /// A value could not be parsed.
    InvalidValue { field: String, value: String },
    /// A section is set but the feature backing it is not compiled in.
    UnavailableFeature { section: String, feature: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub(super) fn constraint(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: ConfigIssueCode::InvalidConstraint {
                field: field.to_string(),
            },
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

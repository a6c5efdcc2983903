//! Error types for the orphan audit
//!
//! Every failure the audit can hit maps onto one of four severities:
//! fatal environment errors, retryable metrics transport errors,
//! expected absences, and locally-recovered degradations.

use thiserror::Error;

/// Unified error type for the audit
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Environment Errors (fatal)
    // =========================================================================
    #[error("Required tool not available: {tool}")]
    MissingTool { tool: String, verify: String },

    #[error("Control-plane access failed: {reason}")]
    ControlPlaneAuth { reason: String, verify: String },

    #[error("Storage cluster unreachable: {reason}")]
    StorageUnreachable { reason: String, verify: String },

    #[error("Metrics endpoint unreachable (tried: {})", tried.join(", "))]
    MetricsUnreachable { tried: Vec<String>, verify: String },

    #[error("Metrics endpoint {endpoint} found but no bearer token could be obtained")]
    MissingMetricsToken { endpoint: String, verify: String },

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // Metrics Errors
    // =========================================================================
    #[error("Metrics transport error: {0}")]
    MetricsTransport(#[from] reqwest::Error),

    #[error("Metrics query returned non-success ({status}): {body}")]
    MetricsQueryStatus { status: String, body: String },

    #[error("Metrics query failed after {attempts} attempts: {query}")]
    MetricsQueryExhausted {
        query: String,
        endpoint: String,
        attempts: u32,
        last_body: String,
        reproduce: String,
    },

    #[error("Metrics range query failed: {query}: {reason}")]
    MetricsRangeFailed {
        query: String,
        endpoint: String,
        reason: String,
        reproduce: String,
    },

    // =========================================================================
    // Storage Admin Errors
    // =========================================================================
    #[error("Storage admin command failed: {command} - {reason}")]
    AdminCommand { command: String, reason: String },

    #[error("Storage subsystem not present: {subsystem}")]
    SubsystemAbsent { subsystem: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Size parse error: {0}")]
    SizeParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid naming pattern: {0}")]
    Pattern(#[from] regex::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the audit reacts to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the run with a diagnostic
    Fatal,
    /// Retry with fixed backoff, then promote to fatal
    Retryable,
    /// Substitute an empty collection
    ExpectedAbsence,
    /// Fold into zeroed fields
    Degraded,
}

impl Error {
    /// Classify this error
    pub fn severity(&self) -> Severity {
        match self {
            Error::MetricsTransport(_) | Error::MetricsQueryStatus { .. } => Severity::Retryable,

            Error::SubsystemAbsent { .. } => Severity::ExpectedAbsence,

            Error::AdminCommand { .. } | Error::SizeParse(_) | Error::JsonParse(_) => {
                Severity::Degraded
            }

            Error::Kube(kube::Error::Api(resp)) if resp.code == 404 => Severity::ExpectedAbsence,

            _ => Severity::Fatal,
        }
    }

    /// Check if this error is retried by the metrics query path
    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Retryable
    }

    /// Check if this error means "resource type not installed"
    pub fn is_absence(&self) -> bool {
        self.severity() == Severity::ExpectedAbsence
    }

    /// Literal command an operator can run to investigate
    pub fn verify_command(&self) -> Option<&str> {
        match self {
            Error::MissingTool { verify, .. }
            | Error::ControlPlaneAuth { verify, .. }
            | Error::StorageUnreachable { verify, .. }
            | Error::MetricsUnreachable { verify, .. }
            | Error::MissingMetricsToken { verify, .. } => Some(verify),
            Error::MetricsQueryExhausted { reproduce, .. }
            | Error::MetricsRangeFailed { reproduce, .. } => Some(reproduce),
            _ => None,
        }
    }

    /// Multi-line diagnostic block printed to stderr before a fatal exit
    pub fn diagnostic(&self) -> String {
        let mut out = format!("FATAL: {}\n", self);
        match self {
            Error::MetricsQueryExhausted {
                query,
                endpoint,
                attempts,
                last_body,
                ..
            } => {
                out.push_str(&format!("  query:     {}\n", query));
                out.push_str(&format!("  endpoint:  {}\n", endpoint));
                out.push_str(&format!("  attempts:  {}\n", attempts));
                out.push_str(&format!("  last body: {}\n", last_body));
            }
            Error::MetricsRangeFailed {
                query,
                endpoint,
                reason,
                ..
            } => {
                out.push_str(&format!("  query:     {}\n", query));
                out.push_str(&format!("  endpoint:  {}\n", endpoint));
                out.push_str(&format!("  reason:    {}\n", reason));
            }
            Error::MetricsUnreachable { tried, .. } => {
                for source in tried {
                    out.push_str(&format!("  tried:     {}\n", source));
                }
            }
            _ => {}
        }
        if let Some(cmd) = self.verify_command() {
            out.push_str(&format!("  verify:    {}\n", cmd));
        }
        out
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Configuration(_) | Error::Pattern(_) | Error::YamlParse(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for the audit
pub type Result<T> = std::result::Result<T, Error>;

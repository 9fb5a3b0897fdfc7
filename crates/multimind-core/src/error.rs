//! Error taxonomy for dispatch rounds and report persistence
//!
//! Every adapter classifies failures into the same [`QueryError`] variants,
//! regardless of the provider's wire format. Classification is structural
//! (transport error kinds, HTTP status codes, parsed error bodies) — never
//! substring matching on free-text messages.

use thiserror::Error;

/// Why a single provider query failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Pre-flight reachability check failed before any provider call.
    #[error("network unreachable")]
    NoNetwork,

    /// Credential required but absent or blank.
    #[error("credential required but not provided")]
    MissingCredential,

    /// Provider rejected the credential (401/403-equivalent).
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// Provider signalled quota exhaustion (429-equivalent).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The model identifier was rejected but the credential may be valid.
    /// This is the signal that lets the fallback cascade continue.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Any other non-2xx or malformed response.
    #[error("upstream error (status {status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// The call exceeded its bounded wait.
    #[error("request timed out")]
    Timeout,

    /// Catch-all wrapping the raw message for diagnostics.
    #[error("{0}")]
    Unknown(String),
}

impl QueryError {
    /// Whether this failure is tied to the credential or account rather
    /// than a specific model. Account-level errors terminate the fallback
    /// cascade because retrying with a different model cannot help.
    pub fn is_account_level(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::RateLimited(_))
    }

    /// Map an HTTP status and error detail onto the taxonomy.
    ///
    /// Adapters refine this with structured fields from their provider's
    /// error body before falling back to the plain status mapping.
    pub fn from_status(status: reqwest::StatusCode, detail: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Authentication(detail),
            429 => Self::RateLimited(detail),
            404 => Self::ModelUnavailable(detail),
            s => Self::Upstream { status: s, detail },
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::NoNetwork
        } else {
            Self::Unknown(err.to_string())
        }
    }

    /// Short stable label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoNetwork => "no_network",
            Self::MissingCredential => "missing_credential",
            Self::Authentication(_) => "authentication",
            Self::RateLimited(_) => "rate_limited",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::Upstream { .. } => "upstream",
            Self::Timeout => "timeout",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Fail-fast validation errors raised before any network activity in a
/// dispatch round. Per-provider failures never surface here — they land in
/// the round's result set instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no providers selected")]
    EmptySelection,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("missing API key for provider: {0}")]
    MissingCredential(String),
}

/// Failure to write the report artifact.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The result set contains no successful outcome. Callers are expected
    /// to skip persistence entirely in that case; this variant is the
    /// guard rail against writing an empty, misleading artifact.
    #[error("no successful outcomes to persist")]
    NoSuccessfulOutcomes,

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

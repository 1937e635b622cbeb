//! Error taxonomy for the license validation engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for engine operations.
pub type LcpResult<T> = Result<T, LcpError>;

/// Why a license is not currently usable, despite parsing and signature
/// checks succeeding. Carried as the `Right` alternative of
/// [`crate::document::ValidatedDocuments`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LicenseStatusError {
    /// The license's rights window has not started yet.
    #[error("license is not usable until {0}")]
    NotStarted(DateTime<Utc>),

    /// The license's rights window has ended.
    #[error("license expired on {0}")]
    Expired(DateTime<Utc>),

    /// The user returned the license.
    #[error("license was returned on {0}")]
    Returned(DateTime<Utc>),

    /// The license was revoked by the issuer.
    #[error("license was revoked on {0} ({1} device(s) registered)")]
    Revoked(DateTime<Utc>, u32),

    /// The license was cancelled by the issuer.
    #[error("license was cancelled on {0}")]
    Cancelled(DateTime<Utc>),
}

/// Structured, localizable description of a user-visible outcome.
///
/// The engine never renders text; it emits an identifier plus structured
/// args and leaves localization to a repository collaborator upstream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserMessage {
    /// Localizable message identifier, e.g. `"lcp.license_expired"`.
    pub id: String,
    /// Structured arguments keyed by name (dates, counts, ...).
    pub args: std::collections::BTreeMap<String, String>,
    /// Quantity for plural-form selection, if applicable.
    pub quantity: Option<u32>,
}

impl UserMessage {
    /// Creates a message with no args.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: std::collections::BTreeMap::new(),
            quantity: None,
        }
    }

    /// Attaches a structured argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.insert(key.into(), value.to_string());
        self
    }

    /// Attaches a plural-form quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// The complete error taxonomy for a validation run.
#[derive(Debug, Error)]
pub enum LcpError {
    /// The license's encryption profile is not one the engine supports.
    #[error("license profile not supported: {0}")]
    LicenseProfileNotSupported(String),

    /// Transport or timeout failure talking to a status/license server.
    #[error("network error: {0}")]
    Network(String),

    /// The license parsed and the status was checked, but the license is
    /// not currently usable.
    #[error("license status: {0}")]
    LicenseStatus(#[from] LicenseStatusError),

    /// The native crypto layer rejected the license/passphrase/CRL
    /// combination.
    #[error("license integrity check failed: {0}")]
    LicenseIntegrityFailed(String),

    /// The container collaborator failed to open the publication archive.
    #[error("container open failed: {0}")]
    ContainerOpenFailed(String),

    /// A collaborator returned malformed JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An event was raised against a state that does not accept it. This is
    /// a programmer error, never a user-facing condition.
    #[error("illegal transition: {0:?} does not accept {1}")]
    IllegalTransition(String, String),
}

impl LcpError {
    /// Builds the localizable [`UserMessage`] for this error.
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::LicenseProfileNotSupported(profile) => {
                UserMessage::new("lcp.profile_not_supported").with_arg("profile", profile)
            }
            Self::Network(cause) => UserMessage::new("lcp.network_error").with_arg("cause", cause),
            Self::LicenseStatus(LicenseStatusError::NotStarted(date)) => {
                UserMessage::new("lcp.not_started").with_arg("date", date.to_rfc3339())
            }
            Self::LicenseStatus(LicenseStatusError::Expired(date)) => {
                UserMessage::new("lcp.expired").with_arg("date", date.to_rfc3339())
            }
            Self::LicenseStatus(LicenseStatusError::Returned(date)) => {
                UserMessage::new("lcp.returned").with_arg("date", date.to_rfc3339())
            }
            Self::LicenseStatus(LicenseStatusError::Revoked(date, count)) => {
                UserMessage::new("lcp.revoked")
                    .with_arg("date", date.to_rfc3339())
                    .with_arg("count", count)
                    .with_quantity(*count)
            }
            Self::LicenseStatus(LicenseStatusError::Cancelled(date)) => {
                UserMessage::new("lcp.cancelled").with_arg("date", date.to_rfc3339())
            }
            Self::LicenseIntegrityFailed(cause) => {
                UserMessage::new("lcp.integrity_failed").with_arg("cause", cause)
            }
            Self::ContainerOpenFailed(cause) => {
                UserMessage::new("lcp.container_open_failed").with_arg("cause", cause)
            }
            Self::Serialization(cause) => {
                UserMessage::new("lcp.serialization_error").with_arg("cause", cause.to_string())
            }
            Self::IllegalTransition(state, event) => UserMessage::new("lcp.illegal_transition")
                .with_arg("state", state)
                .with_arg("event", event),
        }
    }
}

//! Collaborator contracts (C1): the typed interfaces the engine consumes
//! but never implements itself. Production code injects real
//! network/crypto/UI-backed implementations; tests inject the fixtures in
//! `tests/common`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::document::{LicenseDocument, LinkInfo, StatusDocument};
use crate::error::LcpResult;
use crate::document::DrmContext;

/// Opaque authentication context forwarded to the passphrase collaborator.
/// The engine never inspects it.
#[derive(Debug, Clone, Default)]
pub struct Authentication(pub Option<String>);

/// Opaque caller tag forwarded to the passphrase collaborator (e.g. a UI
/// window handle or request id). The engine never inspects it.
#[derive(Debug, Clone, Default)]
pub struct Sender(pub Option<String>);

/// Fetches bytes over the network with a caller-supplied timeout.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Fetches `url`, failing with [`crate::error::LcpError::Network`] if
    /// the request errors or exceeds `timeout`.
    async fn fetch(&self, url: &url::Url, timeout: Duration) -> LcpResult<Vec<u8>>;
}

/// Retrieves the Certificate Revocation List consumed by the native crypto
/// layer.
#[async_trait]
pub trait CrlService: Send + Sync {
    /// Returns the current CRL blob.
    async fn retrieve(&self) -> LcpResult<Vec<u8>>;
}

/// Registers device usage of a license with the status server.
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// POSTs device-registration data to `link`. Failures here are
    /// non-fatal to the caller (see [`crate::effects`]); this method still
    /// returns a `Result` so the handler can log the cause.
    async fn register_license(
        &self,
        license: &dyn LicenseDocument,
        link: &LinkInfo,
    ) -> LcpResult<Vec<u8>>;
}

/// Acquires the passphrase that unlocks a license, possibly interactively.
#[async_trait]
pub trait PassphrasesService: Send + Sync {
    /// Returns `None` if the user declines (or no candidate is available
    /// and `allow_user_interaction` is false), which the engine reads as a
    /// cancellation, never an error.
    async fn request(
        &self,
        license: &dyn LicenseDocument,
        authentication: &Authentication,
        allow_user_interaction: bool,
        sender: &Sender,
    ) -> LcpResult<Option<String>>;
}

/// The native cryptographic primitive. Out of scope to implement here —
/// this crate only defines the contract the engine drives.
#[async_trait]
pub trait LcpClient: Send + Sync {
    /// Builds a DRM context from the license bytes, passphrase, and CRL.
    /// Any failure becomes [`crate::error::LcpError::LicenseIntegrityFailed`].
    async fn create_context(
        &self,
        raw_json: &[u8],
        passphrase: &str,
        crl: &[u8],
    ) -> LcpResult<DrmContext>;

    /// Used only by the production-mode self-test (see
    /// [`crate::production`]): tries each candidate passphrase against the
    /// given license bytes and returns the first that validates.
    async fn find_one_valid_passphrase(
        &self,
        raw_json: &[u8],
        candidates: &[String],
    ) -> Option<String>;
}

/// Parses raw License Document bytes into an opaque, validated handle.
#[async_trait]
pub trait LicenseParser: Send + Sync {
    /// Parses `bytes`. Infallible on success; rejects malformed input.
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn LicenseDocument>>;
}

/// Parses raw Status Document bytes into an opaque, validated handle.
#[async_trait]
pub trait StatusParser: Send + Sync {
    /// Parses `bytes`. Infallible on success; rejects malformed input.
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn StatusDocument>>;
}

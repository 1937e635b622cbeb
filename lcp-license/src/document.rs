//! Document wrappers: the tagged input envelope, the opaque license/status
//! document contracts, and the terminal success payload.
//!
//! The engine never parses or constructs these documents itself — it only
//! holds `Arc<dyn ...>` handles produced by injected parser collaborators
//! (see [`crate::collaborators`]).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::LicenseStatusError;

/// Media type of a License Document link, per the Readium LCP spec.
pub const LICENSE_DOCUMENT_MEDIA_TYPE: &str = "application/vnd.readium.lcp.license.v1+json";
/// Media type of a Status Document link, per the Readium LCP spec.
pub const STATUS_DOCUMENT_MEDIA_TYPE: &str = "application/vnd.readium.license.status.v1+json";

/// Link relation for the status-document link carried by a license.
pub const REL_STATUS: &str = "status";
/// Link relation for the fresher-license link carried by a status document.
pub const REL_LICENSE: &str = "license";
/// Link relation for the device-registration endpoint.
pub const REL_REGISTER: &str = "register";

/// The baseline LCP encryption profile every conformant client must accept.
pub const BASIC_PROFILE: &str = "http://readium.org/lcp/basic-profile";

/// Encryption profiles this engine accepts at integrity-validation time.
/// Checked unconditionally; see [`crate::production`] for the separate,
/// development-only gate applied earlier at parse time.
pub const SUPPORTED_PROFILES: &[&str] = &[BASIC_PROFILE, "http://readium.org/lcp/profile-1.0"];

/// A resolved link: destination plus the media type the server advertised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// The link target.
    pub href: Url,
    /// The advertised media type, if any.
    pub media_type: Option<String>,
}

/// Lifecycle value carried by a Status Document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusValue {
    Ready,
    Active,
    Expired,
    Returned,
    Revoked,
    Cancelled,
}

/// A single entry in a Status Document's event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    /// The event type (e.g. `"register"`, `"renew"`, `"return"`).
    pub event_type: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

/// A parsed License Document, opaque to the engine beyond this contract.
pub trait LicenseDocument: std::fmt::Debug + Send + Sync {
    /// The original, unmodified bytes the document was parsed from. This is
    /// what gets handed to [`crate::collaborators::LcpClient::create_context`].
    fn raw_json(&self) -> &[u8];

    /// The URI identifying the LCP encryption profile in use.
    fn profile(&self) -> &str;

    /// Start of the rights window, if the license imposes one.
    fn rights_start(&self) -> Option<DateTime<Utc>>;

    /// End of the rights window, if the license imposes one.
    fn rights_end(&self) -> Option<DateTime<Utc>>;

    /// Resolves a link by relation, optionally preferring a media type.
    fn url(&self, rel: &str, preferred_type: Option<&str>) -> Option<LinkInfo>;
}

/// A parsed Status Document, opaque to the engine beyond this contract.
pub trait StatusDocument: std::fmt::Debug + Send + Sync {
    /// The current lifecycle status.
    fn status(&self) -> StatusValue;

    /// When `status` was last updated by the server.
    fn status_updated(&self) -> DateTime<Utc>;

    /// Events of the given type, in the order the server reported them.
    fn events(&self, event_type: &str) -> Vec<StatusEvent>;

    /// Resolves a link by relation, optionally preferring a media type.
    fn url(&self, rel: &str, preferred_type: Option<&str>) -> Option<LinkInfo>;

    /// The `license` link, if the server advertises a fresher license.
    fn license_link(&self) -> Option<LinkInfo> {
        self.url(REL_LICENSE, Some(LICENSE_DOCUMENT_MEDIA_TYPE))
    }
}

/// The tagged input to [`crate::engine::ValidationEngine::validate`]: raw
/// bytes the caller has not yet parsed, disambiguated by which entry point
/// produced them. Matched exhaustively so the façade can never confuse a
/// license payload for a status payload.
#[derive(Debug, Clone)]
pub enum Input {
    /// Raw License Document bytes.
    License(Vec<u8>),
    /// Raw Status Document bytes.
    Status(Vec<u8>),
}

/// Opaque cryptographic handle produced by the native crypto layer. The
/// engine moves this around but never inspects its contents; it zeroizes
/// its backing bytes on drop the way `privstack-crypto::key::DerivedKey`
/// zeroizes derived key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DrmContext {
    bytes: Vec<u8>,
}

impl DrmContext {
    /// Wraps opaque context bytes produced by `LcpClient::create_context`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the opaque context bytes. Only downstream decryption code
    /// (outside this engine) should ever read these.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for DrmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrmContext")
            .field("bytes", &"[REDACTED]")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Whether integrity validation succeeded or the license was merely found
/// to be currently unusable. Exactly one alternative is ever populated.
#[derive(Debug, Clone)]
pub enum LicenseOutcome {
    /// Integrity validation succeeded; decryption may proceed.
    Context(DrmContext),
    /// The license is not currently usable (expired, revoked, ...).
    Status(LicenseStatusError),
}

/// The terminal success payload of a validation run.
#[derive(Debug, Clone)]
pub struct ValidatedDocuments {
    /// The (possibly refreshed) license that was validated.
    pub license: Arc<dyn LicenseDocument>,
    /// Either a usable DRM context or the reason the license isn't usable.
    pub outcome: LicenseOutcome,
    /// The Status Document, if one was fetched during this run.
    pub status: Option<Arc<dyn StatusDocument>>,
}

//! The finite set of events that drive state transitions (C4, events half).

use std::sync::Arc;

use crate::document::{DrmContext, LicenseDocument, StatusDocument};
use crate::error::{LcpError, LicenseStatusError};

/// An event raised by the façade or a side effect, consumed by
/// [`crate::transition::transition`].
#[derive(Debug)]
pub enum Event {
    /// Raw license bytes arrived (from the façade or a refresh fetch).
    RetrievedLicenseData(Vec<u8>),
    /// Raw status bytes arrived (from the façade or a status fetch).
    RetrievedStatusData(Vec<u8>),
    /// The license bytes parsed (and passed the profile gate, in
    /// development mode).
    ValidatedLicense(Arc<dyn LicenseDocument>),
    /// The status bytes parsed.
    ValidatedStatus(Arc<dyn StatusDocument>),
    /// The time-window/status-value reconciliation completed; `None` means
    /// the license is currently usable.
    CheckedLicenseStatus(Option<LicenseStatusError>),
    /// The passphrase collaborator returned a passphrase.
    RetrievedPassphrase(String),
    /// The native crypto layer built a DRM context.
    ValidatedIntegrity(DrmContext),
    /// The device-registration collaborator returned (successfully or not
    /// — registration failure is non-fatal, see [`crate::effects`]).
    RegisteredDevice(Vec<u8>),
    /// A side effect failed.
    Failed(LcpError),
    /// The user declined to supply a passphrase.
    Cancelled,
}

impl Event {
    /// A short, stable label for logging. Never includes document
    /// contents or secrets.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RetrievedLicenseData(_) => "RetrievedLicenseData",
            Self::RetrievedStatusData(_) => "RetrievedStatusData",
            Self::ValidatedLicense(_) => "ValidatedLicense",
            Self::ValidatedStatus(_) => "ValidatedStatus",
            Self::CheckedLicenseStatus(_) => "CheckedLicenseStatus",
            Self::RetrievedPassphrase(_) => "RetrievedPassphrase",
            Self::ValidatedIntegrity(_) => "ValidatedIntegrity",
            Self::RegisteredDevice(_) => "RegisteredDevice",
            Self::Failed(_) => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

//! The finite state model (C4, states half) driven by [`crate::transition`].

use std::sync::Arc;

use crate::document::{LicenseDocument, LinkInfo, StatusDocument, ValidatedDocuments};
use crate::error::LcpError;

/// Context carried across a single validation run that doesn't fit neatly
/// into one transition-table cell: the most recently validated license and
/// status, and whether a license refresh has already been attempted.
///
/// This is *not* engine configuration (collaborators) — see the design
/// note in spec.md §9 about passing configuration to the handler
/// explicitly rather than via a back-pointer. `RunContext` is run-local
/// data, threaded through state variants the same way `SyncEngine` threads
/// `SyncState` through message handlers.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// The most recently validated license in this run, if any.
    pub license: Option<Arc<dyn LicenseDocument>>,
    /// The status document fetched in this run, if any.
    pub status: Option<Arc<dyn StatusDocument>>,
    /// Whether a license refresh has already been attempted this run.
    /// Guards against re-entering `FetchLicense` in a loop.
    pub status_already_fetched: bool,
}

impl RunContext {
    /// Returns a copy with `license` set.
    #[must_use]
    pub fn with_license(mut self, license: Arc<dyn LicenseDocument>) -> Self {
        self.license = Some(license);
        self
    }

    /// Returns a copy with `status` set.
    #[must_use]
    pub fn with_status(mut self, status: Arc<dyn StatusDocument>) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns a copy with the refresh-attempted flag raised.
    #[must_use]
    pub fn mark_fetched(mut self) -> Self {
        self.status_already_fetched = true;
        self
    }
}

/// The finite set of states the engine can occupy during a single
/// validation run.
#[derive(Debug)]
pub enum State {
    /// Initial state; no work done.
    Start,
    /// Raw license bytes awaiting parse.
    ValidateLicense { data: Vec<u8>, ctx: RunContext },
    /// License parsed; status fetch in flight.
    FetchStatus {
        license: Arc<dyn LicenseDocument>,
        ctx: RunContext,
    },
    /// Raw status bytes awaiting parse.
    ValidateStatus { data: Vec<u8>, ctx: RunContext },
    /// Status says a fresher license exists; fetch in flight.
    FetchLicense {
        status: Arc<dyn StatusDocument>,
        ctx: RunContext,
    },
    /// Reconcile time window and status value.
    CheckLicenseStatus {
        license: Arc<dyn LicenseDocument>,
        status: Option<Arc<dyn StatusDocument>>,
    },
    /// Prompt the user / query the store for a passphrase.
    RetrievePassphrase {
        license: Arc<dyn LicenseDocument>,
        status: Option<Arc<dyn StatusDocument>>,
    },
    /// Invoke native crypto to build the DRM context.
    ValidateIntegrity {
        license: Arc<dyn LicenseDocument>,
        passphrase: String,
        status: Option<Arc<dyn StatusDocument>>,
    },
    /// Optional POST to the status server recording device usage.
    RegisterDevice {
        documents: ValidatedDocuments,
        link: LinkInfo,
    },
    /// Terminal: successful validation (possibly with a non-usable status).
    Valid(ValidatedDocuments),
    /// Terminal: unrecoverable failure.
    Failure(LcpError),
    /// Terminal: the user declined to supply a passphrase.
    Cancelled,
}

impl State {
    /// A short, stable label for logging and error messages. Never
    /// includes document contents.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::ValidateLicense { .. } => "ValidateLicense",
            Self::FetchStatus { .. } => "FetchStatus",
            Self::ValidateStatus { .. } => "ValidateStatus",
            Self::FetchLicense { .. } => "FetchLicense",
            Self::CheckLicenseStatus { .. } => "CheckLicenseStatus",
            Self::RetrievePassphrase { .. } => "RetrievePassphrase",
            Self::ValidateIntegrity { .. } => "ValidateIntegrity",
            Self::RegisterDevice { .. } => "RegisterDevice",
            Self::Valid(_) => "Valid",
            Self::Failure(_) => "Failure",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether this state is terminal (`Valid`, `Failure`, or `Cancelled`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Valid(_) | Self::Failure(_) | Self::Cancelled)
    }
}

//! License validation engine for Readium LCP-protected publications.
//!
//! Drives a License or Status Document through parsing, status
//! reconciliation, passphrase acquisition, and integrity validation via a
//! pure transition table plus an injected side-effect handler. See
//! [`engine::ValidationEngine`] for the public entry point.

pub mod collaborators;
pub mod document;
pub mod effects;
pub mod engine;
pub mod error;
pub mod event;
#[cfg(feature = "network")]
pub mod net;
pub mod observer;
pub mod production;
pub mod settings;
pub mod state;
pub mod transition;

pub use collaborators::{
    Authentication, CrlService, DeviceService, LcpClient, LicenseParser, NetworkClient,
    PassphrasesService, Sender, StatusParser,
};
pub use document::{
    DrmContext, Input, LicenseDocument, LicenseOutcome, LinkInfo, StatusDocument, StatusEvent,
    StatusValue, ValidatedDocuments,
};
pub use engine::{EngineConfig, ValidationEngine};
pub use error::{LcpError, LcpResult, LicenseStatusError, UserMessage};
pub use event::Event;
pub use observer::{ObserverFn, ObserverPolicy, Outcome};
pub use production::ProductionMode;
pub use settings::EngineSettings;
pub use state::State;

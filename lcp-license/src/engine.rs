//! The façade (C7): the public entry point that owns the collaborators,
//! drives the transition loop, and notifies observers on completion.
//! Grounded on `privstack-sync::engine::SyncEngine`'s shape — a config
//! struct of injected collaborators, an async driving loop guarded by a
//! mutex against concurrent re-entry, and engine-local observer state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::collaborators::{
    Authentication, CrlService, DeviceService, LcpClient, LicenseParser, NetworkClient,
    PassphrasesService, Sender, StatusParser,
};
use crate::document::{Input, LicenseDocument};
use crate::effects::{self, EffectContext};
use crate::event::Event;
use crate::observer::{ObserverFn, ObserverPolicy, ObserverRegistry, Outcome};
use crate::production::ProductionMode;
use crate::settings::EngineSettings;
use crate::state::State;
use crate::transition;

/// Every collaborator and behavior flag a [`ValidationEngine`] needs.
/// Constructed once by the caller and moved into the engine.
pub struct EngineConfig {
    /// Opaque authentication context forwarded to `passphrases`.
    pub authentication: Authentication,
    /// Whether the passphrase collaborator may prompt the user.
    pub allow_user_interaction: bool,
    /// Opaque caller tag forwarded to `passphrases`.
    pub sender: Sender,
    /// Ambient timeout and production-mode-override configuration.
    pub settings: EngineSettings,
    pub network: Arc<dyn NetworkClient>,
    pub crl: Arc<dyn CrlService>,
    pub device: Arc<dyn DeviceService>,
    pub passphrases: Arc<dyn PassphrasesService>,
    pub lcp_client: Arc<dyn LcpClient>,
    pub license_parser: Arc<dyn LicenseParser>,
    pub status_parser: Arc<dyn StatusParser>,
    /// Invoked synchronously the moment a license parses and (in
    /// development builds) clears the profile gate, mirroring
    /// `privstack-license`'s validation-observer hook. Not a terminal
    /// notification; see [`ValidationEngine::observe`] for that.
    pub on_license_validated: Arc<dyn Fn(Arc<dyn LicenseDocument>) + Send + Sync>,
}

/// Drives a single license/status document through validation.
///
/// Holds collaborators and observer state; each instance is scoped to one
/// publication unlock attempt (spec.md §5's lifecycle), though nothing
/// stops a caller from issuing more than one [`Self::validate`] call on the
/// same instance — `Always` observers hear every terminal entry that
/// follows their attachment.
pub struct ValidationEngine {
    config: EngineConfig,
    registry: ObserverRegistry,
    run_lock: Mutex<()>,
}

impl ValidationEngine {
    /// Builds a new engine around `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ObserverRegistry::new(),
            run_lock: Mutex::new(()),
        }
    }

    /// Whether this engine is currently resolving to run in production
    /// mode (see [`crate::production::ProductionMode::resolve`]).
    pub async fn is_production(&self) -> bool {
        ProductionMode::resolve(&self.config.settings, &self.config.lcp_client)
            .await
            .is_production()
    }

    /// Registers `callback` per [`ObserverRegistry::attach`]. Safe to call
    /// before, during, or after a [`Self::validate`] run.
    pub async fn observe(&self, policy: ObserverPolicy, callback: Box<ObserverFn>) {
        self.registry.attach(policy, callback).await;
    }

    /// Raises the initial event for `document`, attaches `observer` with
    /// [`ObserverPolicy::Once`], and drives the transition loop to
    /// completion. Only one run executes at a time per engine; a second
    /// concurrent call waits for the first to finish (spec.md §5 leaves
    /// concurrent validation undefined — we choose to serialize rather
    /// than race).
    pub async fn validate(&self, document: Input, observer: Box<ObserverFn>) {
        self.registry.attach(ObserverPolicy::Once, observer).await;
        let _guard = self.run_lock.lock().await;

        let ctx = EffectContext {
            config: &self.config,
            is_production: self.is_production().await,
        };

        let mut event = match document {
            Input::License(bytes) => Event::RetrievedLicenseData(bytes),
            Input::Status(bytes) => Event::RetrievedStatusData(bytes),
        };
        let mut state = State::Start;

        loop {
            state = transition::transition(state, event);
            tracing::debug!(state = state.label(), "transitioned");
            if state.is_terminal() {
                break;
            }
            event = effects::run(&state, &ctx).await;
        }

        let outcome = match state {
            State::Valid(documents) => Outcome::Valid(documents),
            State::Failure(error) => Outcome::Failure(Arc::new(error)),
            State::Cancelled => Outcome::Cancelled,
            _ => unreachable!("loop only exits once a terminal state is reached"),
        };
        self.registry.notify(outcome).await;
    }
}

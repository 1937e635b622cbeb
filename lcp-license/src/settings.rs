//! Ambient engine configuration: timeouts and retry tuning loaded from an
//! optional TOML file, grounded on
//! `privstack-plugin-host::policy::PolicyEngine::load_from` — parse
//! failures and missing files fall back to defaults with a logged warning,
//! they never fail the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Tunable, non-protocol behavior of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Timeout applied to status and license-refresh fetches.
    #[serde(default = "default_network_timeout_ms", rename = "network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// Overrides [`crate::production::ProductionMode::from_build`] when set;
    /// primarily for tests that need to force a branch regardless of build
    /// profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_override: Option<bool>,

    /// Configures the legacy bundled-test-license probe
    /// ([`crate::production::ProductionMode::from_probe`]). Consulted only
    /// when `production_override` is unset; overrides the build-profile
    /// default when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_probe: Option<ProductionProbeSettings>,
}

/// The bundled test license and known passphrase the legacy probe unlocks
/// against to distinguish a production build from a development one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionProbeSettings {
    /// Raw JSON text of the bundled test license.
    pub bundled_license_raw_json: String,
    /// The passphrase that should unlock `bundled_license_raw_json` in a
    /// genuine production build.
    pub known_passphrase: String,
}

impl EngineSettings {
    /// The 5-second network timeout from spec.md §3/§5, as a [`Duration`].
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Loads settings from `path` if it exists and parses as TOML. Falls
    /// back to [`EngineSettings::default`] (with a warning) on any error.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(?path, "no engine settings file found, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => {
                    info!(?path, "loaded engine settings");
                    settings
                }
                Err(e) => {
                    warn!(?path, error = %e, "failed to parse engine settings, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(?path, error = %e, "failed to read engine settings, using defaults");
                Self::default()
            }
        }
    }

    /// Loads settings from `~/.readium/lcp-license.toml`, if present.
    pub fn load() -> Self {
        Self::load_from(default_settings_path())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            network_timeout_ms: default_network_timeout_ms(),
            production_override: None,
            production_probe: None,
        }
    }
}

fn default_network_timeout_ms() -> u64 {
    5_000
}

fn default_settings_path() -> PathBuf {
    dirs_home().join(".readium").join("lcp-license.toml")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

//! Production-mode detection.
//!
//! The original Readium client embeds a bundled test license and a known
//! passphrase, and calls `LcpClient::find_one_valid_passphrase` against it
//! at startup: success means "production build", failure (or an
//! exception) means "development". spec.md §9 flags that probe as brittle
//! and permits replacing it with an explicit build-time flag, as long as
//! the observable contract holds: the non-production profile check at
//! license-parse time is skipped when running in production.
//!
//! We take that option. [`ProductionMode::from_build`] resolves from
//! `cfg!(debug_assertions)`, which is false in `--release` builds.

use std::sync::Arc;

use crate::collaborators::LcpClient;
use crate::settings::EngineSettings;

/// Whether the engine should enforce the development-mode profile check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionMode {
    /// A release build: the basic-profile check at parse time is skipped
    /// (the profile is still checked, just later, at integrity time).
    Production,
    /// A development build: the basic-profile check at parse time is
    /// enforced.
    Development,
}

impl ProductionMode {
    /// Resolves from the crate's build profile.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Reproduces the original bundled-test-license probe, for deployments
    /// that need the legacy behavior. Only reached via [`Self::resolve`]
    /// when [`EngineSettings::production_probe`] is configured; otherwise
    /// dormant in favor of [`Self::from_build`].
    pub async fn from_probe(
        lcp_client: &Arc<dyn LcpClient>,
        bundled_license_raw_json: &[u8],
        known_passphrase: &str,
    ) -> Self {
        let candidates = [known_passphrase.to_string()];
        match lcp_client
            .find_one_valid_passphrase(bundled_license_raw_json, &candidates)
            .await
        {
            Some(_) => Self::Production,
            None => Self::Development,
        }
    }

    /// Resolves the effective mode for `settings`: an explicit
    /// `production_override` wins outright; otherwise, if
    /// `production_probe` is configured, its outcome decides; otherwise
    /// falls back to [`Self::from_build`].
    pub async fn resolve(settings: &EngineSettings, lcp_client: &Arc<dyn LcpClient>) -> Self {
        if let Some(forced) = settings.production_override {
            return if forced { Self::Production } else { Self::Development };
        }
        if let Some(probe) = &settings.production_probe {
            return Self::from_probe(
                lcp_client,
                probe.bundled_license_raw_json.as_bytes(),
                &probe.known_passphrase,
            )
            .await;
        }
        Self::from_build()
    }

    /// Whether this mode should skip the development-only profile check.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedLcpClient {
        correct_passphrase: &'static str,
    }

    #[async_trait]
    impl LcpClient for FixedLcpClient {
        async fn create_context(
            &self,
            _raw_json: &[u8],
            _passphrase: &str,
            _crl: &[u8],
        ) -> crate::error::LcpResult<crate::document::DrmContext> {
            unreachable!("not exercised by the probe")
        }

        async fn find_one_valid_passphrase(
            &self,
            _raw_json: &[u8],
            candidates: &[String],
        ) -> Option<String> {
            candidates
                .iter()
                .find(|c| c.as_str() == self.correct_passphrase)
                .cloned()
        }
    }

    #[tokio::test]
    async fn from_probe_reports_production_when_bundled_passphrase_unlocks() {
        let client: Arc<dyn LcpClient> = Arc::new(FixedLcpClient {
            correct_passphrase: "bundled-secret",
        });
        let mode = ProductionMode::from_probe(&client, b"{}", "bundled-secret").await;
        assert_eq!(mode, ProductionMode::Production);
    }

    #[tokio::test]
    async fn from_probe_reports_development_when_bundled_passphrase_fails() {
        let client: Arc<dyn LcpClient> = Arc::new(FixedLcpClient {
            correct_passphrase: "bundled-secret",
        });
        let mode = ProductionMode::from_probe(&client, b"{}", "wrong").await;
        assert_eq!(mode, ProductionMode::Development);
    }

    #[tokio::test]
    async fn resolve_prefers_override_over_probe() {
        let client: Arc<dyn LcpClient> = Arc::new(FixedLcpClient {
            correct_passphrase: "bundled-secret",
        });
        let mut settings = EngineSettings::default();
        settings.production_override = Some(false);
        settings.production_probe = Some(crate::settings::ProductionProbeSettings {
            bundled_license_raw_json: "{}".to_string(),
            known_passphrase: "bundled-secret".to_string(),
        });

        let mode = ProductionMode::resolve(&settings, &client).await;
        assert_eq!(mode, ProductionMode::Development);
    }

    #[tokio::test]
    async fn resolve_uses_probe_when_no_override_is_set() {
        let client: Arc<dyn LcpClient> = Arc::new(FixedLcpClient {
            correct_passphrase: "bundled-secret",
        });
        let mut settings = EngineSettings::default();
        settings.production_probe = Some(crate::settings::ProductionProbeSettings {
            bundled_license_raw_json: "{}".to_string(),
            known_passphrase: "bundled-secret".to_string(),
        });

        let mode = ProductionMode::resolve(&settings, &client).await;
        assert_eq!(mode, ProductionMode::Production);
    }
}

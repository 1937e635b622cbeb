//! The side-effect handler (C6): for the state the transition table just
//! produced, perform the associated effect and return the event it raises.
//! No transition logic lives here — only I/O and the pure, time-bound
//! reconciliation computation in `check_license_status`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::collaborators::NetworkClient;
use crate::document::{
    LicenseDocument, StatusDocument, StatusValue, ValidatedDocuments, BASIC_PROFILE, REL_STATUS,
    STATUS_DOCUMENT_MEDIA_TYPE, SUPPORTED_PROFILES,
};
use crate::engine::EngineConfig;
use crate::error::{LcpError, LcpResult, LicenseStatusError};
use crate::event::Event;
use crate::state::State;

/// Everything a side effect needs beyond the state itself: the injected
/// collaborators and the resolved production-mode flag. Passed explicitly
/// rather than via a back-pointer from the state to the engine (spec.md
/// §9's ownership-cycle note).
pub struct EffectContext<'a> {
    pub config: &'a EngineConfig,
    pub is_production: bool,
}

/// Executes the side effect associated with `state` and returns the event
/// it raises. Terminal states have no effect; callers must check
/// [`State::is_terminal`] first.
pub async fn run(state: &State, ctx: &EffectContext<'_>) -> Event {
    match state {
        State::Start => {
            unreachable!("Start has no side effect; the façade supplies the first event")
        }
        State::ValidateLicense { data, .. } => validate_license(data, ctx).await,
        State::FetchStatus { license, .. } => fetch_status(license, ctx).await,
        State::ValidateStatus { data, .. } => validate_status(data, ctx).await,
        State::FetchLicense { status, .. } => fetch_license(status, ctx).await,
        State::CheckLicenseStatus { license, status } => {
            check_license_status(license, status.as_deref(), ctx)
        }
        State::RetrievePassphrase { license, .. } => retrieve_passphrase(license, ctx).await,
        State::ValidateIntegrity {
            license, passphrase, ..
        } => validate_integrity(license, passphrase, ctx).await,
        State::RegisterDevice { documents, link } => register_device(documents, link, ctx).await,
        State::Valid(_) | State::Failure(_) | State::Cancelled => {
            unreachable!("terminal states have no side effect")
        }
    }
}

async fn validate_license(data: &[u8], ctx: &EffectContext<'_>) -> Event {
    let license = match ctx.config.license_parser.parse(data).await {
        Ok(license) => license,
        Err(e) => return Event::Failed(e),
    };

    if !ctx.is_production && license.profile() != BASIC_PROFILE {
        tracing::warn!(profile = license.profile(), "unsupported profile in development mode");
        return Event::Failed(LcpError::LicenseProfileNotSupported(
            license.profile().to_string(),
        ));
    }

    tracing::debug!(profile = license.profile(), "license parsed");
    Event::ValidatedLicense(license)
}

async fn fetch_status(license: &Arc<dyn LicenseDocument>, ctx: &EffectContext<'_>) -> Event {
    let Some(link) = license.url(REL_STATUS, Some(STATUS_DOCUMENT_MEDIA_TYPE)) else {
        tracing::debug!("license has no status link; treating status as absent");
        return Event::Failed(LcpError::Network("license has no status link".to_string()));
    };
    match fetch_with_timeout(&ctx.config.network, &link.href, ctx.config.settings.network_timeout()).await {
        Ok(bytes) => Event::RetrievedStatusData(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "status fetch failed; status is optional, continuing");
            Event::Failed(e)
        }
    }
}

async fn validate_status(data: &[u8], ctx: &EffectContext<'_>) -> Event {
    match ctx.config.status_parser.parse(data).await {
        Ok(status) => Event::ValidatedStatus(status),
        Err(e) => Event::Failed(e),
    }
}

async fn fetch_license(status: &Arc<dyn StatusDocument>, ctx: &EffectContext<'_>) -> Event {
    let Some(link) = status.license_link() else {
        return Event::Failed(LcpError::Network(
            "status document has no license link".to_string(),
        ));
    };
    match fetch_with_timeout(&ctx.config.network, &link.href, ctx.config.settings.network_timeout()).await {
        Ok(bytes) => Event::RetrievedLicenseData(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "license refresh fetch failed");
            Event::Failed(e)
        }
    }
}

/// Reconciles the license's rights window against the status document's
/// lifecycle value, and fires `onLicenseValidated` (mirrors
/// `privstack-license::LicenseKey::status`'s window check). This is the
/// first state reached by every run on its final, non-refreshable license
/// — at most one more `ValidateLicense` pass can occur before this state
/// (the status-driven refresh), never after, so firing the callback here
/// keeps it to exactly once per run regardless of whether a refresh
/// occurred (spec.md §9's open question on re-invocation).
///
/// A `returned`/`revoked`/`cancelled` status overrides an otherwise-valid
/// rights window: the issuer's out-of-band decision always wins. Only
/// `ready`/`active`/`expired` (or no status at all) fall through to the
/// window check.
fn check_license_status(
    license: &Arc<dyn LicenseDocument>,
    status: Option<&dyn StatusDocument>,
    ctx: &EffectContext<'_>,
) -> Event {
    (ctx.config.on_license_validated)(license.clone());

    if let Some(status) = status {
        let overriding = match status.status() {
            StatusValue::Returned => Some(LicenseStatusError::Returned(status.status_updated())),
            StatusValue::Revoked => {
                let count = status.events("register").len() as u32;
                Some(LicenseStatusError::Revoked(status.status_updated(), count))
            }
            StatusValue::Cancelled => Some(LicenseStatusError::Cancelled(status.status_updated())),
            StatusValue::Ready | StatusValue::Active | StatusValue::Expired => None,
        };
        if let Some(err) = overriding {
            return Event::CheckedLicenseStatus(Some(err));
        }
    }

    let now = Utc::now();
    let start = license.rights_start().unwrap_or(now);
    let end = license.rights_end().unwrap_or(now);

    if now >= start && now <= end {
        return Event::CheckedLicenseStatus(None);
    }

    let err = if start > now {
        LicenseStatusError::NotStarted(start)
    } else {
        LicenseStatusError::Expired(end)
    };
    Event::CheckedLicenseStatus(Some(err))
}

async fn retrieve_passphrase(license: &Arc<dyn LicenseDocument>, ctx: &EffectContext<'_>) -> Event {
    let result = ctx
        .config
        .passphrases
        .request(
            license.as_ref(),
            &ctx.config.authentication,
            ctx.config.allow_user_interaction,
            &ctx.config.sender,
        )
        .await;

    match result {
        Ok(Some(passphrase)) if !passphrase.is_empty() => Event::RetrievedPassphrase(passphrase),
        Ok(_) => Event::Cancelled,
        Err(e) => Event::Failed(e),
    }
}

async fn validate_integrity(
    license: &Arc<dyn LicenseDocument>,
    passphrase: &str,
    ctx: &EffectContext<'_>,
) -> Event {
    if !SUPPORTED_PROFILES.contains(&license.profile()) {
        return Event::Failed(LcpError::LicenseProfileNotSupported(
            license.profile().to_string(),
        ));
    }

    let crl = match ctx.config.crl.retrieve().await {
        Ok(crl) => crl,
        Err(e) => return Event::Failed(e),
    };

    match ctx
        .config
        .lcp_client
        .create_context(license.raw_json(), passphrase, &crl)
        .await
    {
        Ok(drm) => Event::ValidatedIntegrity(drm),
        Err(e) => Event::Failed(LcpError::LicenseIntegrityFailed(e.to_string())),
    }
}

async fn register_device(
    documents: &ValidatedDocuments,
    link: &crate::document::LinkInfo,
    ctx: &EffectContext<'_>,
) -> Event {
    match ctx
        .config
        .device
        .register_license(documents.license.as_ref(), link)
        .await
    {
        Ok(data) => Event::RegisteredDevice(data),
        Err(e) => {
            tracing::warn!(error = %e, "device registration failed; continuing best-effort");
            Event::RegisteredDevice(Vec::new())
        }
    }
}

async fn fetch_with_timeout(
    network: &Arc<dyn NetworkClient>,
    url: &Url,
    timeout: Duration,
) -> LcpResult<Vec<u8>> {
    match tokio::time::timeout(timeout, network.fetch(url, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(LcpError::Network("request timed out".to_string())),
    }
}

//! Collaborators specific to this demonstrator: a stdin-prompted
//! passphrase service, a no-op CRL fallback, and an explicit stub for the
//! native crypto layer, which is out of scope for `lcp_license` itself.

use std::io::{self, Write};

use async_trait::async_trait;
use lcp_license::{
    Authentication, CrlService, DrmContext, LcpClient, LcpError, LcpResult, LicenseDocument,
    PassphrasesService, Sender,
};

/// Prompts on stdin. Not masked — a real client would use a proper
/// terminal UI or platform secure-entry widget; this is a demonstrator.
pub struct StdinPassphraseService;

#[async_trait]
impl PassphrasesService for StdinPassphraseService {
    async fn request(
        &self,
        license: &dyn LicenseDocument,
        _authentication: &Authentication,
        allow_user_interaction: bool,
        _sender: &Sender,
    ) -> LcpResult<Option<String>> {
        if !allow_user_interaction {
            return Ok(None);
        }
        print!("Passphrase for license ({}): ", license.profile());
        io::stdout().flush().ok();
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .map_err(|e| LcpError::ContainerOpenFailed(e.to_string()))?;
        let trimmed = line.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// Returns an empty CRL. Used when no `--crl-url` is supplied.
pub struct NullCrlService;

#[async_trait]
impl CrlService for NullCrlService {
    async fn retrieve(&self) -> LcpResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// The native cryptographic primitive is out of scope for `lcp_license`
/// (see [`lcp_license::LcpClient`]); this stub surfaces that boundary as
/// an explicit error instead of silently faking a successful unlock.
pub struct NullLcpClient;

#[async_trait]
impl LcpClient for NullLcpClient {
    async fn create_context(
        &self,
        _raw_json: &[u8],
        _passphrase: &str,
        _crl: &[u8],
    ) -> LcpResult<DrmContext> {
        Err(LcpError::LicenseIntegrityFailed(
            "no native crypto backend configured in this demonstrator".to_string(),
        ))
    }

    async fn find_one_valid_passphrase(
        &self,
        _raw_json: &[u8],
        _candidates: &[String],
    ) -> Option<String> {
        None
    }
}

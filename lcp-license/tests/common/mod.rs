//! Shared fixtures for the integration tests: in-memory collaborators and
//! a couple of tiny document builders, standing in for the external
//! parsers and transports `lcp_license` treats as contract-only.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lcp_license::{
    Authentication, CrlService, DeviceService, DrmContext, EngineConfig, EngineSettings,
    LcpClient, LcpError, LcpResult, LicenseDocument, LicenseParser, LinkInfo, NetworkClient,
    PassphrasesService, Sender, StatusDocument, StatusEvent, StatusParser, StatusValue,
};
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct FixtureLicense {
    pub raw: Vec<u8>,
    pub profile: String,
    pub rights_start: Option<DateTime<Utc>>,
    pub rights_end: Option<DateTime<Utc>>,
    pub links: HashMap<&'static str, LinkInfo>,
}

impl LicenseDocument for FixtureLicense {
    fn raw_json(&self) -> &[u8] {
        &self.raw
    }

    fn profile(&self) -> &str {
        &self.profile
    }

    fn rights_start(&self) -> Option<DateTime<Utc>> {
        self.rights_start
    }

    fn rights_end(&self) -> Option<DateTime<Utc>> {
        self.rights_end
    }

    fn url(&self, rel: &str, _preferred_type: Option<&str>) -> Option<LinkInfo> {
        self.links.get(rel).cloned()
    }
}

pub struct FixtureLicenseBuilder {
    raw: Vec<u8>,
    profile: String,
    rights_start: Option<DateTime<Utc>>,
    rights_end: Option<DateTime<Utc>>,
    links: HashMap<&'static str, LinkInfo>,
}

impl FixtureLicenseBuilder {
    pub fn new(raw: impl Into<Vec<u8>>, profile: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            profile: profile.into(),
            rights_start: None,
            rights_end: None,
            links: HashMap::new(),
        }
    }

    pub fn window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.rights_start = Some(start);
        self.rights_end = Some(end);
        self
    }

    pub fn link(mut self, rel: &'static str, href: &str) -> Self {
        self.links.insert(
            rel,
            LinkInfo {
                href: Url::parse(href).expect("valid fixture url"),
                media_type: None,
            },
        );
        self
    }

    pub fn build(self) -> Arc<dyn LicenseDocument> {
        Arc::new(FixtureLicense {
            raw: self.raw,
            profile: self.profile,
            rights_start: self.rights_start,
            rights_end: self.rights_end,
            links: self.links,
        })
    }
}

#[derive(Debug)]
pub struct FixtureStatus {
    pub status: StatusValue,
    pub status_updated: DateTime<Utc>,
    pub events: Vec<StatusEvent>,
    pub links: HashMap<&'static str, LinkInfo>,
}

impl StatusDocument for FixtureStatus {
    fn status(&self) -> StatusValue {
        self.status
    }

    fn status_updated(&self) -> DateTime<Utc> {
        self.status_updated
    }

    fn events(&self, event_type: &str) -> Vec<StatusEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    fn url(&self, rel: &str, _preferred_type: Option<&str>) -> Option<LinkInfo> {
        self.links.get(rel).cloned()
    }
}

pub struct FixtureStatusBuilder {
    status: StatusValue,
    status_updated: DateTime<Utc>,
    events: Vec<StatusEvent>,
    links: HashMap<&'static str, LinkInfo>,
}

impl FixtureStatusBuilder {
    pub fn new(status: StatusValue, status_updated: DateTime<Utc>) -> Self {
        Self {
            status,
            status_updated,
            events: Vec::new(),
            links: HashMap::new(),
        }
    }

    pub fn event(mut self, event_type: &str, timestamp: DateTime<Utc>) -> Self {
        self.events.push(StatusEvent {
            event_type: event_type.to_string(),
            timestamp,
        });
        self
    }

    pub fn link(mut self, rel: &'static str, href: &str) -> Self {
        self.links.insert(
            rel,
            LinkInfo {
                href: Url::parse(href).expect("valid fixture url"),
                media_type: None,
            },
        );
        self
    }

    pub fn build(self) -> Arc<dyn StatusDocument> {
        Arc::new(FixtureStatus {
            status: self.status,
            status_updated: self.status_updated,
            events: self.events,
            links: self.links,
        })
    }
}

/// Parses bytes by look-up in a pre-registered table; the "bytes" in these
/// tests are opaque fixture keys, not real JSON.
pub struct ScriptedLicenseParser(HashMap<Vec<u8>, Arc<dyn LicenseDocument>>);

impl ScriptedLicenseParser {
    pub fn new(entries: Vec<(&[u8], Arc<dyn LicenseDocument>)>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.to_vec(), v)).collect())
    }
}

#[async_trait]
impl LicenseParser for ScriptedLicenseParser {
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn LicenseDocument>> {
        self.0
            .get(bytes)
            .cloned()
            .ok_or_else(|| LcpError::ContainerOpenFailed("no fixture registered".to_string()))
    }
}

pub struct ScriptedStatusParser(HashMap<Vec<u8>, Arc<dyn StatusDocument>>);

impl ScriptedStatusParser {
    pub fn new(entries: Vec<(&[u8], Arc<dyn StatusDocument>)>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.to_vec(), v)).collect())
    }
}

#[async_trait]
impl StatusParser for ScriptedStatusParser {
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn StatusDocument>> {
        self.0
            .get(bytes)
            .cloned()
            .ok_or_else(|| LcpError::ContainerOpenFailed("no fixture registered".to_string()))
    }
}

/// Serves fixed responses keyed by URL; anything else errors.
pub struct ScriptedNetwork(HashMap<String, Result<Vec<u8>, String>>);

impl ScriptedNetwork {
    pub fn new(entries: Vec<(&str, Result<Vec<u8>, String>)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

#[async_trait]
impl NetworkClient for ScriptedNetwork {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> LcpResult<Vec<u8>> {
        match self.0.get(url.as_str()) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(cause)) => Err(LcpError::Network(cause.clone())),
            None => Err(LcpError::Network(format!("no fixture for {url}"))),
        }
    }
}

/// Never resolves within the timeout budget; used to exercise the
/// engine's own `tokio::time::timeout` wrapping, independent of whatever
/// the underlying transport does.
pub struct SlowNetwork(pub Duration);

#[async_trait]
impl NetworkClient for SlowNetwork {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> LcpResult<Vec<u8>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

pub struct EmptyCrl;

#[async_trait]
impl CrlService for EmptyCrl {
    async fn retrieve(&self) -> LcpResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

pub struct RecordingDevice {
    pub result: Result<Vec<u8>, String>,
}

#[async_trait]
impl DeviceService for RecordingDevice {
    async fn register_license(
        &self,
        _license: &dyn LicenseDocument,
        _link: &LinkInfo,
    ) -> LcpResult<Vec<u8>> {
        self.result
            .clone()
            .map_err(LcpError::Network)
    }
}

pub struct ScriptedPassphrase(pub Option<String>);

#[async_trait]
impl PassphrasesService for ScriptedPassphrase {
    async fn request(
        &self,
        _license: &dyn LicenseDocument,
        _authentication: &Authentication,
        _allow_user_interaction: bool,
        _sender: &Sender,
    ) -> LcpResult<Option<String>> {
        Ok(self.0.clone())
    }
}

pub struct AcceptingLcpClient;

#[async_trait]
impl LcpClient for AcceptingLcpClient {
    async fn create_context(
        &self,
        raw_json: &[u8],
        passphrase: &str,
        _crl: &[u8],
    ) -> LcpResult<DrmContext> {
        Ok(DrmContext::from_bytes(
            [raw_json, passphrase.as_bytes()].concat(),
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

/// Builds an [`EngineConfig`] with no-op defaults; override the fields a
/// given test cares about.
pub fn base_config() -> EngineConfig {
    EngineConfig {
        authentication: Authentication::default(),
        allow_user_interaction: true,
        sender: Sender::default(),
        settings: EngineSettings::default(),
        network: Arc::new(ScriptedNetwork::new(vec![])),
        crl: Arc::new(EmptyCrl),
        device: Arc::new(RecordingDevice { result: Ok(Vec::new()) }),
        passphrases: Arc::new(ScriptedPassphrase(Some("hunter2".to_string()))),
        lcp_client: Arc::new(AcceptingLcpClient),
        license_parser: Arc::new(ScriptedLicenseParser::new(vec![])),
        status_parser: Arc::new(ScriptedStatusParser::new(vec![])),
        on_license_validated: Arc::new(|_| {}),
    }
}

/// A one-shot observer that records the first `(documents, error)` pair it
/// receives into `slot`.
pub fn recording_observer(
    slot: Arc<std::sync::Mutex<Option<(Option<lcp_license::ValidatedDocuments>, Option<Arc<LcpError>>)>>>,
) -> Box<lcp_license::ObserverFn> {
    Box::new(move |documents, error| {
        *slot.lock().unwrap() = Some((documents, error));
    })
}

pub fn dt(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid fixture timestamp")
}

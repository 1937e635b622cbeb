//! Minimal JSON parsers for License and Status Documents.
//!
//! `lcp_license` treats document parsing as an out-of-scope collaborator
//! contract (`LicenseParser` / `StatusParser`); these are a workable
//! implementation of that contract against the real Readium LCP JSON
//! shapes, good enough to drive the engine end to end from this CLI. A
//! full client would likely swap these for a richer document model.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lcp_license::{
    LcpError, LcpResult, LicenseDocument, LicenseParser, LinkInfo, StatusDocument, StatusEvent,
    StatusParser, StatusValue,
};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
struct RawLink {
    rel: String,
    href: Url,
    #[serde(rename = "type", default)]
    media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEncryption {
    profile: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawRights {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawLicense {
    encryption: RawEncryption,
    #[serde(default)]
    rights: RawRights,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug)]
struct JsonLicenseDocument {
    raw_json: Vec<u8>,
    profile: String,
    rights_start: Option<DateTime<Utc>>,
    rights_end: Option<DateTime<Utc>>,
    links: Vec<RawLink>,
}

impl LicenseDocument for JsonLicenseDocument {
    fn raw_json(&self) -> &[u8] {
        &self.raw_json
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

    fn url(&self, rel: &str, preferred_type: Option<&str>) -> Option<LinkInfo> {
        resolve_link(&self.links, rel, preferred_type)
    }
}

/// Parses the Readium LCP License Document JSON shape.
pub struct DefaultLicenseParser;

#[async_trait]
impl LicenseParser for DefaultLicenseParser {
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn LicenseDocument>> {
        let raw: RawLicense = serde_json::from_slice(bytes)?;
        Ok(Arc::new(JsonLicenseDocument {
            raw_json: bytes.to_vec(),
            profile: raw.encryption.profile,
            rights_start: raw.rights.start,
            rights_end: raw.rights.end,
            links: raw.links,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawStatusEvent {
    #[serde(rename = "type")]
    event_type: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUpdated {
    status: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    status: String,
    #[serde(default)]
    updated: RawUpdated,
    #[serde(default)]
    events: Vec<RawStatusEvent>,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug)]
struct JsonStatusDocument {
    status: StatusValue,
    status_updated: DateTime<Utc>,
    events: Vec<RawStatusEvent>,
    links: Vec<RawLink>,
}

impl StatusDocument for JsonStatusDocument {
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
            .map(|e| StatusEvent {
                event_type: e.event_type.clone(),
                timestamp: e.timestamp,
            })
            .collect()
    }

    fn url(&self, rel: &str, preferred_type: Option<&str>) -> Option<LinkInfo> {
        resolve_link(&self.links, rel, preferred_type)
    }
}

/// Parses the Readium LCP Status Document JSON shape.
pub struct DefaultStatusParser;

#[async_trait]
impl StatusParser for DefaultStatusParser {
    async fn parse(&self, bytes: &[u8]) -> LcpResult<Arc<dyn StatusDocument>> {
        let raw: RawStatus = serde_json::from_slice(bytes)?;
        let status = match raw.status.as_str() {
            "ready" => StatusValue::Ready,
            "active" => StatusValue::Active,
            "expired" => StatusValue::Expired,
            "returned" => StatusValue::Returned,
            "revoked" => StatusValue::Revoked,
            "cancelled" => StatusValue::Cancelled,
            other => {
                return Err(LcpError::ContainerOpenFailed(format!(
                    "unknown status value: {other}"
                )))
            }
        };
        Ok(Arc::new(JsonStatusDocument {
            status,
            status_updated: raw.updated.status.unwrap_or_else(Utc::now),
            events: raw.events,
            links: raw.links,
        }))
    }
}

fn resolve_link(links: &[RawLink], rel: &str, preferred_type: Option<&str>) -> Option<LinkInfo> {
    let matching: Vec<&RawLink> = links.iter().filter(|l| l.rel == rel).collect();
    let chosen = preferred_type
        .and_then(|t| {
            matching
                .iter()
                .find(|l| l.media_type.as_deref() == Some(t))
                .copied()
        })
        .or_else(|| matching.first().copied())?;
    Some(LinkInfo {
        href: chosen.href.clone(),
        media_type: chosen.media_type.clone(),
    })
}

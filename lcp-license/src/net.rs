//! `reqwest`-backed collaborator implementations, gated behind the
//! `network` feature — grounded on the shared, timeout-configured
//! `reqwest::Client` pattern in `privstack-sync::cloud::google_drive`.

#![cfg(feature = "network")]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::collaborators::{CrlService, DeviceService, NetworkClient};
use crate::document::{LicenseDocument, LinkInfo};
use crate::error::{LcpError, LcpResult};

/// A [`NetworkClient`] backed by a shared `reqwest::Client`.
pub struct HttpNetworkClient {
    client: Client,
}

impl HttpNetworkClient {
    pub fn new() -> LcpResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| LcpError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NetworkClient for HttpNetworkClient {
    async fn fetch(&self, url: &Url, timeout: Duration) -> LcpResult<Vec<u8>> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| LcpError::Network(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// A [`CrlService`] that fetches a fixed CRL URL through a [`NetworkClient`].
pub struct HttpCrlService {
    client: Arc<dyn NetworkClient>,
    url: Url,
    timeout: Duration,
}

impl HttpCrlService {
    pub fn new(client: Arc<dyn NetworkClient>, url: Url, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }
}

#[async_trait]
impl CrlService for HttpCrlService {
    async fn retrieve(&self) -> LcpResult<Vec<u8>> {
        self.client.fetch(&self.url, self.timeout).await
    }
}

/// A [`DeviceService`] that POSTs the device id/name pair to the
/// registration link the status document advertises.
pub struct HttpDeviceService {
    client: Client,
    device_id: String,
    device_name: String,
}

impl HttpDeviceService {
    pub fn new(device_id: impl Into<String>, device_name: impl Into<String>) -> LcpResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| LcpError::Network(e.to_string()))?;
        Ok(Self {
            client,
            device_id: device_id.into(),
            device_name: device_name.into(),
        })
    }
}

#[async_trait]
impl DeviceService for HttpDeviceService {
    async fn register_license(
        &self,
        _license: &dyn LicenseDocument,
        link: &LinkInfo,
    ) -> LcpResult<Vec<u8>> {
        let response = self
            .client
            .post(link.href.as_str())
            .query(&[
                ("id", self.device_id.as_str()),
                ("name", self.device_name.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| LcpError::Network(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LcpError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// Backend HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, cache-bypassing
// reads, cancellation, and body decoding. Device ids always travel as a
// single percent-encoded path segment.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{CommandRequest, DeviceCommand, DeviceListResponse, DeviceResponse};
use crate::transport::TransportConfig;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Raw HTTP client for the device-management backend.
///
/// Every read is cache-bypassing: it carries `Cache-Control: no-cache` and a
/// `t=<epoch millis>` query parameter. Command writes report the HTTP status
/// instead of failing on non-2xx, since callers only care whether the write
/// was accepted.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `http://192.168.1.10:8080`). A
    /// path prefix is preserved, so `http://host/dash/` resolves endpoints
    /// under `/dash/api/...`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/tuya/devices[/{segments}...]`
    fn devices_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty()
                .extend(["api", "tuya", "devices"])
                .extend(segments);
        }
        Ok(url)
    }

    fn with_cache_buster(mut url: Url) -> Url {
        let millis = chrono::Utc::now().timestamp_millis();
        url.query_pairs_mut().append_pair("t", &millis.to_string());
        url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch every device.
    ///
    /// `page_size` is forwarded as the `size` query hint when set.
    pub async fn list_devices(&self, page_size: Option<u32>) -> Result<Vec<DeviceResponse>, Error> {
        let mut url = self.devices_url(&[])?;
        if let Some(size) = page_size {
            url.query_pairs_mut().append_pair("size", &size.to_string());
        }
        let url = Self::with_cache_buster(url);

        let list: DeviceListResponse = self.get_json(url).await?;
        debug!(count = list.devices.len(), "device list received");
        Ok(list.devices)
    }

    /// Fetch a single device snapshot.
    ///
    /// Resolves to [`Error::Cancelled`] as soon as `cancel` fires, abandoning
    /// the in-flight request or body read.
    pub async fn get_device(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<DeviceResponse, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let url = Self::with_cache_buster(self.devices_url(&[id])?);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                trace!(device = id, "device read cancelled");
                Err(Error::Cancelled)
            }
            result = self.get_json::<DeviceResponse>(url) => result,
        }
    }

    /// Write commands to a device and return the HTTP status.
    ///
    /// Only transport failures are errors; a non-2xx status is returned for
    /// the caller to inspect.
    pub async fn send_command(
        &self,
        id: &str,
        commands: &[DeviceCommand],
    ) -> Result<StatusCode, Error> {
        let url = self.devices_url(&[id, "command"])?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&CommandRequest { commands })
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            debug!(device = id, %status, "command accepted");
        } else {
            let body = resp.text().await.unwrap_or_default();
            debug!(device = id, %status, body = %preview(&body), "command rejected");
        }
        Ok(status)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        trace!(bytes = body.len(), "response body received");
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Truncate a response body for error messages and logs.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LIMIT {
        return body;
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

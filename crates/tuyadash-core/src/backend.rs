// ── Backend seam ──
//
// The polling core talks to the device-management API only through
// `DeviceBackend`. `DashboardClient` is the production implementation;
// tests substitute scripted fakes.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use tuyadash_api::{DashboardClient, DeviceCommand};

use crate::error::CoreError;
use crate::model::{Device, DeviceId};

/// Read/write access to devices.
pub trait DeviceBackend: Send + Sync + 'static {
    /// Fetch the full device list, bypassing caches.
    fn list_devices(
        &self,
        page_size: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    /// Fetch one device snapshot, bypassing caches.
    ///
    /// Must resolve to [`CoreError::Cancelled`] once `cancel` fires.
    fn get_device(
        &self,
        id: &DeviceId,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Device, CoreError>> + Send;

    /// Write a command. `Ok(true)` means the backend answered 2xx,
    /// `Ok(false)` any other status.
    fn send_command(
        &self,
        id: &DeviceId,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;
}

impl DeviceBackend for DashboardClient {
    async fn list_devices(&self, page_size: Option<u32>) -> Result<Vec<Device>, CoreError> {
        let raw = DashboardClient::list_devices(self, page_size).await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }

    async fn get_device(
        &self,
        id: &DeviceId,
        cancel: &CancellationToken,
    ) -> Result<Device, CoreError> {
        match DashboardClient::get_device(self, id.as_str(), cancel).await {
            Ok(raw) => Ok(Device::from(raw)),
            Err(e) if e.is_not_found() => Err(CoreError::DeviceNotFound {
                identifier: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn send_command(&self, id: &DeviceId, command: &DeviceCommand) -> Result<bool, CoreError> {
        let status =
            DashboardClient::send_command(self, id.as_str(), std::slice::from_ref(command)).await?;
        if !status.is_success() {
            warn!(device = %id, code = %command.code, %status, "command not accepted");
        }
        Ok(status.is_success())
    }
}

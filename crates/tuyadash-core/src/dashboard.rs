// ── Dashboard facade ──
//
// Ties a backend, a view, the poller registry, and the polling policy
// together behind one cheaply cloneable handle. Every async entry point is
// its own failure boundary: outcomes are returned, never raised.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tuyadash_api::{DashboardClient, TlsMode, TransportConfig};

use crate::backend::DeviceBackend;
use crate::card::DeviceCard;
use crate::command::{CommandReport, dispatch_command};
use crate::config::{DashboardConfig, PollingPolicy, RefreshPlan, TlsVerification};
use crate::error::CoreError;
use crate::loader::{LoadOutcome, load_devices};
use crate::model::{Device, DeviceId, StatusValue};
use crate::refresh::{RefreshOutcome, refresh_device};
use crate::registry::PollerRegistry;
use crate::view::{ControlRef, DashboardView};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Clones share the same
/// registry, so a refresh started from one clone supersedes a refresh of
/// the same device started from another.
pub struct Dashboard<B> {
    inner: Arc<DashboardInner<B>>,
}

struct DashboardInner<B> {
    backend: B,
    view: Arc<dyn DashboardView>,
    registry: PollerRegistry,
    policy: PollingPolicy,
    cancel: CancellationToken,
}

impl<B> Clone for Dashboard<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Dashboard<DashboardClient> {
    /// Build the HTTP client described by `config` and wrap it.
    pub fn connect(
        config: &DashboardConfig,
        view: Arc<dyn DashboardView>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = DashboardClient::new(config.url.clone(), &transport)?;
        info!(url = %config.url, "dashboard backend configured");
        Ok(Self::new(client, view, config.polling))
    }
}

impl<B: DeviceBackend> Dashboard<B> {
    pub fn new(backend: B, view: Arc<dyn DashboardView>, policy: PollingPolicy) -> Self {
        let cancel = CancellationToken::new();
        let registry = PollerRegistry::with_parent(&cancel);
        Self {
            inner: Arc::new(DashboardInner {
                backend,
                view,
                registry,
                policy,
                cancel,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn view(&self) -> &Arc<dyn DashboardView> {
        &self.inner.view
    }

    pub fn registry(&self) -> &PollerRegistry {
        &self.inner.registry
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.inner.policy
    }

    // ── Operations ───────────────────────────────────────────────

    /// Fetch and render every device.
    pub async fn load_devices(&self) -> LoadOutcome {
        load_devices(
            &self.inner.backend,
            self.inner.view.as_ref(),
            self.inner.policy.page_size,
        )
        .await
    }

    /// Refresh one card under the default plan.
    pub async fn refresh_device(&self, id: &DeviceId) -> RefreshOutcome {
        self.refresh_device_with(id, self.inner.policy.refresh).await
    }

    /// Refresh one card under an explicit plan.
    pub async fn refresh_device_with(&self, id: &DeviceId, plan: RefreshPlan) -> RefreshOutcome {
        refresh_device(
            &self.inner.backend,
            self.inner.view.as_ref(),
            &self.inner.registry,
            id,
            plan,
        )
        .await
    }

    /// Write `code = value` to a device and reconcile its card.
    pub async fn send_command(
        &self,
        id: &DeviceId,
        code: &str,
        value: StatusValue,
    ) -> CommandReport {
        let control = ControlRef::new(id.clone(), code);
        dispatch_command(
            &self.inner.backend,
            self.inner.view.as_ref(),
            &self.inner.registry,
            &self.inner.policy,
            &control,
            value,
        )
        .await
    }

    /// One read of a device, abandoned on shutdown.
    pub async fn fetch_device(&self, id: &DeviceId) -> Result<Device, CoreError> {
        self.inner.backend.get_device(id, &self.inner.cancel).await
    }

    /// Fetch one device and make its card the only one displayed.
    pub async fn show_device(&self, id: &DeviceId) -> Result<DeviceCard, CoreError> {
        let device = self.fetch_device(id).await?;
        let card = DeviceCard::from_device(&device);
        self.inner.view.clear();
        self.inner.view.render_cards(vec![card.clone()]);
        Ok(card)
    }

    /// Flip a switch based on a fresh read of the device.
    ///
    /// With `code` unset the device's first switch is used.
    pub async fn toggle(&self, id: &DeviceId, code: Option<&str>) -> Result<CommandReport, CoreError> {
        let device = self.fetch_device(id).await?;

        let found = device
            .switches()
            .find(|(c, _)| code.is_none_or(|wanted| *c == wanted))
            .map(|(c, on)| (c.to_owned(), on));
        let Some((code, on)) = found else {
            return Err(CoreError::SwitchNotFound {
                device: id.to_string(),
                code: code.unwrap_or("switch").to_owned(),
            });
        };

        debug!(device = %id, %code, from = on, to = !on, "toggling switch");
        Ok(self.send_command(id, &code, StatusValue::Bool(!on)).await)
    }

    /// Cancel every refresh loop and refuse new ones.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.registry.cancel_all();
        debug!("dashboard shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

// ── Command dispatcher ──
//
// Optimistic control update, command write, then a reconciling refresh.
// The control is restored by a drop guard, so it comes back even when the
// refresh is cancelled or the whole dispatch future is dropped.

use tracing::{debug, warn};

use tuyadash_api::DeviceCommand;

use crate::backend::DeviceBackend;
use crate::config::PollingPolicy;
use crate::model::StatusValue;
use crate::refresh::{RefreshOutcome, refresh_device};
use crate::registry::PollerRegistry;
use crate::view::{ControlRef, DashboardView};

/// Result of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandReport {
    /// The backend answered the write with a 2xx status.
    pub write_accepted: bool,
    /// How the follow-up refresh ended.
    pub refresh: RefreshOutcome,
}

/// Holds a control in its pending state until dropped.
struct OptimisticGuard<'a> {
    view: &'a dyn DashboardView,
    control: &'a ControlRef,
}

impl<'a> OptimisticGuard<'a> {
    fn begin(view: &'a dyn DashboardView, control: &'a ControlRef, target: bool) -> Self {
        view.begin_pending(control, target);
        Self { view, control }
    }
}

impl Drop for OptimisticGuard<'_> {
    fn drop(&mut self) {
        self.view.end_pending(self.control);
    }
}

/// Send `value` to `control` and reconcile the card afterwards.
///
/// The write outcome picks the refresh plan: `policy.after_accepted` on a
/// 2xx answer, `policy.after_rejected` on any other status or transport
/// failure. Write failures are logged, never returned.
pub async fn dispatch_command<B>(
    backend: &B,
    view: &dyn DashboardView,
    registry: &PollerRegistry,
    policy: &PollingPolicy,
    control: &ControlRef,
    value: StatusValue,
) -> CommandReport
where
    B: DeviceBackend + ?Sized,
{
    let _pending = OptimisticGuard::begin(view, control, value.is_truthy());

    let command = DeviceCommand::new(control.code.clone(), value);
    let write_accepted = match backend.send_command(&control.device_id, &command).await {
        Ok(accepted) => accepted,
        Err(e) => {
            warn!(control = %control, error = %e, "command write failed");
            false
        }
    };
    debug!(control = %control, write_accepted, "command written, reconciling");

    let plan = policy.after_command(write_accepted);
    let refresh = refresh_device(backend, view, registry, &control.device_id, plan).await;

    CommandReport {
        write_accepted,
        refresh,
    }
}

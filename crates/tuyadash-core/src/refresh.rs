// ── Single-device refresh loop ──
//
// Bounded re-reads of one device after a user action. Each successful read
// replaces the card in place; transient failures are swallowed; a
// cancellation ends the loop at once and nothing is rendered after it.

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::backend::DeviceBackend;
use crate::card::DeviceCard;
use crate::config::RefreshPlan;
use crate::model::DeviceId;
use crate::registry::PollerRegistry;
use crate::view::DashboardView;

/// How a refresh loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every attempt ran. `successes` counts card replacements.
    Completed { attempts: u32, successes: u32 },
    /// Superseded or shut down after `attempts` reads had started.
    Cancelled { attempts: u32 },
    /// The card was not displayed at entry; nothing was fetched.
    CardMissing,
}

impl RefreshOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Run one refresh loop for `id` under `plan`.
///
/// Any earlier loop for the same device is cancelled first. The registry
/// entry is released when this future completes or is dropped.
pub async fn refresh_device<B>(
    backend: &B,
    view: &dyn DashboardView,
    registry: &PollerRegistry,
    id: &DeviceId,
    plan: RefreshPlan,
) -> RefreshOutcome
where
    B: DeviceBackend + ?Sized,
{
    let poller = registry.activate(id);
    let cancel = poller.token();

    if !view.has_card(id) {
        trace!(device = %id, "no card displayed, skipping refresh");
        return RefreshOutcome::CardMissing;
    }

    let mut successes = 0;
    for attempt in 1..=plan.attempts {
        let result = backend.get_device(id, cancel).await;
        if cancel.is_cancelled() {
            debug!(device = %id, attempt, "refresh cancelled");
            return RefreshOutcome::Cancelled { attempts: attempt };
        }

        match result {
            Ok(device) => {
                view.replace_card(DeviceCard::from_device(&device));
                successes += 1;
            }
            Err(e) if e.is_cancelled() => {
                return RefreshOutcome::Cancelled { attempts: attempt };
            }
            Err(e) => {
                debug!(device = %id, attempt, error = %e, "refresh attempt failed");
            }
        }

        if attempt < plan.attempts && !pause(cancel, plan).await {
            debug!(device = %id, attempt, "refresh cancelled during delay");
            return RefreshOutcome::Cancelled { attempts: attempt };
        }
    }

    RefreshOutcome::Completed {
        attempts: plan.attempts,
        successes,
    }
}

/// Sleep for the plan's delay. Returns `false` if cancelled first.
async fn pause(cancel: &CancellationToken, plan: RefreshPlan) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(plan.delay) => true,
    }
}

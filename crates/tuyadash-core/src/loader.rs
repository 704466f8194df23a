// ── Bulk load orchestrator ──
//
// Initial fetch of every device: loading indicator on, list cleared, then
// exactly one of empty message, error message, or sorted cards. The
// indicator is switched off on every exit path, including drop.

use std::cmp::Ordering;

use feruca::Collator;
use tracing::{info, warn};

use crate::backend::DeviceBackend;
use crate::card::DeviceCard;
use crate::model::Device;
use crate::view::DashboardView;

/// Message rendered when the backend reports no devices.
pub const EMPTY_MESSAGE: &str = "No devices found.";

/// How a bulk load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This many cards were rendered.
    Loaded(usize),
    /// The backend returned an empty list.
    Empty,
    /// The fetch failed; the message was shown to the user.
    Failed(String),
}

struct LoadingGuard<'a> {
    view: &'a dyn DashboardView,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.view.hide_loading();
    }
}

/// Name first (missing names as ""), id as tiebreak.
///
/// Names use Unicode collation: base letters decide, so "alpha" precedes
/// "Beta" and "Łazienka" sits next to "L". Case only breaks ties between
/// names with the same letters.
pub fn compare_devices(collator: &mut Collator, a: &Device, b: &Device) -> Ordering {
    collator
        .collate(a.sort_name(), b.sort_name())
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_devices(devices: &mut [Device]) {
    let mut collator = Collator::default();
    devices.sort_by(|a, b| compare_devices(&mut collator, a, b));
}

/// Fetch every device once and render the result.
pub async fn load_devices<B>(
    backend: &B,
    view: &dyn DashboardView,
    page_size: Option<u32>,
) -> LoadOutcome
where
    B: DeviceBackend + ?Sized,
{
    view.show_loading();
    let _loading = LoadingGuard { view };
    view.clear();

    match backend.list_devices(page_size).await {
        Ok(devices) if devices.is_empty() => {
            info!("backend reported no devices");
            view.show_empty(EMPTY_MESSAGE);
            LoadOutcome::Empty
        }
        Ok(mut devices) => {
            sort_devices(&mut devices);
            let cards: Vec<DeviceCard> = devices.iter().map(DeviceCard::from_device).collect();
            let count = cards.len();
            view.render_cards(cards);
            info!(count, "devices loaded");
            LoadOutcome::Loaded(count)
        }
        Err(e) => {
            let message = e.to_string();
            warn!(error = %message, "device list failed");
            view.show_error(&format!("Error: {message}"));
            LoadOutcome::Failed(message)
        }
    }
}

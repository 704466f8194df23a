//! View contract between the polling core and whatever draws the dashboard.

use std::fmt;

use crate::card::DeviceCard;
use crate::model::DeviceId;

/// Identifies one switch control: a device plus the status code it toggles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlRef {
    pub device_id: DeviceId,
    pub code: String,
}

impl ControlRef {
    pub fn new(device_id: DeviceId, code: impl Into<String>) -> Self {
        Self {
            device_id,
            code: code.into(),
        }
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.code)
    }
}

/// Everything the core needs from a presentation surface.
///
/// Calls arrive from async tasks, so implementations must be cheap and
/// non-blocking: record state or forward a message, never await.
///
/// Lifecycle of a bulk load: `show_loading` → `clear` →
/// (`show_empty` | `show_error` | `render_cards`) → `hide_loading`.
pub trait DashboardView: Send + Sync {
    /// Show the loading indicator.
    fn show_loading(&self);

    /// Hide the loading indicator.
    fn hide_loading(&self);

    /// Drop every rendered card and any message in the list area.
    fn clear(&self);

    /// Show the "no devices" message in the list area.
    fn show_empty(&self, message: &str);

    /// Show an error message in the list area.
    fn show_error(&self, message: &str);

    /// Replace the list area with these cards, in order.
    fn render_cards(&self, cards: Vec<DeviceCard>);

    /// Whether a card for this device is currently displayed.
    fn has_card(&self, id: &DeviceId) -> bool;

    /// Swap the displayed card for `card.device_id` in place.
    ///
    /// Controls on the new card must stay interactive. No-op when the card
    /// is no longer displayed.
    fn replace_card(&self, card: DeviceCard);

    /// Put a control into its optimistic state: disabled, busy label,
    /// tinted toward `target`.
    fn begin_pending(&self, control: &ControlRef, target: bool);

    /// Re-enable a control and restore its label.
    fn end_pending(&self, control: &ControlRef);
}

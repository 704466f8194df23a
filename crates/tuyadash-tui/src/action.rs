//! All possible UI actions. Actions are the sole mechanism for state mutation.

use tuyadash_core::{ControlRef, DeviceCard, DeviceId};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── User intents ──────────────────────────────────────────────
    ToggleHelp,
    /// Reload every card from the backend.
    Reload,
    /// Re-read one card under the default refresh plan.
    RefreshCard(DeviceId),
    /// Write `next` to a switch control.
    ToggleSwitch {
        control: ControlRef,
        next: bool,
        title: String,
    },

    // ── View updates (from the dashboard core) ────────────────────
    ShowLoading,
    HideLoading,
    ClearCards,
    ShowEmpty(String),
    ShowError(String),
    RenderCards(Vec<DeviceCard>),
    ReplaceCard(DeviceCard),
    BeginPending(ControlRef, bool),
    EndPending(ControlRef),

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}

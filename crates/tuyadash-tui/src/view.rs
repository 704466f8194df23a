//! View bridge: forwards `DashboardView` calls as actions.
//!
//! The core calls the view from async tasks; the screen only changes on
//! the UI loop. Each call becomes an [`Action`] on the app channel. The set
//! of displayed device ids is mirrored here so `has_card` can answer
//! synchronously, and it always matches what the screen holds once the
//! queued actions are drained.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use tuyadash_core::{ControlRef, DashboardView, DeviceCard, DeviceId};

use crate::action::Action;

pub struct TuiView {
    action_tx: UnboundedSender<Action>,
    displayed: Mutex<HashSet<DeviceId>>,
}

impl TuiView {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            displayed: Mutex::new(HashSet::new()),
        }
    }

    fn displayed(&self) -> MutexGuard<'_, HashSet<DeviceId>> {
        self.displayed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, action: Action) {
        // The UI loop is gone once the receiver drops; nothing left to draw
        if self.action_tx.send(action).is_err() {
            trace!("view update dropped after UI shutdown");
        }
    }
}

impl DashboardView for TuiView {
    fn show_loading(&self) {
        self.send(Action::ShowLoading);
    }

    fn hide_loading(&self) {
        self.send(Action::HideLoading);
    }

    fn clear(&self) {
        self.displayed().clear();
        self.send(Action::ClearCards);
    }

    fn show_empty(&self, message: &str) {
        self.send(Action::ShowEmpty(message.to_owned()));
    }

    fn show_error(&self, message: &str) {
        self.send(Action::ShowError(message.to_owned()));
    }

    fn render_cards(&self, cards: Vec<DeviceCard>) {
        {
            let mut displayed = self.displayed();
            displayed.clear();
            displayed.extend(cards.iter().map(|c| c.device_id.clone()));
        }
        self.send(Action::RenderCards(cards));
    }

    fn has_card(&self, id: &DeviceId) -> bool {
        self.displayed().contains(id)
    }

    fn replace_card(&self, card: DeviceCard) {
        if self.has_card(&card.device_id) {
            self.send(Action::ReplaceCard(card));
        }
    }

    fn begin_pending(&self, control: &ControlRef, target_on: bool) {
        self.send(Action::BeginPending(control.clone(), target_on));
    }

    fn end_pending(&self, control: &ControlRef) {
        self.send(Action::EndPending(control.clone()));
    }
}

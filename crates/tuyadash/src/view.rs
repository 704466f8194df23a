//! Terminal implementation of `DashboardView` for one-shot commands.
//!
//! Keeps the displayed cards in memory so commands can print the final
//! state, shows an `indicatif` spinner on stderr for loading and pending
//! writes, and optionally streams every card replacement to stdout.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use tuyadash_core::{ControlRef, DashboardView, DeviceCard, DeviceId};

/// Message occupying the list area instead of cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMessage {
    Empty(String),
    Error(String),
}

/// Callback invoked with each replaced card.
type ReplaceHook = Box<dyn Fn(&DeviceCard) + Send + Sync>;

#[derive(Default)]
struct ViewState {
    cards: Vec<DeviceCard>,
    message: Option<ListMessage>,
    pending: HashSet<ControlRef>,
}

pub struct ConsoleView {
    state: Mutex<ViewState>,
    spinner: Mutex<Option<ProgressBar>>,
    show_progress: bool,
    on_replace: Option<ReplaceHook>,
}

impl ConsoleView {
    pub fn new(show_progress: bool) -> Self {
        Self {
            state: Mutex::new(ViewState::default()),
            spinner: Mutex::new(None),
            show_progress,
            on_replace: None,
        }
    }

    /// Call `hook` with every card a refresh loop swaps in.
    pub fn on_replace(mut self, hook: impl Fn(&DeviceCard) + Send + Sync + 'static) -> Self {
        self.on_replace = Some(Box::new(hook));
        self
    }

    /// Snapshot of the displayed cards, in display order.
    pub fn cards(&self) -> Vec<DeviceCard> {
        self.state().cards.clone()
    }

    pub fn card(&self, id: &DeviceId) -> Option<DeviceCard> {
        self.state().cards.iter().find(|c| &c.device_id == id).cloned()
    }

    pub fn message(&self) -> Option<ListMessage> {
        self.state().message.clone()
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn start_spinner(&self, message: String) {
        if !self.show_progress {
            return;
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        let previous = self
            .spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .replace(bar);
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn stop_spinner(&self) {
        let current = self
            .spinner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(bar) = current {
            bar.finish_and_clear();
        }
    }
}

impl DashboardView for ConsoleView {
    fn show_loading(&self) {
        self.start_spinner("Loading devices...".into());
    }

    fn hide_loading(&self) {
        self.stop_spinner();
    }

    fn clear(&self) {
        let mut state = self.state();
        state.cards.clear();
        state.message = None;
    }

    fn show_empty(&self, message: &str) {
        self.state().message = Some(ListMessage::Empty(message.to_owned()));
    }

    fn show_error(&self, message: &str) {
        self.state().message = Some(ListMessage::Error(message.to_owned()));
    }

    fn render_cards(&self, cards: Vec<DeviceCard>) {
        self.state().cards = cards;
    }

    fn has_card(&self, id: &DeviceId) -> bool {
        self.state().cards.iter().any(|c| &c.device_id == id)
    }

    fn replace_card(&self, card: DeviceCard) {
        {
            let mut state = self.state();
            let Some(slot) = state.cards.iter_mut().find(|c| c.device_id == card.device_id) else {
                return;
            };
            *slot = card.clone();
        }
        if let Some(hook) = &self.on_replace {
            hook(&card);
        }
    }

    fn begin_pending(&self, control: &ControlRef, target_on: bool) {
        self.state().pending.insert(control.clone());
        let word = if target_on { "on" } else { "off" };
        self.start_spinner(format!("Switching {control} {word}..."));
    }

    fn end_pending(&self, control: &ControlRef) {
        self.state().pending.remove(control);
        self.stop_spinner();
    }
}

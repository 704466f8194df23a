//! Devices screen: a scrolling column of device cards.
//!
//! Selection moves between cards (j/k) and between the switches of the
//! selected card (h/l). The list area shows either cards, the empty-state
//! message, or the load error, never more than one of them.

use std::collections::HashMap;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};

use tuyadash_core::{ControlRef, DeviceCard};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::card::{CardWidget, card_height};

/// Message occupying the list area instead of cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMessage {
    Empty(String),
    Error(String),
}

#[derive(Default)]
pub struct DevicesScreen {
    cards: Vec<DeviceCard>,
    message: Option<ListMessage>,
    loading: bool,
    /// Controls with a write in flight, mapped to their target value.
    pending: HashMap<ControlRef, bool>,
    selected: usize,
    switch_idx: usize,
    throbber_state: ThrobberState,
}

impl DevicesScreen {
    pub fn selected_card(&self) -> Option<&DeviceCard> {
        self.cards.get(self.selected)
    }

    /// Number of controls with a write in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn select(&mut self, idx: usize) {
        let last = self.cards.len().saturating_sub(1);
        let idx = idx.min(last);
        if idx != self.selected {
            self.switch_idx = 0;
        }
        self.selected = idx;
    }

    fn clamp_switch(&mut self) {
        let count = self.selected_card().map_or(0, |c| c.switches.len());
        self.switch_idx = self.switch_idx.min(count.saturating_sub(1));
    }

    fn move_switch(&mut self, forward: bool) {
        let count = self.selected_card().map_or(0, |c| c.switches.len());
        if forward {
            if self.switch_idx + 1 < count {
                self.switch_idx += 1;
            }
        } else {
            self.switch_idx = self.switch_idx.saturating_sub(1);
        }
    }

    /// The toggle intent for the focused switch, unless a write is in flight.
    fn toggle_selected(&self) -> Option<Action> {
        let card = self.selected_card()?;
        let switch = card.switches.get(self.switch_idx)?;
        let control = switch.control_ref(&card.device_id);
        if self.pending.contains_key(&control) {
            return None;
        }
        Some(Action::ToggleSwitch {
            control,
            next: switch.next,
            title: card.title.clone(),
        })
    }

    /// First card index to draw so the selected card is fully visible.
    fn first_visible(&self, height: u16) -> usize {
        let mut first = 0;
        while first < self.selected {
            let used: u16 = self.cards[first..=self.selected]
                .iter()
                .map(card_height)
                .fold(0, u16::saturating_add);
            if used <= height {
                break;
            }
            first += 1;
        }
        first
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        if self.loading {
            let throbber = Throbber::default()
                .label(" Loading devices...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            return;
        }
        let count = match self.cards.len() {
            1 => "1 device".to_owned(),
            n => format!("{n} devices"),
        };
        frame.render_widget(Paragraph::new(Span::styled(count, theme::muted())), area);
    }

    fn render_message(frame: &mut Frame, area: Rect, message: &ListMessage) {
        let (text, style) = match message {
            ListMessage::Empty(text) => (text, theme::muted()),
            ListMessage::Error(text) => (text, theme::error()),
        };
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .areas(area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(text.as_str(), style)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            middle,
        );
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect) {
        let mut y = area.y;
        let bottom = area.y.saturating_add(area.height);
        for (idx, card) in self
            .cards
            .iter()
            .enumerate()
            .skip(self.first_visible(area.height))
        {
            let remaining = bottom.saturating_sub(y);
            if remaining < 3 {
                break;
            }
            let height = card_height(card).min(remaining);
            let card_area = Rect::new(area.x, y, area.width, height);
            let mut widget = CardWidget::new(card, &self.pending);
            if idx == self.selected {
                widget = widget.selected(self.switch_idx);
            }
            frame.render_widget(widget, card_area);
            y = y.saturating_add(height);
        }
    }
}

impl Component for DevicesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return Ok(None);
        }
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.select(self.selected.saturating_add(1));
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select(self.selected.saturating_sub(1));
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.select(0);
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.select(usize::MAX);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.move_switch(true);
                None
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.move_switch(false);
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('r') => Some(Action::Reload),
            KeyCode::Char('u') => self
                .selected_card()
                .map(|c| Action::RefreshCard(c.device_id.clone())),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ShowLoading => self.loading = true,
            Action::HideLoading => self.loading = false,
            Action::ClearCards => {
                self.cards.clear();
                self.message = None;
                self.selected = 0;
                self.switch_idx = 0;
            }
            Action::ShowEmpty(text) => self.message = Some(ListMessage::Empty(text.clone())),
            Action::ShowError(text) => self.message = Some(ListMessage::Error(text.clone())),
            Action::RenderCards(cards) => {
                self.cards.clone_from(cards);
                self.select(self.selected);
                self.clamp_switch();
            }
            Action::ReplaceCard(card) => {
                if let Some(slot) = self.cards.iter_mut().find(|c| c.device_id == card.device_id) {
                    slot.clone_from(card);
                }
                self.clamp_switch();
            }
            Action::BeginPending(control, target) => {
                self.pending.insert(control.clone(), *target);
            }
            Action::EndPending(control) => {
                self.pending.remove(control);
            }
            Action::Tick => {
                if self.loading {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Devices ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [header, _, body] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        self.render_header(frame, header);

        match &self.message {
            Some(message) => Self::render_message(frame, body, message),
            None => self.render_cards(frame, body),
        }
    }
}

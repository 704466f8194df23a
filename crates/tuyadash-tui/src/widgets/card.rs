//! Device card widget: title, connectivity, switch buttons, readings.

use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use tuyadash_core::{ControlRef, DeviceCard};

use crate::theme;

/// Rows a card occupies, borders included.
pub fn card_height(card: &DeviceCard) -> u16 {
    let switches = u16::from(!card.switches.is_empty());
    let body = if card.is_empty() {
        1
    } else {
        u16::try_from(card.measurements.len()).unwrap_or(u16::MAX)
    };
    (2 + 1 + switches).saturating_add(body)
}

pub struct CardWidget<'a> {
    card: &'a DeviceCard,
    selected: bool,
    selected_switch: Option<usize>,
    pending: &'a HashMap<ControlRef, bool>,
}

impl<'a> CardWidget<'a> {
    pub fn new(card: &'a DeviceCard, pending: &'a HashMap<ControlRef, bool>) -> Self {
        Self {
            card,
            selected: false,
            selected_switch: None,
            pending,
        }
    }

    /// Mark the card selected, with the given switch focused.
    pub fn selected(mut self, switch: usize) -> Self {
        self.selected = true;
        self.selected_switch = Some(switch);
        self
    }

    fn status_line(&self) -> Line<'a> {
        let (dot, label, style) = match self.card.online {
            Some(true) => ("●", "online", theme::value().fg(theme::SUCCESS_GREEN)),
            Some(false) => ("○", "offline", theme::muted()),
            None => ("◌", "unknown", theme::muted()),
        };
        let mut spans = vec![
            Span::styled(format!("{dot} "), style),
            Span::styled(label, style),
        ];
        if let Some(ref subtitle) = self.card.subtitle {
            spans.push(Span::styled("  ·  ", theme::muted()));
            spans.push(Span::styled(subtitle.clone(), theme::muted()));
        }
        Line::from(spans)
    }

    fn switch_line(&self) -> Line<'a> {
        let mut spans = Vec::new();
        for (idx, switch) in self.card.switches.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" "));
            }
            let control = switch.control_ref(&self.card.device_id);
            if let Some(&target) = self.pending.get(&control) {
                let word = if target { "on" } else { "off" };
                spans.push(Span::styled(
                    format!("[ switching {word}… ]"),
                    theme::switch_pending(target),
                ));
            } else {
                let focused = self.selected && self.selected_switch == Some(idx);
                spans.push(Span::styled(
                    format!("[ {} ]", switch.label),
                    theme::switch_button(switch.on, focused),
                ));
            }
        }
        Line::from(spans)
    }

    fn body_lines(&self) -> Vec<Line<'a>> {
        if let Some(placeholder) = self.card.placeholder() {
            return vec![Line::from(Span::styled(placeholder, theme::muted()))];
        }
        let width = self
            .card
            .measurements
            .iter()
            .map(|m| m.label.chars().count())
            .max()
            .unwrap_or(0);
        self.card
            .measurements
            .iter()
            .map(|m| {
                Line::from(vec![
                    Span::styled(format!("{:<width$}  ", m.label), theme::text()),
                    Span::styled(m.value.clone(), theme::value()),
                ])
            })
            .collect()
    }
}

impl Widget for CardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.selected {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let block = Block::default()
            .title(format!(" {} ", self.card.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);

        let mut lines = vec![self.status_line()];
        if !self.card.switches.is_empty() {
            lines.push(self.switch_line());
        }
        lines.extend(self.body_lines());

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use tuyadash_core::{Device, DeviceId, Status, StatusValue};

    use super::*;

    fn lamp() -> DeviceCard {
        DeviceCard::from_device(&Device {
            id: DeviceId::from("bf01"),
            name: Some("Lamp".into()),
            product_name: Some("Smart Plug".into()),
            online: Some(true),
            status: vec![
                Status {
                    code: "switch_1".into(),
                    value: StatusValue::Bool(true),
                },
                Status {
                    code: "cur_power".into(),
                    value: StatusValue::Number(12.0),
                },
                Status {
                    code: "cur_voltage".into(),
                    value: StatusValue::Number(230.0),
                },
            ],
        })
    }

    fn draw(widget: CardWidget<'_>, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, 40, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_owned()
            })
            .collect()
    }

    #[test]
    fn height_counts_every_row() {
        let card = lamp();
        // borders + status + switches + two readings
        assert_eq!(card_height(&card), 6);

        let bare = DeviceCard::from_device(&Device {
            id: DeviceId::from("x"),
            name: None,
            product_name: None,
            online: None,
            status: Vec::new(),
        });
        // borders + status + placeholder
        assert_eq!(card_height(&bare), 4);
    }

    #[test]
    fn renders_title_switch_and_readings() {
        let card = lamp();
        let pending = HashMap::new();
        let rows = draw(CardWidget::new(&card, &pending), card_height(&card));

        assert!(rows[0].contains(" Lamp "));
        assert!(rows[1].contains("● online  ·  Smart Plug"));
        assert!(rows[2].contains("[ Turn off ]"));
        assert!(rows[3].contains("Power    12 W"));
        assert!(rows[4].contains("Voltage  230 V"));
    }

    #[test]
    fn pending_switch_shows_busy_label() {
        let card = lamp();
        let mut pending = HashMap::new();
        pending.insert(ControlRef::new(DeviceId::from("bf01"), "switch_1"), false);
        let rows = draw(CardWidget::new(&card, &pending), card_height(&card));

        assert!(rows[2].contains("[ switching off… ]"));
        assert!(!rows[2].contains("Turn off"));
    }

    #[test]
    fn empty_card_shows_placeholder() {
        let card = DeviceCard::from_device(&Device {
            id: DeviceId::from("x"),
            name: Some("Hub".into()),
            product_name: None,
            online: Some(false),
            status: Vec::new(),
        });
        let pending = HashMap::new();
        let rows = draw(CardWidget::new(&card, &pending), card_height(&card));

        assert!(rows[1].starts_with("│○ offline"));
        assert!(rows[1].ends_with('│'));
        assert!(rows[2].contains("No data to display."));
    }
}

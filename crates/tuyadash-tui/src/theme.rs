//! Palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for the selected card or a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

/// Border for an unselected card.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Normal body text.
pub fn text() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Secondary text such as product names and placeholders.
pub fn muted() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Measurement values.
pub fn value() -> Style {
    Style::default().fg(NEON_CYAN)
}

/// A switch button. The selected one is highlighted.
pub fn switch_button(on: bool, selected: bool) -> Style {
    let base = Style::default().fg(if on { SUCCESS_GREEN } else { DIM_WHITE });
    if selected {
        base.bg(BG_HIGHLIGHT).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        base
    }
}

/// A switch with a write in flight: dimmed, tinted to the target value.
pub fn switch_pending(target_on: bool) -> Style {
    Style::default()
        .fg(if target_on { SUCCESS_GREEN } else { CORAL })
        .add_modifier(Modifier::DIM | Modifier::ITALIC)
}

/// Error text in the list area.
pub fn error() -> Style {
    Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

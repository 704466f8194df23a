//! Application core: event loop, action dispatch, overlays.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use tuyadash_core::{
    ControlRef, Dashboard, DashboardClient, DashboardConfig, DeviceId, LoadOutcome,
    RefreshOutcome, StatusValue,
};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::DevicesScreen;
use crate::theme;
use crate::tui::Tui;
use crate::view::TuiView;

/// Top-level application state and event loop.
pub struct App {
    dashboard: Dashboard<DashboardClient>,
    screen: DevicesScreen,
    /// Backend shown in the status bar.
    backend_label: String,
    running: bool,
    help_visible: bool,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    /// Wire a dashboard whose view feeds this app's action channel.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let view = Arc::new(TuiView::new(action_tx.clone()));
        let dashboard = Dashboard::connect(config, view)?;

        Ok(Self {
            dashboard,
            screen: DevicesScreen::default(),
            backend_label: config.url.as_str().trim_end_matches('/').to_owned(),
            running: true,
            help_visible: false,
            notification: None,
            action_tx,
            action_rx,
        })
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        self.action_tx.send(Action::Reload)?;
        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.dashboard.shutdown();
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first, then the devices screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
                (_, KeyCode::Esc | KeyCode::Char('?')) => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    /// Process a single action: update app state and propagate to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
                self.dashboard.shutdown();
            }

            Action::Resize(w, h) => {
                debug!(width = w, height = h, "terminal resized");
                self.action_tx.send(Action::Render)?;
            }

            Action::Render => {}

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Reload => self.spawn_load(),
            Action::RefreshCard(id) => self.spawn_refresh(id.clone()),
            Action::ToggleSwitch {
                control,
                next,
                title,
            } => self.spawn_toggle(control.clone(), *next, title.clone()),

            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }

            Action::Tick => {
                // Auto-dismiss notifications after 3 seconds
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > Duration::from_secs(3))
                {
                    self.notification = None;
                }
                self.screen.update(action)?;
            }

            Action::ShowLoading
            | Action::HideLoading
            | Action::ClearCards
            | Action::ShowEmpty(_)
            | Action::ShowError(_)
            | Action::RenderCards(_)
            | Action::ReplaceCard(_)
            | Action::BeginPending(..)
            | Action::EndPending(_) => {
                if let Some(follow_up) = self.screen.update(action)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    fn spawn_load(&self) {
        let dashboard = self.dashboard.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let LoadOutcome::Loaded(n) = dashboard.load_devices().await {
                debug!(count = n, "device list loaded");
                let _ = tx.send(Action::Notify(Notification::info(format!(
                    "{n} device{} loaded",
                    if n == 1 { "" } else { "s" }
                ))));
            }
        });
    }

    fn spawn_refresh(&self, id: DeviceId) {
        let dashboard = self.dashboard.clone();
        tokio::spawn(async move {
            let outcome = dashboard.refresh_device(&id).await;
            debug!(device = %id, ?outcome, "manual refresh finished");
        });
    }

    /// Send the write and report its outcome as a toast.
    fn spawn_toggle(&self, control: ControlRef, next: bool, title: String) {
        let dashboard = self.dashboard.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let report = dashboard
                .send_command(&control.device_id, &control.code, StatusValue::Bool(next))
                .await;
            if matches!(report.refresh, RefreshOutcome::Cancelled { .. }) && dashboard.is_shut_down()
            {
                return;
            }
            let word = if next { "on" } else { "off" };
            let notification = if report.write_accepted {
                Notification::success(format!("{title}: {} → {word}", control.code))
            } else {
                Notification::error(format!("{title}: switching {word} was not accepted"))
            };
            let _ = tx.send(Action::Notify(notification));
        });
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [content, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        self.screen.render(frame, content);
        self.render_status_bar(frame, status);

        // Overlays on top (last = topmost)
        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::raw(" "),
            Span::styled("● ", Style::default().fg(theme::SUCCESS_GREEN)),
            Span::styled(self.backend_label.as_str(), theme::muted()),
        ];
        let pending = self.screen.pending_count();
        if pending > 0 {
            spans.push(Span::styled(
                format!("  ◐ {pending} pending"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        spans.push(Span::styled(
            " │ ⏎ toggle  r reload  ? help  q quit",
            theme::key_hint(),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 46u16.min(area.width.saturating_sub(4));
        let height = 14u16.min(area.height.saturating_sub(4));
        let x = area.width.saturating_sub(width) / 2;
        let y = area.height.saturating_sub(height) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, width, height);

        // Clear the background
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let row = |keys: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {keys:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let lines = vec![
            Line::from(""),
            row("j/k ↑/↓", "Select device"),
            row("h/l ←/→", "Select switch"),
            row("g/G", "First / last device"),
            row("Enter/Space", "Toggle switch"),
            row("u", "Refresh selected device"),
            row("r", "Reload all devices"),
            row("?", "This help"),
            row("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Render a notification toast in the bottom-right corner.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len
            .saturating_add(6)
            .clamp(20, 60)
            .min(area.width.saturating_sub(1));
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 1); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn app() -> App {
        let config = DashboardConfig::new("http://127.0.0.1:9".parse().unwrap());
        App::new(&config).unwrap()
    }

    fn key(modifiers: KeyModifiers, code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn frame_text(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| (0..width).map(|x| buf[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn global_keys_take_priority() {
        let mut app = app();
        assert_eq!(
            app.handle_key_event(key(KeyModifiers::NONE, KeyCode::Char('q')))
                .unwrap(),
            Some(Action::Quit)
        );
        assert_eq!(
            app.handle_key_event(key(KeyModifiers::CONTROL, KeyCode::Char('c')))
                .unwrap(),
            Some(Action::Quit)
        );
        assert_eq!(
            app.handle_key_event(key(KeyModifiers::NONE, KeyCode::Char('r')))
                .unwrap(),
            Some(Action::Reload)
        );
    }

    #[test]
    fn help_overlay_captures_keys() {
        let mut app = app();
        app.process_action(&Action::ToggleHelp).unwrap();

        assert_eq!(
            app.handle_key_event(key(KeyModifiers::NONE, KeyCode::Char('r')))
                .unwrap(),
            None
        );
        assert_eq!(
            app.handle_key_event(key(KeyModifiers::NONE, KeyCode::Esc))
                .unwrap(),
            Some(Action::ToggleHelp)
        );
        assert!(frame_text(&app, 80, 24).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn quit_shuts_the_dashboard_down() {
        let mut app = app();
        app.process_action(&Action::Quit).unwrap();

        assert!(!app.running);
        assert!(app.dashboard.is_shut_down());
    }

    #[test]
    fn notification_is_drawn_until_it_expires() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::success("Lamp: switch_1 → off")))
            .unwrap();
        assert!(frame_text(&app, 80, 24).contains("✓ Lamp: switch_1 → off"));

        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_some());

        let stale = Instant::now().checked_sub(Duration::from_secs(4)).unwrap();
        if let Some((_, created)) = app.notification.as_mut() {
            *created = stale;
        }
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }

    #[test]
    fn view_actions_reach_the_screen() {
        let mut app = app();
        app.process_action(&Action::ClearCards).unwrap();
        app.process_action(&Action::ShowEmpty("No devices found.".into()))
            .unwrap();

        let text = frame_text(&app, 80, 24);
        assert!(text.contains("No devices found."));
        assert!(text.contains("127.0.0.1:9"));
    }

    #[test]
    fn pending_writes_show_in_status_bar() {
        let mut app = app();
        let control = ControlRef::new(DeviceId::from("a"), "switch_1");
        app.process_action(&Action::BeginPending(control.clone(), true))
            .unwrap();
        assert!(frame_text(&app, 100, 24).contains("◐ 1 pending"));

        app.process_action(&Action::EndPending(control)).unwrap();
        assert!(!frame_text(&app, 100, 24).contains("pending"));
    }
}

//! Device command handlers.

use std::sync::Arc;

use serde_json::Value;
use tabled::Tabled;

use tuyadash_core::{
    CommandReport, Dashboard, DashboardClient, DashboardConfig, DeviceCard, DeviceId,
    LoadOutcome, RefreshOutcome, RefreshPlan, StatusValue,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::view::{ConsoleView, ListMessage};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Switches")]
    switches: String,
    #[tabled(rename = "Readings")]
    readings: String,
}

impl DeviceRow {
    fn from_card(card: &DeviceCard, color: bool) -> Self {
        Self {
            id: card.device_id.to_string(),
            name: card.title.clone(),
            product: card.subtitle.clone().unwrap_or_default(),
            state: output::online_label(card.online, color),
            switches: switch_summary(card, color),
            readings: reading_summary(card),
        }
    }
}

fn switch_summary(card: &DeviceCard, color: bool) -> String {
    card.switches
        .iter()
        .map(|s| format!("{} {}", s.code, output::on_off(s.on, color)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn reading_summary(card: &DeviceCard) -> String {
    card.measurements
        .iter()
        .map(|m| format!("{} {}", m.label, m.value))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn detail(card: &DeviceCard, color: bool) -> String {
    let mut lines = vec![
        format!("ID:       {}", card.device_id),
        format!("Name:     {}", card.title),
        format!("Product:  {}", card.subtitle.as_deref().unwrap_or("-")),
        format!("State:    {}", output::online_label(card.online, color)),
    ];
    if let Some(placeholder) = card.placeholder() {
        lines.push(placeholder.to_owned());
        return lines.join("\n");
    }
    for switch in &card.switches {
        lines.push(format!(
            "{:<9} {}  ({})",
            format!("{}:", switch.code),
            output::on_off(switch.on, color),
            switch.label
        ));
    }
    for m in &card.measurements {
        lines.push(format!("{:<9} {}", format!("{}:", m.label), m.value));
    }
    lines.join("\n")
}

/// One line per snapshot while watching.
fn snapshot_line(card: &DeviceCard, format: &OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            serde_json::to_string(card).unwrap_or_default()
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let stamp = chrono::Local::now().format("%H:%M:%S");
            let mut parts = vec![card.title.clone()];
            let switches = switch_summary(card, color);
            if !switches.is_empty() {
                parts.push(switches);
            }
            let readings = reading_summary(card);
            if !readings.is_empty() {
                parts.push(readings);
            }
            format!("[{stamp}] {}", parts.join(" | "))
        }
    }
}

/// Parse a command value: JSON when it parses, otherwise the raw word.
fn parse_value(raw: &str) -> StatusValue {
    serde_json::from_str::<Value>(raw).map_or_else(|_| StatusValue::Text(raw.to_owned()), Into::into)
}

fn describe(report: &CommandReport) -> String {
    let reads = match report.refresh {
        RefreshOutcome::Completed { attempts, successes } => {
            format!("{successes}/{attempts} reads")
        }
        RefreshOutcome::Cancelled { attempts } => format!("interrupted after {attempts} reads"),
        RefreshOutcome::CardMissing => "no reads".into(),
    };
    let write = if report.write_accepted {
        "accepted"
    } else {
        "not accepted"
    };
    format!("write {write}, {reads}")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    config: &DashboardConfig,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let show_progress = !global.quiet;

    match args.command {
        DevicesCommand::List => {
            let view = Arc::new(ConsoleView::new(show_progress));
            let dashboard = Dashboard::connect(config, view.clone())?;

            match dashboard.load_devices().await {
                LoadOutcome::Loaded(_) => {
                    let cards = view.cards();
                    let out = output::render_list(
                        &global.output,
                        &cards,
                        |c| DeviceRow::from_card(c, color),
                        |c| c.device_id.to_string(),
                    )?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                LoadOutcome::Empty => {
                    if let OutputFormat::Table | OutputFormat::Plain = global.output {
                        if let Some(ListMessage::Empty(message)) = view.message() {
                            output::print_notice(&message, global.quiet);
                        }
                    } else {
                        let out = output::render_list(
                            &global.output,
                            &Vec::<DeviceCard>::new(),
                            |c| DeviceRow::from_card(c, color),
                            |c| c.device_id.to_string(),
                        )?;
                        output::print_output(&out, global.quiet);
                    }
                    Ok(())
                }
                LoadOutcome::Failed(message) => Err(CliError::LoadFailed { message }),
            }
        }

        DevicesCommand::Get { device } => {
            let view = Arc::new(ConsoleView::new(false));
            let dashboard = Dashboard::connect(config, view)?;
            let card = dashboard.show_device(&DeviceId::from(device)).await?;
            let out = output::render_single(
                &global.output,
                &card,
                |c| detail(c, color),
                |c| c.device_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Toggle { device, code } => {
            let id = DeviceId::from(device);
            let view = Arc::new(ConsoleView::new(show_progress));
            let dashboard = Dashboard::connect(config, view.clone())?;

            let before = dashboard.show_device(&id).await?;
            let report = dashboard.toggle(&id, code.as_deref()).await?;
            let code = code
                .or_else(|| before.switches.first().map(|s| s.code.clone()))
                .unwrap_or_default();
            finish_command(&view, &id, &code, &report, global, color)
        }

        DevicesCommand::Set {
            device,
            code,
            value,
        } => {
            let id = DeviceId::from(device);
            let view = Arc::new(ConsoleView::new(show_progress));
            let dashboard = Dashboard::connect(config, view.clone())?;

            dashboard.show_device(&id).await?;
            let report = dashboard.send_command(&id, &code, parse_value(&value)).await;
            finish_command(&view, &id, &code, &report, global, color)
        }

        DevicesCommand::Watch {
            device,
            attempts,
            delay_ms,
        } => {
            let id = DeviceId::from(device);
            let format = global.output.clone();
            let quiet = global.quiet;
            let view = Arc::new(ConsoleView::new(false).on_replace(move |card| {
                output::print_output(&snapshot_line(card, &format, color), quiet);
            }));
            let dashboard = Dashboard::connect(config, view)?;

            let base = dashboard.policy().refresh;
            if attempts == Some(0) {
                return Err(CliError::Validation {
                    field: "attempts".into(),
                    reason: "must be at least 1".into(),
                });
            }
            let plan = RefreshPlan::new(
                attempts.unwrap_or(base.attempts),
                delay_ms.map_or(base.delay, std::time::Duration::from_millis),
            );

            dashboard.show_device(&id).await?;
            let watcher = dashboard.clone();
            let outcome = tokio::select! {
                outcome = watcher.refresh_device_with(&id, plan) => outcome,
                _ = tokio::signal::ctrl_c() => {
                    dashboard.shutdown();
                    return Err(CliError::Interrupted);
                }
            };

            if let RefreshOutcome::Completed {
                attempts,
                successes,
            } = outcome
            {
                output::print_notice(
                    &format!("{successes}/{attempts} reads succeeded"),
                    global.quiet,
                );
            }
            Ok(())
        }
    }
}

/// Print the reconciled card and map a refused write to an error.
fn finish_command(
    view: &ConsoleView,
    id: &DeviceId,
    code: &str,
    report: &CommandReport,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if let Some(card) = view.card(id) {
        let out = output::render_single(
            &global.output,
            &card,
            |c| detail(c, color),
            |c| c.device_id.to_string(),
        )?;
        output::print_output(&out, global.quiet);
    }
    output::print_notice(&describe(report), global.quiet);

    if report.write_accepted {
        Ok(())
    } else {
        Err(CliError::CommandRejected {
            device: id.to_string(),
            code: code.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tuyadash_core::{Device, Status};

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
            ],
        })
    }

    #[test]
    fn values_parse_as_json_or_fall_back_to_text() {
        assert_eq!(parse_value("true"), StatusValue::Bool(true));
        assert_eq!(parse_value("42"), StatusValue::Number(42.0));
        assert_eq!(parse_value("white"), StatusValue::Text("white".into()));
        assert_eq!(parse_value("\"colour\""), StatusValue::Text("colour".into()));
    }

    #[test]
    fn row_summarises_switches_and_readings() {
        let row = DeviceRow::from_card(&lamp(), false);
        assert_eq!(row.name, "Lamp");
        assert_eq!(row.product, "Smart Plug");
        assert_eq!(row.switches, "switch_1 on");
        assert_eq!(row.readings, "Power 12 W");
    }

    #[test]
    fn detail_lists_every_control() {
        let text = detail(&lamp(), false);
        assert!(text.contains("switch_1: on  (Turn off)"));
        assert!(text.contains("Power:    12 W"));
    }

    #[test]
    fn json_snapshot_is_one_line() {
        let line = snapshot_line(&lamp(), &OutputFormat::Json, false);
        assert!(!line.contains('\n'));
        assert!(line.contains("\"device_id\":\"bf01\""));
    }

    #[test]
    fn report_description_mentions_the_write() {
        let report = CommandReport {
            write_accepted: false,
            refresh: RefreshOutcome::Completed {
                attempts: 3,
                successes: 2,
            },
        };
        assert_eq!(describe(&report), "write not accepted, 2/3 reads");
    }
}

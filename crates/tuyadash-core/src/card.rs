// ── Card presentation ──
//
// Pure mapping from a device snapshot to a renderable card: which switches
// to offer, which measurements to show, and how to label and format them.
// Nothing here performs I/O; views decide how a card is drawn.

use serde::Serialize;

use crate::model::{Device, DeviceId, StatusValue};
use crate::view::ControlRef;

/// Title used when a device has no name.
pub const DEFAULT_TITLE: &str = "Device";

/// Shown in place of controls when a card has neither switches nor measurements.
pub const NO_DATA_MESSAGE: &str = "No data to display.";

/// Status codes worth showing as measurements.
const USEFUL_CODES: &[&str] = &[
    "switch",
    "switch_1",
    "switch_2",
    "switch_3",
    "switch_4",
    "temp_current",
    "temp_value",
    "va_temperature",
    "humidity_value",
    "va_humidity",
    "pm25",
    "co2",
    "battery_percentage",
    "cur_power",
    "power",
    "power_current",
    "cur_current",
    "cur_voltage",
    "add_ele",
    "ele",
    "electricity",
    "electricity_total",
    "bright_value",
    "bright_value_v2",
];

// ── Card types ──────────────────────────────────────────────────────

/// A toggleable on/off channel of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchControl {
    pub code: String,
    /// Button caption, e.g. "Turn off" or "Channel 2: Turn on".
    pub label: String,
    /// Current state as reported by the last snapshot.
    pub on: bool,
    /// Value a click sends.
    pub next: bool,
}

impl SwitchControl {
    pub fn control_ref(&self, device_id: &DeviceId) -> ControlRef {
        ControlRef::new(device_id.clone(), self.code.clone())
    }
}

/// A labelled, unit-formatted reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub code: String,
    pub label: String,
    pub value: String,
}

/// Everything a view needs to draw one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCard {
    pub device_id: DeviceId,
    pub title: String,
    pub subtitle: Option<String>,
    pub online: Option<bool>,
    pub switches: Vec<SwitchControl>,
    pub measurements: Vec<Measurement>,
}

impl DeviceCard {
    pub fn from_device(device: &Device) -> Self {
        let raw_switches: Vec<(&str, bool)> = device.switches().collect();
        let multi = raw_switches.len() > 1;
        let switches = raw_switches
            .into_iter()
            .map(|(code, on)| {
                let action = if on { "Turn off" } else { "Turn on" };
                let label = if multi {
                    format!("{}: {action}", translate_code(code))
                } else {
                    action.to_owned()
                };
                SwitchControl {
                    code: code.to_owned(),
                    label,
                    on,
                    next: !on,
                }
            })
            .collect();

        let mut seen: Vec<&str> = Vec::new();
        let mut measurements = Vec::new();
        for status in &device.status {
            let shown = !status.value.is_null()
                && status.value.as_bool().is_none()
                && is_useful_code(&status.code);
            if !shown || seen.contains(&status.code.as_str()) {
                continue;
            }
            seen.push(&status.code);
            measurements.push(Measurement {
                code: status.code.clone(),
                label: translate_code(&status.code),
                value: format_value(&status.code, &status.value),
            });
        }

        Self {
            device_id: device.id.clone(),
            title: device
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            subtitle: device.product_name.clone(),
            online: device.online,
            switches,
            measurements,
        }
    }

    /// `true` when there is nothing to show besides the title.
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty() && self.measurements.is_empty()
    }

    /// Placeholder text for an empty card.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(NO_DATA_MESSAGE)
    }

    pub fn switch(&self, code: &str) -> Option<&SwitchControl> {
        self.switches.iter().find(|s| s.code == code)
    }
}

// ── Labels ──────────────────────────────────────────────────────────

pub fn is_useful_code(code: &str) -> bool {
    USEFUL_CODES.contains(&code)
}

/// Human label for a status code.
pub fn translate_code(code: &str) -> String {
    let fixed = match code {
        "" => "Status",
        "temp_current" | "temp_value" | "va_temperature" => "Temperature",
        "humidity_value" | "va_humidity" => "Humidity",
        "pm25" => "PM2.5",
        "co2" => "CO₂",
        "battery_percentage" => "Battery",
        "cur_power" | "power" | "power_current" => "Power",
        "cur_current" => "Current",
        "cur_voltage" => "Voltage",
        "add_ele" | "ele" | "electricity" | "electricity_total" => "Energy",
        "bright_value" | "bright_value_v2" => "Brightness",
        "switch" => "Main",
        _ => "",
    };
    if !fixed.is_empty() {
        return fixed.to_owned();
    }
    if let Some(rest) = code.strip_prefix("switch_") {
        let channel = rest.split('_').next().unwrap_or_default();
        return format!("Channel {channel}");
    }
    code.split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Temperature and humidity readings above 100 in magnitude arrive scaled
/// by ten.
pub fn normalize_number(code: &str, value: f64) -> f64 {
    if (code.contains("temp") || code.contains("humidity")) && value.abs() > 100.0 {
        value / 10.0
    } else {
        value
    }
}

/// Display string for a status value, with units inferred from the code.
pub fn format_value(code: &str, value: &StatusValue) -> String {
    match value {
        StatusValue::Null => "—".to_owned(),
        StatusValue::Number(n) => format_number(code, *n),
        StatusValue::Bool(true) => "Active".to_owned(),
        StatusValue::Bool(false) => "Inactive".to_owned(),
        StatusValue::Text(s) => s.clone(),
        StatusValue::Structured(v) => v.to_string(),
    }
}

fn format_number(code: &str, raw: f64) -> String {
    let v = normalize_number(code, raw);
    if code.contains("temp") {
        format!("{:.1}°C", round_half_away(v, 1))
    } else if code.contains("humidity") || code.contains("battery") || code.contains("percent") {
        format!("{}%", rounded(v))
    } else if code.contains("cur_power") || code == "power" || code == "power_current" {
        format!("{} W", rounded(v))
    } else if code.contains("cur_voltage") {
        format!("{} V", rounded(v))
    } else if code.contains("cur_current") {
        format!("{:.2} A", round_half_away(v, 2))
    } else if code == "add_ele" || code == "ele" || code.contains("electricity") {
        format!("{:.2} kWh", round_half_away(v, 2))
    } else if code.contains("pm25") {
        format!("{} µg/m³", rounded(v))
    } else if code.contains("co2") {
        format!("{} ppm", rounded(v))
    } else {
        up_to_two_decimals(v)
    }
}

/// Round half up, printed without a fraction.
fn rounded(v: f64) -> String {
    let r = (v + 0.5).floor() + 0.0;
    format!("{r:.0}")
}

/// Round to `places` decimals with ties away from zero.
fn round_half_away(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v.abs() * scale + 0.5).floor().copysign(v) / scale
}

fn up_to_two_decimals(v: f64) -> String {
    let fixed = format!("{:.2}", round_half_away(v, 2));
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}

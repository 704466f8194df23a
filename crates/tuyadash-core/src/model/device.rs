// ── Device domain types ──

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── DeviceId ────────────────────────────────────────────────────────

/// Opaque, unique device identifier as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ── StatusValue ─────────────────────────────────────────────────────

/// The value of a single status attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Arrays and objects, kept as raw JSON.
    Structured(Value),
}

impl StatusValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Loose truthiness: false, null, zero, NaN, and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.abs() > 0.0,
            Self::Text(s) => !s.is_empty(),
            Self::Structured(_) => true,
        }
    }
}

// ── Status / Device ─────────────────────────────────────────────────

/// A named attribute of a device. Codes are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub code: String,
    pub value: StatusValue,
}

/// An immutable device snapshot. Every fetch produces a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: Option<String>,
    pub product_name: Option<String>,
    pub online: Option<bool>,
    pub status: Vec<Status>,
}

impl Device {
    /// Name used for ordering: missing names sort as the empty string.
    pub fn sort_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// First status entry with the given code.
    pub fn status(&self, code: &str) -> Option<&Status> {
        self.status.iter().find(|s| s.code == code)
    }

    /// Boolean switch statuses, first occurrence per code.
    ///
    /// A switch is any boolean status whose code starts with `switch`,
    /// except the `switch_led` light-mode flag.
    pub fn switches(&self) -> impl Iterator<Item = (&str, bool)> {
        let mut seen = Vec::new();
        self.status.iter().filter_map(move |s| {
            let on = s.value.as_bool()?;
            if !is_switch_code(&s.code) || seen.contains(&s.code.as_str()) {
                return None;
            }
            seen.push(s.code.as_str());
            Some((s.code.as_str(), on))
        })
    }
}

/// `true` for codes that name a controllable on/off channel.
pub fn is_switch_code(code: &str) -> bool {
    code.starts_with("switch") && code != "switch_led"
}

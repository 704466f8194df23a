// ── API-to-domain type conversions ──
//
// Bridges raw `tuyadash_api` response types into canonical
// `tuyadash_core::model` domain types. Blank names collapse to `None` so
// presentation and ordering see one notion of "missing".

use serde_json::Value;

use tuyadash_api::{DeviceResponse, StatusEntry};

use crate::model::{Device, DeviceId, Status, StatusValue};

// ── Helpers ────────────────────────────────────────────────────────

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Largest magnitude at which every integer is exact in an `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Whole numbers go out as JSON integers; devices reject `500.0` for
/// integer data points.
#[allow(clippy::float_cmp)]
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        return Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

// ── Conversions ────────────────────────────────────────────────────

impl From<Value> for StatusValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(ref n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Structured(value),
            },
            Value::String(s) => Self::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => Self::Structured(other),
        }
    }
}

impl From<StatusValue> for Value {
    fn from(value: StatusValue) -> Self {
        match value {
            StatusValue::Null => Value::Null,
            StatusValue::Bool(b) => Value::Bool(b),
            StatusValue::Number(n) => number_value(n),
            StatusValue::Text(s) => Value::String(s),
            StatusValue::Structured(v) => v,
        }
    }
}

impl From<StatusEntry> for Status {
    fn from(entry: StatusEntry) -> Self {
        Self {
            code: entry.code,
            value: entry.value.into(),
        }
    }
}

impl From<DeviceResponse> for Device {
    fn from(raw: DeviceResponse) -> Self {
        Self {
            id: DeviceId::from(raw.id),
            name: non_blank(raw.name),
            product_name: non_blank(raw.product_name),
            online: raw.online,
            status: raw.status.into_iter().map(Status::from).collect(),
        }
    }
}

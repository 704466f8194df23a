// Wire types for the device-management backend.
//
// These mirror the JSON the backend sends and accepts. Field handling is
// lenient: a missing, null, or non-array `devices`/`status` field decodes
// as an empty list, and a missing status value decodes as JSON null.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body of `GET /api/tuya/devices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceListResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub devices: Vec<DeviceResponse>,
}

/// A device snapshot as returned by the list and detail endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "product_name")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub status: Vec<StatusEntry>,
}

/// A single `{code, value}` attribute of a device.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusEntry {
    pub code: String,
    #[serde(default)]
    pub value: Value,
}

/// One entry of a command write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub code: String,
    pub value: Value,
}

impl DeviceCommand {
    pub fn new(code: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Request body of `POST /api/tuya/devices/{id}/command`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<'a> {
    pub commands: &'a [DeviceCommand],
}

/// Decode a JSON array, treating null or any non-array value as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Array(_)) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

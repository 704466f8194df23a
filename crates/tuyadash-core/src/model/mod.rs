// ── Domain model ──
//
// Canonical, API-independent device types. Every backend response is
// converted into these before it reaches the polling core or a view.

pub mod device;

pub use device::{Device, DeviceId, Status, StatusValue};

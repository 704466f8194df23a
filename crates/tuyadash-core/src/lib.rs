// tuyadash-core: Polling and reconciliation layer between tuyadash-api and consumers (CLI/TUI).

pub mod backend;
pub mod card;
pub mod command;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod model;
pub mod refresh;
pub mod registry;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::DeviceBackend;
pub use card::{DeviceCard, Measurement, SwitchControl};
pub use command::CommandReport;
pub use config::{DashboardConfig, PollingPolicy, RefreshPlan, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use loader::{EMPTY_MESSAGE, LoadOutcome};
pub use model::{Device, DeviceId, Status, StatusValue};
pub use refresh::RefreshOutcome;
pub use registry::{PollerHandle, PollerRegistry};
pub use view::{ControlRef, DashboardView};

pub use tuyadash_api::{DashboardClient, DeviceCommand};

// tuyadash-api: Async Rust client for the tuyadash device-management backend

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DashboardClient;
pub use error::Error;
pub use models::{CommandRequest, DeviceCommand, DeviceListResponse, DeviceResponse, StatusEntry};
pub use reqwest::StatusCode;
pub use transport::{TlsMode, TransportConfig};

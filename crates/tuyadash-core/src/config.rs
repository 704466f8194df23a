// ── Runtime dashboard configuration ──
//
// These types describe how to reach the backend and how aggressively to
// poll after user actions. They never touch disk: the CLI/TUI builds a
// `DashboardConfig` from its profile and hands it in.

use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a LAN backend).
    DangerAcceptInvalid,
}

/// A bounded polling schedule: how many reads, and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    pub attempts: u32,
    pub delay: Duration,
}

impl RefreshPlan {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Plan for an explicit single-device refresh: 6 reads, 600 ms apart.
    pub const DEFAULT: Self = Self::new(6, Duration::from_millis(600));

    /// Plan after the backend accepted a command: 8 reads, 700 ms apart.
    pub const AFTER_ACCEPTED: Self = Self::new(8, Duration::from_millis(700));

    /// Plan after a command write failed: 3 reads, 700 ms apart.
    pub const AFTER_REJECTED: Self = Self::new(3, Duration::from_millis(700));
}

impl Default for RefreshPlan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Polling schedules used by the [`Dashboard`](crate::Dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Plan used by `refresh_device`.
    pub refresh: RefreshPlan,
    /// Plan used after a 2xx command write.
    pub after_accepted: RefreshPlan,
    /// Plan used after a failed command write (transport error or non-2xx).
    pub after_rejected: RefreshPlan,
    /// Optional page-size hint for the device list call.
    pub page_size: Option<u32>,
}

impl PollingPolicy {
    /// Pick the post-command plan for a write outcome.
    pub fn after_command(&self, accepted: bool) -> RefreshPlan {
        if accepted {
            self.after_accepted
        } else {
            self.after_rejected
        }
    }
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            refresh: RefreshPlan::DEFAULT,
            after_accepted: RefreshPlan::AFTER_ACCEPTED,
            after_rejected: RefreshPlan::AFTER_REJECTED,
            page_size: None,
        }
    }
}

/// Configuration for talking to a single backend.
///
/// Built by CLI/TUI, passed to `Dashboard::connect`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend URL (e.g., `http://192.168.1.10:8080`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout applied by the transport.
    pub timeout: Duration,
    /// Polling schedules and list page size.
    pub polling: PollingPolicy,
}

impl DashboardConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            polling: PollingPolicy::default(),
        }
    }
}

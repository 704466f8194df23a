//! Shared configuration for the tuyadash CLI and TUI.
//!
//! TOML profiles merged with `TUYADASH_` environment variables, and
//! translation to `tuyadash_core::DashboardConfig`. Both binaries depend on
//! this crate; the CLI layers its `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tuyadash_core::{DashboardConfig, PollingPolicy, RefreshPlan, TlsVerification};

/// Upper bound for any configured attempt count.
const MAX_ATTEMPTS: u32 = 100;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://192.168.1.10:8080").
    pub url: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Page-size hint for the device list call.
    pub page_size: Option<u32>,

    /// Refresh schedule overrides.
    #[serde(default)]
    pub polling: PollingOverrides,
}

/// Per-profile overrides of the three refresh schedules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollingOverrides {
    pub refresh_attempts: Option<u32>,
    pub refresh_delay_ms: Option<u64>,
    pub accepted_attempts: Option<u32>,
    pub accepted_delay_ms: Option<u64>,
    pub rejected_attempts: Option<u32>,
    pub rejected_delay_ms: Option<u64>,
}

impl PollingOverrides {
    /// Apply the overrides on top of the built-in schedules.
    pub fn to_policy(&self, page_size: Option<u32>) -> Result<PollingPolicy, ConfigError> {
        let defaults = PollingPolicy::default();
        Ok(PollingPolicy {
            refresh: plan(
                "polling.refresh_attempts",
                defaults.refresh,
                self.refresh_attempts,
                self.refresh_delay_ms,
            )?,
            after_accepted: plan(
                "polling.accepted_attempts",
                defaults.after_accepted,
                self.accepted_attempts,
                self.accepted_delay_ms,
            )?,
            after_rejected: plan(
                "polling.rejected_attempts",
                defaults.after_rejected,
                self.rejected_attempts,
                self.rejected_delay_ms,
            )?,
            page_size,
        })
    }
}

fn plan(
    field: &str,
    base: RefreshPlan,
    attempts: Option<u32>,
    delay_ms: Option<u64>,
) -> Result<RefreshPlan, ConfigError> {
    let attempts = attempts.unwrap_or(base.attempts);
    if !(1..=MAX_ATTEMPTS).contains(&attempts) {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("expected 1..={MAX_ATTEMPTS}, got {attempts}"),
        });
    }
    let delay = delay_ms.map_or(base.delay, Duration::from_millis);
    Ok(RefreshPlan::new(attempts, delay))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tuyadash", "tuyadash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tuyadash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `TUYADASH_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TUYADASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a backend URL.
pub fn parse_backend_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{other}'"),
        }),
    }
}

/// Build a `DashboardConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url = parse_backend_url(&profile.url)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    if profile.page_size == Some(0) {
        return Err(ConfigError::Validation {
            field: "page_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(DashboardConfig {
        url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        polling: profile.polling.to_policy(profile.page_size)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 15

[profiles.home]
url = "http://192.168.1.10:8080"
page_size = 50

[profiles.home.polling]
accepted_attempts = 10
rejected_delay_ms = 250

[profiles.lab]
url = "https://lab.local"
insecure = true
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.output, "table");
    }

    #[test]
    fn profile_translates_with_overrides() {
        let cfg = sample();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "home");

        let dash = profile_to_dashboard_config(profile, &cfg.defaults).unwrap();
        assert_eq!(dash.url.as_str(), "http://192.168.1.10:8080/");
        assert_eq!(dash.tls, TlsVerification::SystemDefaults);
        assert_eq!(dash.timeout, Duration::from_secs(15));
        assert_eq!(dash.polling.page_size, Some(50));
        assert_eq!(dash.polling.after_accepted.attempts, 10);
        assert_eq!(dash.polling.after_accepted.delay, Duration::from_millis(700));
        assert_eq!(dash.polling.after_rejected.attempts, 3);
        assert_eq!(dash.polling.after_rejected.delay, Duration::from_millis(250));
        assert_eq!(dash.polling.refresh, RefreshPlan::DEFAULT);
    }

    #[test]
    fn insecure_profile_skips_verification() {
        let cfg = sample();
        let (_, profile) = cfg.profile(Some("lab")).unwrap();
        let dash = profile_to_dashboard_config(profile, &cfg.defaults).unwrap();
        assert_eq!(dash.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn unknown_profile_is_reported() {
        let cfg = sample();
        let err = cfg.profile(Some("office")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { ref name } if name == "office"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let overrides = PollingOverrides {
            refresh_attempts: Some(0),
            ..PollingOverrides::default()
        };
        let err = overrides.to_policy(None).unwrap_err();
        assert!(err.to_string().contains("polling.refresh_attempts"));
    }

    #[test]
    fn non_http_url_rejected() {
        let profile = Profile {
            url: "ftp://nas.local".into(),
            ..Profile::default()
        };
        let err = profile_to_dashboard_config(&profile, &Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("expected http or https"));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "http://10.0.0.2".into(),
                timeout: Some(5),
                ..Profile::default()
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        let (_, profile) = loaded.profile(None).unwrap();
        assert_eq!(profile.url, "http://10.0.0.2");
        assert_eq!(profile.timeout, Some(5));
    }
}

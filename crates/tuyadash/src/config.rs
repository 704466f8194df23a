//! CLI configuration: thin wrapper around `tuyadash_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --insecure, --timeout).

use std::time::Duration;

use tuyadash_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use tuyadash_config::{
    Config, PollingOverrides, Profile, config_path, load_config, load_config_or_default,
    parse_backend_url, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `DashboardConfig` for this invocation.
///
/// An existing profile is used with flag overrides on top. Without one,
/// `--url` alone is enough to run against the built-in schedules.
pub fn build_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &cfg, global);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.url.is_none() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;

    let fallback = Profile {
        url: url_str.to_owned(),
        ..Profile::default()
    };
    resolve_profile(&fallback, &cfg, global)
}

/// Translate a `Profile` + global flags into a `DashboardConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<DashboardConfig, CliError> {
    // 1. Backend URL (flag > env > profile)
    let url_str = global.url.as_deref().unwrap_or(&profile.url);
    let url = parse_backend_url(url_str)?;

    // 2. TLS verification
    let tls = if global.insecure || profile.insecure.unwrap_or(cfg.defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 3. Timeout
    let secs = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);
    if secs == 0 {
        return Err(CliError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    // 4. Refresh schedules
    if profile.page_size == Some(0) {
        return Err(CliError::Validation {
            field: "page_size".into(),
            reason: "must be at least 1".into(),
        });
    }
    let polling = profile.polling.to_policy(profile.page_size)?;

    Ok(DashboardConfig {
        url,
        tls,
        timeout: Duration::from_secs(secs),
        polling,
    })
}

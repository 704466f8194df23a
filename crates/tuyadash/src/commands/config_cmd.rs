//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display as TOML, profiles in name order.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(page_size) = p.page_size {
            let _ = writeln!(out, "page_size = {page_size}");
        }
        if p.polling != config::PollingOverrides::default() {
            if let Ok(polling) = toml::to_string(&p.polling) {
                let _ = writeln!(out, "\n[profiles.{name}.polling]");
                let _ = write!(out, "{polling}");
            }
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Apply one `key = value` assignment to a profile.
fn apply_setting(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    let attempts = |field: &str| parse_field::<u32>(field, value, "a whole number of attempts");
    let millis = |field: &str| parse_field::<u64>(field, value, "a number of milliseconds");
    let polling = &mut profile.polling;

    match key {
        "url" => {
            config::parse_backend_url(value)?;
            profile.url = value.to_owned();
        }
        "insecure" => profile.insecure = Some(parse_field(key, value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_field(key, value, "a number (seconds)")?),
        "page_size" | "page-size" => profile.page_size = Some(parse_field(key, value, "a number")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "polling.refresh_attempts" => polling.refresh_attempts = Some(attempts(key)?),
        "polling.refresh_delay_ms" => polling.refresh_delay_ms = Some(millis(key)?),
        "polling.accepted_attempts" => polling.accepted_attempts = Some(attempts(key)?),
        "polling.accepted_delay_ms" => polling.accepted_delay_ms = Some(millis(key)?),
        "polling.rejected_attempts" => polling.rejected_attempts = Some(attempts(key)?),
        "polling.rejected_delay_ms" => polling.rejected_delay_ms = Some(millis(key)?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, insecure, timeout, \
                     page_size, ca_cert, polling.{{refresh,accepted,rejected}}_{{attempts,delay_ms}}"
                ),
            });
        }
    }

    // Reject attempt counts the dashboard would refuse to load
    profile.polling.to_policy(profile.page_size)?;
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("tuyadash configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Backend URL")
                .default("http://localhost:8080".into())
                .validate_with(|input: &String| {
                    config::parse_backend_url(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let insecure = if url.starts_with("https") {
                Confirm::new()
                    .with_prompt("Accept self-signed certificates?")
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?
            } else {
                false
            };

            let profile = Profile {
                url,
                insecure: insecure.then_some(true),
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: tuyadash devices list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: tuyadash config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::print_notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            apply_setting(profile, &key, &value)?;

            config::save_config(&cfg)?;
            output::print_notice(
                &format!("✓ Set {key} on profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

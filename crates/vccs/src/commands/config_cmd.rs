//! Config subcommand handlers.

use std::fmt::Write;

use dialoguer::{Confirm, Input};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config as TOML-like text for display.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "reconnect_interval_ms = {}", d.reconnect_interval_ms);
    let _ = writeln!(out, "connect_timeout_ms = {}", d.connect_timeout_ms);
    let _ = writeln!(out, "sync_delay_ms = {}", d.sync_delay_ms);
    let _ = writeln!(out, "debounce_ms = {}", d.debounce_ms);
    let _ = writeln!(out, "strict_override = {}", d.strict_override);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "backend = \"{}\"", p.backend);
        let _ = writeln!(out, "facilities = \"{}\"", p.facilities);
        if !p.positions.is_empty() {
            let _ = writeln!(out, "positions = {:?}", p.positions);
        }
        if let Some(ms) = p.reconnect_interval_ms {
            let _ = writeln!(out, "reconnect_interval_ms = {ms}");
        }
        if let Some(ms) = p.sync_delay_ms {
            let _ = writeln!(out, "sync_delay_ms = {ms}");
        }
        if let Some(ms) = p.debounce_ms {
            let _ = writeln!(out, "debounce_ms = {ms}");
        }
        if let Some(strict) = p.strict_override {
            let _ = writeln!(out, "strict_override = {strict}");
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

fn prompt(label: &str, default: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(label)
        .default(default.to_owned())
        .interact_text()
        .map_err(prompt_err)
}

#[derive(Serialize)]
struct ProfileSummary {
    name: String,
    default: bool,
    backend: String,
    facilities: String,
    positions: Vec<String>,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Facilities")]
    facilities: String,
    #[tabled(rename = "Positions")]
    positions: String,
}

impl From<&ProfileSummary> for ProfileRow {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            marker: if p.default { "*" } else { "" },
            name: p.name.clone(),
            backend: p.backend.clone(),
            facilities: p.facilities.clone(),
            positions: p.positions.join(", "),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("vccs configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config()?;

            let profile_name = prompt("Profile name", "default")?;
            let backend = prompt("Backend websocket URL", "ws://127.0.0.1:9002")?;
            let facilities = prompt("Facility document (path or URL)", "facilities.json")?;
            let positions: String = Input::new()
                .with_prompt("Startup positions (comma-separated, primary first)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(backend, facilities);
            profile.positions = positions
                .split(',')
                .map(str::trim)
                .filter(|cs| !cs.is_empty())
                .map(str::to_owned)
                .collect();

            // validate before writing
            vccs_config::profile_to_session_config(&profile, &cfg.defaults)?;

            if cfg.profiles.contains_key(&profile_name) {
                let overwrite = Confirm::new()
                    .with_prompt(format!("Profile '{profile_name}' exists. Overwrite?"))
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?;
                if !overwrite {
                    return Ok(());
                }
            }

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }
            let path = config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: vccs positions --profile {profile_name}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let summaries: Vec<ProfileSummary> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileSummary {
                    name: name.clone(),
                    default: *name == active,
                    backend: p.backend.clone(),
                    facilities: p.facilities.clone(),
                    positions: p.positions.clone(),
                })
                .collect();

            if summaries.is_empty() && !global.quiet {
                eprintln!("No profiles configured. Create one with: vccs config init");
                return Ok(());
            }
            let out = output::render_list(
                global.output,
                &summaries,
                |p| ProfileRow::from(p),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                let available = cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ");
                return Err(CliError::ProfileNotFound { name, available });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_config_lists_profiles() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("ws://127.0.0.1:9002", "zoa.json");
        profile.positions = vec!["OAK_40_CTR".into()];
        profile.debounce_ms = Some(20);
        cfg.profiles.insert("zoa".into(), profile);

        let text = format_config(&cfg);
        assert!(text.contains("[profiles.zoa]"));
        assert!(text.contains("backend = \"ws://127.0.0.1:9002\""));
        assert!(text.contains("positions = [\"OAK_40_CTR\"]"));
        assert!(text.contains("debounce_ms = 20"));
        assert!(text.contains("sync_delay_ms = 4000"));
    }
}

//! CLI configuration: thin wrapper around `vccs_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--profile`, `--backend`, `--facilities`).

use vccs_core::{Facility, FacilitySource, SessionConfig, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vccs_config::{Config, Profile, config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Look up the active profile, with flag overrides applied.
///
/// An explicitly requested profile must exist. Without one, flags alone
/// can stand in for a missing default profile.
fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<Option<Profile>, CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(config),
            });
        }
        None => match (&global.backend, &global.facilities) {
            (None, None) => return Ok(None),
            (backend, facilities) => Profile::new(
                backend.clone().unwrap_or_default(),
                facilities.clone().unwrap_or_default(),
            ),
        },
    };

    if let Some(ref backend) = global.backend {
        profile.backend.clone_from(backend);
    }
    if let Some(ref facilities) = global.facilities {
        profile.facilities.clone_from(facilities);
    }
    Ok(Some(profile))
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

fn no_config() -> CliError {
    CliError::NoConfig {
        path: config_path().display().to_string(),
    }
}

/// Full session configuration for `run`.
pub fn session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let config = load_config()?;
    let profile = resolve_profile(global, &config)?.ok_or_else(no_config)?;
    if profile.backend.is_empty() {
        return Err(no_config());
    }
    Ok(vccs_config::profile_to_session_config(&profile, &config.defaults)?)
}

/// Facility source and startup positions for the offline commands.
/// Needs no backend.
pub fn offline_source(global: &GlobalOpts) -> Result<(FacilitySource, Vec<String>), CliError> {
    let config = load_config()?;
    let profile = resolve_profile(global, &config)?.ok_or_else(no_config)?;
    if profile.facilities.trim().is_empty() {
        return Err(CliError::Validation {
            field: "facilities".into(),
            reason: "no facility document configured; pass --facilities".into(),
        });
    }
    Ok((FacilitySource::parse(&profile.facilities), profile.positions))
}

/// Load the facility document for the offline commands.
pub async fn load_facility(global: &GlobalOpts) -> Result<(Facility, Vec<String>), CliError> {
    let (source, positions) = offline_source(global)?;
    let facility = source.load(&TransportConfig::default()).await?;
    Ok((facility, positions))
}

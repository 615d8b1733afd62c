use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use snip_config::Config;

const MAIN_PROFILE: &str = "main";

/// `<config dir>/snip/profiles`
fn profiles_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("No user config directory on this platform")?;
    Ok(base.join("snip").join("profiles"))
}

fn profile_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Represents a user profile
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

fn read_profile(path: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let profile: Profile = serde_json::from_str(&data)
        .with_context(|| format!("Invalid profile {}", path.display()))?;
    Ok(profile.value)
}

fn write_profile(path: &Path, name: &str, value: Config) -> anyhow::Result<()> {
    let profile = Profile {
        name: name.into(),
        value,
    };
    fs::write(path, serde_json::to_string_pretty(&profile)?)
        .with_context(|| format!("Failed to write profile {}", path.display()))
}

/// Initialize user config folders and main profile if missing
pub fn init_user_config() -> anyhow::Result<()> {
    init_in(&profiles_dir()?)
}

/// Load a user profile by name, defaulting to main if name not found
pub fn load_user_profile(name: &str) -> anyhow::Result<Config> {
    load_from(&profiles_dir()?, name)
}

/// Add a new profile cloned from main (or defaults if main missing)
pub fn add_profile_from_default(new_name: &str) -> anyhow::Result<PathBuf> {
    add_in(&profiles_dir()?, new_name)
}

fn init_in(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let main_profile = profile_path(dir, MAIN_PROFILE);
    if !main_profile.exists() {
        write_profile(&main_profile, MAIN_PROFILE, Config::default())?;
        tracing::info!(path = %main_profile.display(), "Created main profile");
    }
    Ok(())
}

fn load_from(dir: &Path, name: &str) -> anyhow::Result<Config> {
    let profile_file = profile_path(dir, name);
    if profile_file.exists() {
        return read_profile(&profile_file);
    }

    tracing::warn!("Profile {name} not found, falling back to main profile or defaults");
    let main_file = profile_path(dir, MAIN_PROFILE);
    if main_file.exists() {
        read_profile(&main_file)
    } else {
        Ok(Config::default())
    }
}

fn add_in(dir: &Path, new_name: &str) -> anyhow::Result<PathBuf> {
    anyhow::ensure!(
        !new_name.is_empty() && !new_name.contains(['/', '\\', '.']),
        "Invalid profile name '{new_name}'"
    );
    let file = profile_path(dir, new_name);
    anyhow::ensure!(!file.exists(), "Profile '{new_name}' already exists");

    fs::create_dir_all(dir)?;
    let value = load_from(dir, MAIN_PROFILE)?;
    write_profile(&file, new_name, value)?;
    tracing::info!("Created new profile: {new_name}");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_main_once() {
        let dir = tempfile::tempdir().unwrap();
        init_in(dir.path()).unwrap();

        let main = profile_path(dir.path(), MAIN_PROFILE);
        let mut config = read_profile(&main).unwrap();
        assert_eq!(config, Config::default());

        config.toast.duration_ms = 5000;
        write_profile(&main, MAIN_PROFILE, config).unwrap();
        init_in(dir.path()).unwrap();
        assert_eq!(read_profile(&main).unwrap().toast.duration_ms, 5000);
    }

    #[test]
    fn missing_profile_falls_back_to_main_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_from(dir.path(), "work").unwrap(), Config::default());

        let mut main = Config::default();
        main.ocr.language = "ja".into();
        write_profile(&profile_path(dir.path(), MAIN_PROFILE), MAIN_PROFILE, main).unwrap();
        assert_eq!(load_from(dir.path(), "work").unwrap().ocr.language, "ja");
    }

    #[test]
    fn new_profile_copies_main() {
        let dir = tempfile::tempdir().unwrap();
        let mut main = Config::default();
        main.hotkey.key = "F9".into();
        init_in(dir.path()).unwrap();
        write_profile(&profile_path(dir.path(), MAIN_PROFILE), MAIN_PROFILE, main).unwrap();

        let path = add_in(dir.path(), "games").unwrap();
        assert_eq!(read_profile(&path).unwrap().hotkey.key, "F9");
        assert!(add_in(dir.path(), "games").is_err());
        assert!(add_in(dir.path(), "../escape").is_err());
    }

    #[test]
    fn corrupt_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(profile_path(dir.path(), "broken"), "{ not json").unwrap();
        assert!(load_from(dir.path(), "broken").is_err());
    }
}

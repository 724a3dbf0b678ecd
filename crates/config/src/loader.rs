use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::{debug, warn}};

use crate::{
    error::{Context, Result},
    schema::MantleConfig,
};

/// Standard config file name, checked in `./` then the user config dir.
const CONFIG_FILENAME: &str = "mantle.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> Result<MantleConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = toml::from_str(&raw)?;
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./mantle.toml` (project-local)
/// 2. `~/.config/mantle/mantle.toml` (user-global)
///
/// Returns `MantleConfig::default()` if no config file is found. The
/// environment still overrides either outcome via [`apply_env_overrides`].
pub fn discover_and_load() -> MantleConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(config) => return config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MantleConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "mantle") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}

/// Apply environment-variable overrides on top of a loaded config.
///
/// The environment wins over the config file for every value it names.
pub fn apply_env_overrides(config: &mut MantleConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

fn apply_overrides(config: &mut MantleConfig, get: impl Fn(&str) -> Option<String>) {
    if let Some(token) = get("DISCORD_TOKEN") {
        config.discord.token = Some(Secret::new(token));
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        config.assistant.api_key = Some(Secret::new(key));
    }
    if let Some(id) = get("ASSISTANT_ID") {
        config.assistant.assistant_id = Some(id);
    }
    if let Some(url) = get("ASSISTANT_BASE_URL") {
        config.assistant.base_url = url;
    }
    if let Some(hours) = get("MANTLE_IDLE_HOURS") {
        match hours.parse() {
            Ok(parsed) => config.session.idle_hours = parsed,
            Err(_) => warn!(value = %hours, "ignoring unparsable MANTLE_IDLE_HOURS"),
        }
    }
    if let Some(limit) = get("MANTLE_MESSAGE_LIMIT") {
        match limit.parse() {
            Ok(parsed) => config.discord.message_limit = parsed,
            Err(_) => warn!(value = %limit, "ignoring unparsable MANTLE_MESSAGE_LIMIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {std::collections::HashMap, std::io::Write};

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn load_config_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[discord]\nmessage_limit = 500\n\n[session]\nidle_hours = 3"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.discord.message_limit, 500);
        assert_eq!(config.session.idle_hours, 3);
    }

    #[test]
    fn load_config_missing_file_errors() {
        assert!(load_config(Path::new("/nonexistent/mantle.toml")).is_err());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let vars = env(&[
            ("DISCORD_TOKEN", "env-token"),
            ("ASSISTANT_ID", "asst_env"),
            ("MANTLE_IDLE_HOURS", "12"),
        ]);
        let mut config = MantleConfig::default();
        config.assistant.assistant_id = Some("asst_file".into());

        apply_overrides(&mut config, |name| vars.get(name).cloned());

        assert!(config.discord.token.is_some());
        assert_eq!(config.assistant.assistant_id.as_deref(), Some("asst_env"));
        assert_eq!(config.session.idle_hours, 12);
    }

    #[test]
    fn unparsable_numeric_override_is_ignored() {
        let vars = env(&[("MANTLE_IDLE_HOURS", "soon")]);
        let mut config = MantleConfig::default();

        apply_overrides(&mut config, |name| vars.get(name).cloned());

        assert_eq!(config.session.idle_hours, 1);
    }

    #[test]
    fn absent_environment_changes_nothing() {
        let mut config = MantleConfig::default();
        apply_overrides(&mut config, |_| None);
        assert!(config.discord.token.is_none());
        assert_eq!(config.assistant.base_url, "https://api.openai.com/v1");
    }
}

//! Configuration and database path resolution

use std::path::{Path, PathBuf};

/// Database file name inside the application data directory
const DATABASE_FILE_NAME: &str = "spectral-library.db";

/// Environment variable overriding the database location
const DATABASE_ENV_VAR: &str = "SPECLIB_DATABASE";

/// Resolve the catalog database path following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SPECLIB_DATABASE` environment variable
/// 3. TOML config file (`database_path` key)
/// 4. OS-dependent data directory (fallback)
pub fn resolve_database_path(cli_arg: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = database_path_from_config_file() {
        return path;
    }

    // Priority 4: OS-dependent data directory
    default_data_dir().join(DATABASE_FILE_NAME)
}

/// Read `database_path` from the user config file, if one exists
fn database_path_from_config_file() -> Option<PathBuf> {
    let config_path = dirs::config_dir()?.join("speclib").join("config.toml");
    let content = std::fs::read_to_string(config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get("database_path")
        .and_then(|value| value.as_str())
        .map(PathBuf::from)
}

/// OS-dependent default application data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("speclib"))
        .unwrap_or_else(|| PathBuf::from("./speclib_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cli_argument_has_highest_priority() {
        std::env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");
        let resolved = resolve_database_path(Some(Path::new("/tmp/from-cli.db")));
        std::env::remove_var(DATABASE_ENV_VAR);

        assert_eq!(resolved, PathBuf::from("/tmp/from-cli.db"));
    }

    #[test]
    #[serial]
    fn environment_variable_used_without_cli_argument() {
        std::env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");
        let resolved = resolve_database_path(None);
        std::env::remove_var(DATABASE_ENV_VAR);

        assert_eq!(resolved, PathBuf::from("/tmp/from-env.db"));
    }

    #[test]
    #[serial]
    fn falls_back_to_data_directory() {
        std::env::remove_var(DATABASE_ENV_VAR);
        let resolved = resolve_database_path(None);

        assert!(resolved.ends_with(Path::new(DATABASE_FILE_NAME)));
    }
}

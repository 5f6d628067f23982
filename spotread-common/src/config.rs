//! Configuration loading and library folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Library folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`library_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_library_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = load_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("library_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_library_folder())
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/spotread/config.toml first, then /etc/spotread/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("spotread").join("config.toml"));
        let system_config = PathBuf::from("/etc/spotread/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("spotread").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default library folder path
fn default_library_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/spotread
        dirs::data_local_dir()
            .map(|d| d.join("spotread"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/spotread"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/spotread
        dirs::data_dir()
            .map(|d| d.join("spotread"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/spotread"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\spotread
        dirs::data_local_dir()
            .map(|d| d.join("spotread"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\spotread"))
    } else {
        PathBuf::from("./spotread_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let folder = resolve_library_folder(Some("/tmp/books"), "SPOTREAD_TEST_UNSET").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/books"));
    }

    #[test]
    fn test_env_var_used_when_no_cli_arg() {
        std::env::set_var("SPOTREAD_TEST_LIB", "/tmp/env-books");
        let folder = resolve_library_folder(None, "SPOTREAD_TEST_LIB").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/env-books"));
        std::env::remove_var("SPOTREAD_TEST_LIB");
    }

    #[test]
    fn test_fallback_is_nonempty() {
        let folder = resolve_library_folder(None, "SPOTREAD_TEST_UNSET_2").unwrap();
        assert!(!folder.as_os_str().is_empty());
    }
}

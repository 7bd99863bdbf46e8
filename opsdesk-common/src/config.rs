//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
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
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Get the configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/opsdesk/config.toml first, then /etc/opsdesk/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("opsdesk").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/opsdesk/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("opsdesk").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/opsdesk (or /var/lib/opsdesk for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("opsdesk"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/opsdesk"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/opsdesk
        dirs::data_dir()
            .map(|d| d.join("opsdesk"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/opsdesk"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\opsdesk
        dirs::data_local_dir()
            .map(|d| d.join("opsdesk"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\opsdesk"))
    } else {
        PathBuf::from("./opsdesk_data")
    }
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
    }
    Ok(())
}

/// Path of a service database file inside the root folder
pub fn database_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}

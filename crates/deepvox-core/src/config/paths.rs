//! Default filesystem locations
//!
//! Everything deepvox persists lives under `~/.deepvox`: the YAML config
//! and the soundboard directory the user drops effect files into.

use std::path::PathBuf;

/// Base directory: `~/.deepvox`
pub fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".deepvox")
}

/// Default config file: `~/.deepvox/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.yaml")
}

/// Default soundboard directory: `~/.deepvox/soundboard`
pub fn default_soundboard_path() -> PathBuf {
    default_base_dir().join("soundboard")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_under_base_dir() {
        let path = default_config_path();
        assert!(path.ends_with("config.yaml"));
        assert!(path.starts_with(default_base_dir()));
    }

    #[test]
    fn test_soundboard_path_is_under_base_dir() {
        let path = default_soundboard_path();
        assert!(path.ends_with("soundboard"));
    }
}

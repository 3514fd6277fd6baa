use directories::BaseDirs;
use std::path::PathBuf;

/// Application config directory (OS standard)
/// Linux: ~/.config/WrenKey
/// macOS: ~/Library/Application Support/WrenKey
/// Windows: %APPDATA%\\WrenKey
pub fn app_config_dir() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.config_dir().join("WrenKey");
    }
    // Fallback: current working directory
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

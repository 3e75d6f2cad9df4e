//! Cross-platform default paths, adapted from the teacher's
//! `sonido-config::paths` (same `dirs`-backed lookup-with-fallback shape,
//! specialized to Syntə's one config file and one hot-reload scratch
//! directory instead of a presets tree).

use std::path::PathBuf;

const APP_NAME: &str = "synte";

/// `~/.config/synte/` (Linux), the platform config dir equivalent elsewhere,
/// or `.` if the platform config dir can't be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

/// Default path for `synte.toml`, inside [`user_config_dir`].
pub fn default_config_path() -> PathBuf {
    user_config_dir().join("synte.toml")
}

/// Default hot-reload scratch directory the editor writes `<n>.syt` files
/// into and the watcher polls (§4.I). Distinct from the config directory so
/// wiping it doesn't also wipe `synte.toml`.
pub fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join(APP_NAME)
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &std::path::Path) -> Result<(), crate::ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| crate::ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

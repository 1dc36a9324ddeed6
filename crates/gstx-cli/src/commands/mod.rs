pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use gstx_core::GstxConfig;
use tracing::debug;

/// Per-user config file, e.g. `~/.config/gstx/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gstx")
        .join("config.json")
}

/// Load the config file given with `--config`, else the per-user file if
/// it exists, else the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<GstxConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(GstxConfig::default());
            }
            path
        }
    };

    debug!("Loading config from {}", path.display());
    Ok(GstxConfig::from_file(&path)?)
}

/// Reject inputs that still need OCR.
pub fn ensure_text_input(path: &Path) -> anyhow::Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if matches!(extension.as_str(), "pdf" | "jpg" | "jpeg" | "png") {
        anyhow::bail!(
            "Unsupported input {}: run OCR first and pass the recovered text (.txt)",
            path.display()
        );
    }
    Ok(())
}

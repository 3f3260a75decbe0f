use anyhow::{Result, anyhow};
use std::fs;
use std::path::PathBuf;

pub fn get_ar_notes_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".ar-notes"))
}

pub fn get_config_path() -> Result<PathBuf> {
    let dir = get_ar_notes_dir()?;
    Ok(dir.join("config.toml"))
}

pub fn get_database_path() -> Result<PathBuf> {
    let dir = get_ar_notes_dir()?;
    Ok(dir.join("notes.db"))
}

pub fn get_crash_log_path() -> Result<PathBuf> {
    let dir = get_ar_notes_dir()?;
    Ok(dir.join("crash.log"))
}

/// Rolling log files live under the platform data directory, e.g.
/// `~/.local/share/ar-notes/logs` on Linux.
pub fn get_logs_dir() -> Result<PathBuf> {
    let data = dirs::data_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
    Ok(data.join("ar-notes").join("logs"))
}

pub fn ensure_ar_notes_dir_exists() -> Result<PathBuf> {
    let dir = get_ar_notes_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

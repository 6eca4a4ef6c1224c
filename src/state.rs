//! Record of the last successful provision.
//!
//! Written after a run completes so `show status` can report when the
//! SDK was installed, from which commit, and whether the current
//! configuration still matches. Absence or corruption of the record is
//! never fatal; it only degrades status output.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// What a completed run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub finished_at_epoch_secs: u64,
    pub fingerprint: String,
    pub sdk_commit: Option<String>,
    pub sdk_describe: Option<String>,
    pub install_prefix: PathBuf,
}

impl ProvisionRecord {
    pub fn new(
        fingerprint: String,
        sdk_commit: Option<String>,
        sdk_describe: Option<String>,
        install_prefix: PathBuf,
    ) -> Self {
        ProvisionRecord {
            finished_at_epoch_secs: unix_now(),
            fingerprint,
            sdk_commit,
            sdk_describe,
            install_prefix,
        }
    }

    /// Seconds since this record was written.
    pub fn age_secs(&self) -> u64 {
        unix_now().saturating_sub(self.finished_at_epoch_secs)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Rough age for status output.
pub fn age_string(secs: u64) -> String {
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}

/// Directory for realprep's own bookkeeping.
pub fn state_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("realprep")
}

pub fn record_path() -> PathBuf {
    record_path_in(&state_dir())
}

pub fn record_path_in(dir: &Path) -> PathBuf {
    dir.join("last-provision.json")
}

pub fn save(record: &ProvisionRecord) -> Result<()> {
    save_to(&record_path(), record)
}

pub fn save_to(path: &Path, record: &ProvisionRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Load the last provision record, tolerating absence and corruption.
pub fn load() -> Option<ProvisionRecord> {
    load_from(&record_path())
}

pub fn load_from(path: &Path) -> Option<ProvisionRecord> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(record) => Some(record),
        Err(e) => {
            println!("  [WARN] Ignoring unreadable record {}: {}", path.display(), e);
            None
        }
    }
}

/// Remove the record. Returns true if one existed.
pub fn clear() -> Result<bool> {
    let path = record_path();
    if path.exists() {
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

//! Cleaning of realprep's on-disk artifacts.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::state;

/// Remove a directory tree if it exists. Returns true if removed.
pub fn remove_tree(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}

/// Remove the SDK clone directory.
///
/// Refuses to touch a tree that REALSENSE_SOURCE also points at; an
/// override tree is the user's, not ours to delete.
pub fn clean_source(config: &Config) -> Result<()> {
    if let Some(override_path) = &config.source_override {
        if override_path == &config.clone_dir {
            bail!(
                "REALSENSE_SOURCE points at the clone directory {}; refusing to remove it",
                config.clone_dir.display()
            );
        }
    }

    if remove_tree(&config.clone_dir)? {
        println!("Removed SDK clone at {}", config.clone_dir.display());
    } else {
        println!("No SDK clone to clean (already clean)");
    }
    Ok(())
}

/// Remove the last-provision record.
pub fn clean_state() -> Result<()> {
    if state::clear()? {
        println!("Removed provision record at {}", state::record_path().display());
    } else {
        println!("No provision record to clean (already clean)");
    }
    Ok(())
}

/// Remove everything realprep tracks. Installed SDK files stay; use
/// `make uninstall` from a kept build directory to remove those.
pub fn clean_all(config: &Config) -> Result<()> {
    clean_source(config)?;
    clean_state()?;
    Ok(())
}

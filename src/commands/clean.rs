//! Clean command - removes realprep's on-disk artifacts.

use anyhow::Result;

use crate::clean;
use crate::config::Config;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// SDK clone directory (default)
    Source,
    /// Last-provision record
    State,
    /// Everything realprep tracks
    All,
}

/// Execute the clean command.
pub fn cmd_clean(config: &Config, target: CleanTarget) -> Result<()> {
    match target {
        CleanTarget::Source => {
            clean::clean_source(config)?;
        }
        CleanTarget::State => {
            clean::clean_state()?;
        }
        CleanTarget::All => {
            clean::clean_all(config)?;
        }
    }
    Ok(())
}

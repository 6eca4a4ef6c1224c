//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `provision` - Run the full SDK install sequence
//! - `preflight` - Run preflight checks
//! - `clean` - Remove the clone and bookkeeping
//! - `show` - Display configuration, plan, and status

pub mod clean;
mod preflight;
pub mod provision;
pub mod show;

pub use clean::cmd_clean;
pub use preflight::cmd_preflight;
pub use provision::cmd_provision;
pub use show::cmd_show;

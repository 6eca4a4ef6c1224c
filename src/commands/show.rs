//! Show command - displays information.

use anyhow::Result;

use crate::config::Config;
use crate::plan::{self, Plan};
use crate::state;
use crate::verify;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show the steps a provision run would execute
    Plan,
    /// Show install state on this host
    Status,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Plan => {
            Plan::for_run(config, true, false).print();
        }
        ShowTarget::Status => {
            show_status(config);
        }
    }
    Ok(())
}

fn show_status(config: &Config) {
    println!("=== Provision Status ===\n");

    match state::load() {
        Some(record) => {
            println!(
                "Last provision: {}",
                state::age_string(record.age_secs())
            );
            if let Some(describe) = &record.sdk_describe {
                println!("  SDK version: {}", describe);
            }
            if let Some(commit) = &record.sdk_commit {
                println!("  SDK commit:  {}", commit);
            }
            println!("  Prefix:      {}", record.install_prefix.display());
            if plan::fingerprint(config) == record.fingerprint {
                println!("  Config:      unchanged since last run");
            } else {
                println!("  Config:      CHANGED since last run; re-run 'realprep provision'");
            }
        }
        None => {
            println!("No provision recorded on this host.");
        }
    }

    println!();
    let prefix = &config.install_prefix;
    print_presence(
        &format!("Headers under {}/include", prefix.display()),
        verify::headers_present(prefix),
    );
    print_presence(
        &format!("Libraries under {}/lib", prefix.display()),
        verify::libraries_present(prefix),
    );
    print_presence("udev rules", verify::rules_present());

    if config.clone_dir.exists() {
        println!("  Source clone: {}", config.clone_dir.display());
    } else {
        println!("  Source clone: none");
    }
}

fn print_presence(name: &str, present: bool) {
    let icon = if present { "✓" } else { "✗" };
    println!("  {} {}", icon, name);
}

//! realprep - RealSense SDK provisioner.
//!
//! Prepares a Debian-family container for Intel RealSense development:
//! - apt index refresh, system upgrade, build and runtime packages
//! - librealsense2 source checkout
//! - udev rules for camera access
//! - CMake/Make build and install, then cleanup

use anyhow::Result;
use clap::{Parser, Subcommand};

use realprep::commands;
use realprep::config::Config;

#[derive(Parser)]
#[command(name = "realprep")]
#[command(about = "RealSense SDK provisioner for Debian-family containers")]
#[command(
    after_help = "QUICK START:\n  realprep preflight  Check the host before provisioning\n  realprep provision  Install deps, build and install the SDK\n  realprep show plan  Preview the steps without running them\n  realprep clean      Remove the SDK clone"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision this host (apt packages + SDK build + install)
    Provision {
        /// Skip the full system upgrade step
        #[arg(long)]
        no_upgrade: bool,

        /// Keep the SDK clone after a successful install
        #[arg(long)]
        keep_source: bool,

        /// Skip preflight checks (not recommended)
        #[arg(long)]
        skip_preflight: bool,

        /// Parallel make jobs (default: CPU cores - 1)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Run preflight checks (verify the host before provisioning)
    Preflight {
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Remove the SDK clone and bookkeeping (default: clone only)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Remove the SDK clone directory
    Source,
    /// Remove the last-provision record
    State,
    /// Remove clone and record
    All,
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show the provisioning steps and their fingerprint
    Plan,
    /// Show install status on this host
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let mut config = Config::load();

    match cli.command {
        Commands::Provision {
            no_upgrade,
            keep_source,
            skip_preflight,
            jobs,
        } => {
            if let Some(jobs) = jobs {
                config.build_jobs = Some(jobs.max(1));
            }
            let options = commands::provision::ProvisionOptions {
                no_upgrade,
                keep_source,
                skip_preflight,
            };
            commands::cmd_provision(&config, &options)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&config, strict)?;
        }

        Commands::Clean { what } => {
            let clean_target = match what {
                None | Some(CleanTarget::Source) => commands::clean::CleanTarget::Source,
                Some(CleanTarget::State) => commands::clean::CleanTarget::State,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(&config, clean_target)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Plan => commands::show::ShowTarget::Plan,
                ShowTarget::Status => commands::show::ShowTarget::Status,
            };
            commands::cmd_show(&config, show_target)?;
        }
    }

    Ok(())
}

//! addonup - Main entry point.
//!
//! Checks the registered add-ons for updates and prints the aggregated
//! status summary. Progress and failures are logged to stderr.

use std::path::PathBuf;

use clap::Parser;

use addonup::{Updater, discovery, logging};

/// Keeps World of Warcraft add-ons up to date.
#[derive(Debug, Parser)]
#[command(name = "addonup", version)]
struct Cli {
    /// World of Warcraft installation directory.
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: PathBuf,

    /// Force a re-install even when an add-on is already up to date.
    #[arg(short, long)]
    force: bool,

    /// Install registered add-ons that are not yet installed.
    #[arg(short, long)]
    install: bool,

    /// Log level (trace, debug, info, warn, error, off).
    #[arg(long, value_name = "LEVEL", default_value = logging::DEFAULT_LOG_LEVEL)]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logging::init(&logging::parse_level(&cli.log_level));

    let addon_root = cli.dir.join("Interface").join("AddOns");
    let mut updater = Updater::new(addon_root)?;
    updater.set_force_update(cli.force);
    updater.set_install_missing(cli.install);

    updater.register(discovery::elvui()?);
    updater.register(discovery::addon_skins()?);

    let status = updater.run();
    if status.is_empty() {
        println!("No add-on reported a status; see the log for details.");
    } else {
        println!("Update status:");
        println!("{}", status);
    }

    Ok(())
}

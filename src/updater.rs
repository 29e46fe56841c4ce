//! Update orchestration across registered add-ons.
//!
//! The orchestrator owns the registered add-on set and runs one pipeline
//! per add-on on its own thread. Status lines travel over a bounded
//! channel and are drained only after every pipeline has finished; a
//! failure inside one pipeline never reaches another.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender};
use std::thread;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::addon::{AddOn, AddonError};
use crate::{archive, discovery};

/// Aggregated result of one update run: one human-readable line per
/// add-on pipeline that produced a reportable outcome.
///
/// Lines arrive in completion order, which is not deterministic; callers
/// that care should sort before comparing.
#[derive(Debug, Clone, Default)]
pub struct RunStatus {
    lines: Vec<String>,
}

impl RunStatus {
    /// Returns the collected status lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the number of status lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true when no pipeline produced a status line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

impl FromIterator<String> for RunStatus {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

/// Per-run configuration shared read-only by every pipeline.
struct RunContext<'a> {
    install_root: &'a Path,
    client: &'a Client,
    force_update: bool,
    install_missing: bool,
}

/// Orchestrates update checks across its registered add-ons.
pub struct Updater {
    addon_root: PathBuf,
    force_update: bool,
    install_missing: bool,
    addons: Vec<AddOn>,
    client: Client,
}

impl Updater {
    /// Creates an updater rooted at the add-on install directory.
    ///
    /// Fails when the directory does not exist or is not a directory, so
    /// a mistyped path is caught before any pipeline runs.
    pub fn new(addon_root: impl Into<PathBuf>) -> Result<Self, AddonError> {
        let addon_root = addon_root.into();
        let metadata = fs::metadata(&addon_root)?;
        if !metadata.is_dir() {
            return Err(AddonError::Config(format!(
                "{} is not a directory",
                addon_root.display()
            )));
        }

        Ok(Self {
            addon_root,
            force_update: false,
            install_missing: false,
            addons: Vec::new(),
            client: discovery::http_client()?,
        })
    }

    /// Sets whether up-to-date add-ons are re-installed anyway.
    pub fn set_force_update(&mut self, flag: bool) {
        self.force_update = flag;
    }

    /// Sets whether add-ons that are not installed yet get installed.
    pub fn set_install_missing(&mut self, flag: bool) {
        self.install_missing = flag;
    }

    /// Registers an add-on, fixing its install path under the root.
    pub fn register(&mut self, mut addon: AddOn) {
        addon.bind_install_path(&self.addon_root);
        self.addons.push(addon);
    }

    /// Returns the registered add-ons.
    #[must_use]
    pub fn addons(&self) -> &[AddOn] {
        &self.addons
    }

    /// Returns the add-on install root.
    #[must_use]
    pub fn addon_root(&self) -> &Path {
        &self.addon_root
    }

    /// Checks every registered add-on, installing updates where needed.
    ///
    /// One thread per add-on, all launched before any is awaited; the
    /// call returns only after every pipeline has finished. The status
    /// channel is bounded by the add-on count, so no pipeline ever
    /// blocks on reporting.
    pub fn run(&mut self) -> RunStatus {
        let (tx, rx) = mpsc::sync_channel::<String>(self.addons.len().max(1));
        let ctx = RunContext {
            install_root: &self.addon_root,
            client: &self.client,
            force_update: self.force_update,
            install_missing: self.install_missing,
        };

        thread::scope(|scope| {
            for addon in &mut self.addons {
                let tx = tx.clone();
                let ctx = &ctx;
                scope.spawn(move || run_pipeline(addon, ctx, &tx));
            }
        });

        drop(tx);
        rx.try_iter().collect()
    }
}

/// Runs the update pipeline for a single add-on.
///
/// Every failure is logged with the add-on's name and either ends the
/// pipeline without a status line or degrades it (an unreadable
/// installed version does not stop discovery).
fn run_pipeline(addon: &mut AddOn, ctx: &RunContext<'_>, status: &SyncSender<String>) {
    let installed = match addon.is_installed() {
        Ok(flag) => flag,
        Err(e) => {
            warn!("[{}] {}", addon.name, e);
            return;
        }
    };

    if !installed {
        if !ctx.install_missing {
            info!("[{}] Add-on not installed.", addon.name);
            return;
        }
        info!("[{}] Installing add-on as requested.", addon.name);
    } else if let Err(e) = addon.read_installed_version() {
        // A broken manifest is not fatal: discovery and forced updates
        // still run, with the add-on treated as outdated.
        warn!("[{}] {}", addon.name, e);
    }

    info!("[{}] Checking for latest version.", addon.name);
    let release = match addon.discover_latest(ctx.client) {
        Ok(release) => release,
        Err(e) => {
            warn!("[{}] {}", addon.name, e);
            return;
        }
    };

    let up_to_date = addon.version.is_up_to_date();
    if up_to_date {
        if !ctx.force_update {
            info!(
                "[{}] Up to date (installed {}).",
                addon.name,
                addon.version.current_or_zero()
            );
            send_status(
                status,
                format!(
                    "{} v{} is up to date.",
                    addon.name,
                    addon.version.current_or_zero()
                ),
                &addon.name,
            );
            return;
        }
        info!(
            "[{}] Forcing re-install of installed version {}.",
            addon.name,
            addon.version.current_or_zero()
        );
    } else {
        info!(
            "[{}] Found new version {} (installed {}).",
            addon.name,
            release.version,
            addon.version.current_or_zero()
        );
    }

    info!("[{}] Downloading {}.", addon.name, release.archive_url);
    let archive_path = match archive::fetch_archive(ctx.client, release.archive_url.as_str()) {
        Ok(path) => path,
        Err(e) => {
            warn!("[{}] {}", addon.name, e);
            return;
        }
    };

    info!(
        "[{}] Extracting archive to {}.",
        addon.name,
        ctx.install_root.display()
    );
    let outcome = archive::install_archive(ctx.install_root, &archive_path);

    // The downloaded archive is removed no matter how extraction went.
    if let Err(e) = fs::remove_file(&archive_path) {
        warn!(
            "[{}] Failed to remove {}: {}",
            addon.name,
            archive_path.display(),
            e
        );
    }

    if let Err(e) = outcome {
        warn!("[{}] {}", addon.name, e);
        return;
    }

    let line = if installed {
        if up_to_date {
            format!(
                "{} v{} has been re-installed.",
                addon.name,
                addon.version.current_or_zero()
            )
        } else {
            format!(
                "{} v{} has been updated from v{}.",
                addon.name,
                release.version,
                addon.version.current_or_zero()
            )
        }
    } else {
        format!(
            "{} v{} has been updated/installed.",
            addon.name, release.version
        )
    };
    send_status(status, line, &addon.name);
}

fn send_status(status: &SyncSender<String>, line: String, name: &str) {
    if status.send(line).is_err() {
        warn!("[{}] Status channel closed.", name);
    }
}

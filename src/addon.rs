//! Add-on type definitions.
//!
//! Core data structures shared by every stage of an update run: the
//! add-on descriptor, the current/latest version pair, and the error
//! type used across the crate.

use std::path::{Path, PathBuf};

use semver::Version;
use thiserror::Error;
use url::Url;

use crate::discovery::DiscoveryStrategy;

/// Errors that can occur while checking or installing add-ons.
#[derive(Debug, Error)]
pub enum AddonError {
    /// HTTP transport failure or a non-success status.
    #[error("network error: {0}")]
    Network(String),

    /// An expected page element did not match any node.
    #[error("could not find the page element for the {0}")]
    ElementNotFound(String),

    /// A version string could not be parsed.
    #[error("cannot parse {0:?} as a version")]
    MalformedVersion(String),

    /// The manifest lacks a required key.
    #[error("manifest has no {0} entry")]
    MissingField(String),

    /// Filesystem create/write/stat failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded file is not a readable archive.
    #[error("invalid archive: {0}")]
    Archive(String),

    /// Invalid registration or strategy configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The installed and latest known versions of an add-on.
///
/// Both sides are `None` until the corresponding pipeline step has run:
/// `current` after the manifest read, `latest` after discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPair {
    /// Version read from the installed manifest, if any.
    pub current: Option<Version>,
    /// Version resolved by the discovery strategy, if any.
    pub latest: Option<Version>,
}

impl VersionPair {
    /// Returns true iff a current version exists and equals the latest.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        matches!((&self.current, &self.latest), (Some(current), Some(latest)) if current == latest)
    }

    /// Returns the current version, or 0.0.0 when none was read.
    #[must_use]
    pub fn current_or_zero(&self) -> Version {
        self.current.clone().unwrap_or_else(|| Version::new(0, 0, 0))
    }
}

/// One updatable add-on under management.
pub struct AddOn {
    /// Stable identifying name; also the install directory name.
    pub name: String,
    /// Landing page the discovery strategy scrapes.
    pub page_url: String,
    /// Install directory, fixed when the add-on is registered.
    path: PathBuf,
    /// Archive URL resolved by the last successful discovery.
    pub archive_url: Option<Url>,
    /// Installed/latest version pair.
    pub version: VersionPair,
    /// Discovery capability bound at construction.
    pub(crate) strategy: Box<dyn DiscoveryStrategy>,
}

impl AddOn {
    /// Creates a new add-on descriptor with its discovery strategy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        page_url: impl Into<String>,
        strategy: Box<dyn DiscoveryStrategy>,
    ) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Add-on name must not be empty");

        Self {
            name,
            page_url: page_url.into(),
            path: PathBuf::new(),
            archive_url: None,
            version: VersionPair::default(),
            strategy,
        }
    }

    /// Returns the install directory, empty until registration.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fixes the install directory as root/name. Called once at
    /// registration; never mutated afterwards.
    pub(crate) fn bind_install_path(&mut self, install_root: &Path) {
        self.path = install_root.join(&self.name);
    }
}

impl std::fmt::Debug for AddOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddOn")
            .field("name", &self.name)
            .field("page_url", &self.page_url)
            .field("path", &self.path)
            .field("archive_url", &self.archive_url)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

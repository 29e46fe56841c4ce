//! Installed-state inspection via the add-on's TOC manifest.
//!
//! The TOC file is the line-oriented metadata file the game reads for an
//! installed add-on: metadata lines carry a `## Key: Value` shape, every
//! other line (comments, file lists, blanks) is ignored. The only key the
//! updater needs is `Version`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::addon::{AddOn, AddonError};
use crate::version;

/// Prefix that marks a metadata line.
const METADATA_PREFIX: &str = "## ";

/// Manifest key holding the installed version.
pub const VERSION_KEY: &str = "Version";

impl AddOn {
    /// Returns the path of this add-on's manifest, `<path>/<name>.toc`.
    #[must_use]
    pub fn toc_path(&self) -> PathBuf {
        self.path().join(format!("{}.toc", self.name))
    }

    /// Determines whether the add-on is installed.
    ///
    /// Installed means the manifest exists and is a regular file. A
    /// missing file is not an error; any other stat failure is.
    pub fn is_installed(&self) -> Result<bool, AddonError> {
        if self.path().as_os_str().is_empty() {
            return Err(AddonError::Config(format!(
                "no install path set for {}",
                self.name
            )));
        }

        match fs::metadata(self.toc_path()) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AddonError::Io(e)),
        }
    }

    /// Reads the installed version out of the manifest into
    /// `version.current`.
    pub fn read_installed_version(&mut self) -> Result<(), AddonError> {
        let entries = read_toc(&self.toc_path())?;
        let raw = entries
            .get(VERSION_KEY)
            .ok_or_else(|| AddonError::MissingField(VERSION_KEY.to_string()))?;

        self.version.current = Some(version::normalize(raw)?);
        Ok(())
    }
}

/// Parses a TOC manifest into its key/value entries.
///
/// A line is metadata iff it starts with the literal `"## "` prefix; the
/// remainder splits at the first colon, and only the value is trimmed.
/// Later duplicates overwrite earlier ones. Metadata lines without a
/// colon are ignored.
pub fn read_toc(path: &Path) -> Result<HashMap<String, String>, AddonError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut entries = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let Some(rest) = line.strip_prefix(METADATA_PREFIX) else {
            continue;
        };
        let Some((key, value)) = rest.split_once(':') else {
            continue;
        };
        entries.insert(key.to_string(), value.trim().to_string());
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoveryStrategy, FilenameVersionStrategy};
    use pretty_assertions::assert_eq;
    use semver::Version;

    fn stub_strategy() -> Box<dyn DiscoveryStrategy> {
        Box::new(FilenameVersionStrategy::new("a", r"-(\d+\.\d+)\.zip").unwrap())
    }

    fn registered_addon(root: &Path, name: &str) -> AddOn {
        let mut addon = AddOn::new(name, "https://example.test/page", stub_strategy());
        addon.bind_install_path(root);
        addon
    }

    fn write_toc(root: &Path, name: &str, contents: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.toc", name)), contents).unwrap();
    }

    #[test]
    fn test_read_toc_ignores_non_metadata_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(
            dir.path(),
            "Test",
            "## Interface: 110002\n\
             ## Title: Test\n\
             ##Version: not-metadata\n\
             # a comment\n\
             Test.lua\n\
             ## Version: 3.4.0\n",
        );

        let entries = read_toc(&dir.path().join("Test/Test.toc")).unwrap();
        assert_eq!(entries.get("Interface").unwrap(), "110002");
        assert_eq!(entries.get("Version").unwrap(), "3.4.0");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_read_toc_last_duplicate_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(dir.path(), "Test", "## Version: 1.0\n## Version: 2.0\n");

        let entries = read_toc(&dir.path().join("Test/Test.toc")).unwrap();
        assert_eq!(entries.get("Version").unwrap(), "2.0");
    }

    #[test]
    fn test_version_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(dir.path(), "Test", "## Version: 3.4.0\n");

        let mut addon = registered_addon(dir.path(), "Test");
        addon.read_installed_version().unwrap();
        assert_eq!(
            addon.version.current,
            Some(crate::version::normalize("3.4.0").unwrap())
        );
    }

    #[test]
    fn test_missing_version_key() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(dir.path(), "Test", "## Title: Test\n");

        let mut addon = registered_addon(dir.path(), "Test");
        let result = addon.read_installed_version();
        assert!(matches!(result, Err(AddonError::MissingField(key)) if key == "Version"));
    }

    #[test]
    fn test_unparsable_version_value() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(dir.path(), "Test", "## Version: latest-and-greatest\n");

        let mut addon = registered_addon(dir.path(), "Test");
        assert!(matches!(
            addon.read_installed_version(),
            Err(AddonError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_is_installed_states() {
        let dir = tempfile::tempdir().unwrap();

        let addon = registered_addon(dir.path(), "Absent");
        assert!(!addon.is_installed().unwrap());

        write_toc(dir.path(), "Present", "## Version: 1.0\n");
        let addon = registered_addon(dir.path(), "Present");
        assert!(addon.is_installed().unwrap());

        // A directory where the manifest should be does not count.
        fs::create_dir_all(dir.path().join("Odd/Odd.toc")).unwrap();
        let addon = registered_addon(dir.path(), "Odd");
        assert!(!addon.is_installed().unwrap());
    }

    #[test]
    fn test_is_installed_requires_registration() {
        let addon = AddOn::new("Loose", "https://example.test/page", stub_strategy());
        assert!(matches!(addon.is_installed(), Err(AddonError::Config(_))));
    }

    #[test]
    fn test_installed_version_compares() {
        let dir = tempfile::tempdir().unwrap();
        write_toc(dir.path(), "Test", "## Version: 10.0\n");

        let mut addon = registered_addon(dir.path(), "Test");
        addon.read_installed_version().unwrap();
        assert_eq!(addon.version.current, Some(Version::new(10, 0, 0)));
    }
}

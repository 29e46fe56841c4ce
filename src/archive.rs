//! Archive download and extraction.
//!
//! Downloads a release archive to a temporary file and unpacks it into
//! the add-on install root. Entry names are trusted as relative paths;
//! archives come from the sources configured at registration.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::addon::AddonError;

/// Downloads an archive to a fresh temporary file.
///
/// The file is persisted and its path returned; the caller owns removal.
pub fn fetch_archive(client: &Client, url: &str) -> Result<PathBuf, AddonError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AddonError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AddonError::Network(format!(
            "{} returned status {}",
            url, status
        )));
    }

    let mut tmp = tempfile::Builder::new().prefix("addon").tempfile()?;

    let mut body = response;
    io::copy(&mut body, tmp.as_file_mut()).map_err(|e| AddonError::Network(e.to_string()))?;

    let (_, path) = tmp.keep().map_err(|e| AddonError::Io(e.error))?;
    Ok(path)
}

/// Extracts a zip archive into the install root.
///
/// Entries are processed in container order: directories are created
/// recursively, files are created or truncated and their recorded Unix
/// permission bits applied. Each output handle is released before the
/// next entry. The first create/write failure aborts the remaining
/// entries; a partial extraction is not rolled back.
pub fn install_archive(install_root: &Path, archive_path: &Path) -> Result<(), AddonError> {
    let file = File::open(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| AddonError::Archive(e.to_string()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| AddonError::Archive(e.to_string()))?;

        let destination = install_root.join(entry.name());

        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut output = File::create(&destination)?;
        io::copy(&mut entry, &mut output)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&destination, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}

//! Status directory access
//!
//! [`StatusDir`] is opened once at startup and shared read-only with every
//! scrape. Listing and reading always go through that open handle, never
//! through the configured path, so a work directory that is deleted and
//! recreated after startup is not picked up: scrapes come back empty until
//! the exporter restarts. The confinement policy (see [`crate::sandbox`])
//! is anchored on the same handle.

use crate::error::{ExporterError, Result};
use rustix::fs::{openat, statat, AtFlags, Dir, FileType, Mode, OFlags};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name suffix the daemon uses for per-filesystem status files.
pub const STATUS_SUFFIX: &str = ".status";

/// The bees work directory, captured as an open handle
#[derive(Debug)]
pub struct StatusDir {
    path: PathBuf,
    handle: File,
}

/// A status file found during enumeration, resolved relative to its
/// [`StatusDir`]
#[derive(Debug, Clone)]
pub struct StatusFile<'a> {
    dir: &'a StatusDir,
    pub filesystem_id: String,
    pub file_name: String,
}

impl StatusDir {
    /// Opens the work directory and keeps the handle for the process lifetime.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let handle = File::open(&path).map_err(|source| ExporterError::WorkDir {
            path: path.clone(),
            source,
        })?;

        let metadata = handle.metadata().map_err(|source| ExporterError::WorkDir {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ExporterError::WorkDir {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        Ok(Self { path, handle })
    }

    /// Path the directory was opened from, for messages only
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle captured at startup
    pub fn handle(&self) -> &File {
        &self.handle
    }

    /// Lists the status files currently present, sorted by filesystem id.
    ///
    /// The directory behind the handle is re-read on every call. Entries that
    /// do not follow the `<uuid>.status` convention are skipped.
    pub fn status_files(&self) -> io::Result<Vec<StatusFile<'_>>> {
        let mut files = Vec::new();

        for entry in Dir::read_from(&self.handle)? {
            let entry = entry?;
            let file_name = entry.file_name();

            let Some(filesystem_id) = file_name.to_str().ok().and_then(filesystem_id_from_name)
            else {
                debug!("Ignoring directory entry {:?}", file_name);
                continue;
            };

            // Some filesystems leave d_type unset
            let file_type = match entry.file_type() {
                FileType::Unknown => statat(&self.handle, file_name, AtFlags::SYMLINK_NOFOLLOW)
                    .map(|stat| FileType::from_raw_mode(stat.st_mode)),
                known => Ok(known),
            };

            // A file removed mid-listing is simply not part of this scrape
            match file_type {
                Ok(FileType::RegularFile) => {}
                Ok(_) => {
                    debug!("Ignoring non-regular entry {:?}", file_name);
                    continue;
                }
                Err(e) => {
                    debug!("Skipping {:?}: {}", file_name, e);
                    continue;
                }
            }

            files.push(StatusFile {
                dir: self,
                filesystem_id: filesystem_id.to_string(),
                file_name: filesystem_id.to_string() + STATUS_SUFFIX,
            });
        }

        files.sort_by(|a, b| a.filesystem_id.cmp(&b.filesystem_id));
        Ok(files)
    }
}

impl StatusFile<'_> {
    /// Location for log and error messages; reads never go through it.
    pub fn path(&self) -> PathBuf {
        self.dir.path.join(&self.file_name)
    }

    /// Reads the whole file through the directory handle.
    ///
    /// A file that vanished after enumeration surfaces as
    /// [`ExporterError::FileUnreadable`].
    pub fn read(&self) -> Result<Vec<u8>> {
        self.read_at()
            .map_err(|source| ExporterError::FileUnreadable {
                path: self.path(),
                source,
            })
    }

    fn read_at(&self) -> io::Result<Vec<u8>> {
        let fd = openat(
            &self.dir.handle,
            self.file_name.as_str(),
            OFlags::RDONLY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
            Mode::empty(),
        )?;

        let mut bytes = Vec::new();
        File::from(fd).read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Filesystem id encoded in a status file name, `None` for anything else.
pub fn filesystem_id_from_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(STATUS_SUFFIX)
        .filter(|id| !id.is_empty() && !id.starts_with('.'))
}

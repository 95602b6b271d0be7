//! Streaming zip creation and archive member extraction.
//!
//! Both operations stream entry by entry and never buffer a whole archive or
//! member in memory. They are blocking and expected to run on a blocking
//! thread when called from async context.

use crate::error::{StorageError, StorageResult};
use crate::paths;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::PathBuf;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;
use zip::write::{FileOptions, ZipWriter};

/// Streams zip creation from a subtree and member extraction out of an
/// existing archive.
pub struct ArchiveStreamer {
    root: PathBuf,
}

impl ArchiveStreamer {
    /// Create a streamer over the served root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a zip archive of `subtree` (a request path relative to the
    /// root) to `sink`. Entry names mirror the subtree-relative paths.
    ///
    /// Entries are written as the walk visits them. An unreadable file
    /// mid-walk aborts the archive with an error; bytes already written to
    /// the sink stay written, which is a documented limitation of streaming
    /// creation. A missing or non-directory subtree is a hard error.
    pub fn create_zip<W: Write + Seek>(&self, subtree: &str, sink: W) -> StorageResult<()> {
        let normalized = paths::normalize(subtree)?;
        let base = paths::to_fs_path(&self.root, &normalized);
        if !base.is_dir() {
            return Err(StorageError::NotFound(format!(
                "not a directory: /{normalized}"
            )));
        }

        let mut writer = ZipWriter::new(sink);
        let options =
            FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

        for item in WalkDir::new(&base) {
            let entry = item.map_err(|err| StorageError::Io(io::Error::other(err)))?;
            let rel = match entry.path().strip_prefix(&base) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            let name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                writer.add_directory(name, options)?;
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            writer.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut writer)?;
        }

        writer.finish()?;
        Ok(())
    }

    /// Stream the decompressed bytes of one archive member to `sink`,
    /// returning the number of bytes written.
    ///
    /// The member is located by exact path match within the archive's
    /// namespace. A missing member is NotFound; corrupt archive data is an
    /// archive error.
    pub fn extract_member<W: Write>(
        &self,
        archive_path: &str,
        member: &str,
        mut sink: W,
    ) -> StorageResult<u64> {
        let mut archive = self.open_archive(archive_path)?;
        let mut file = match archive.by_name(member) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(StorageError::NotFound(format!(
                    "archive member not found: {member}"
                )));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(io::copy(&mut file, &mut sink)?)
    }

    /// Decompressed size of one archive member, without reading its bytes.
    ///
    /// Lets callers fail with NotFound (and learn the content length) before
    /// committing to a streamed response.
    pub fn member_size(&self, archive_path: &str, member: &str) -> StorageResult<u64> {
        let mut archive = self.open_archive(archive_path)?;
        match archive.by_name(member) {
            Ok(file) => Ok(file.size()),
            Err(ZipError::FileNotFound) => Err(StorageError::NotFound(format!(
                "archive member not found: {member}"
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn open_archive(&self, archive_path: &str) -> StorageResult<ZipArchive<File>> {
        let normalized = paths::normalize(archive_path)?;
        let fs_path = paths::to_fs_path(&self.root, &normalized);
        let file = File::open(&fs_path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(format!("archive not found: /{normalized}"))
            } else {
                StorageError::Io(err)
            }
        })?;
        Ok(ZipArchive::new(file)?)
    }
}

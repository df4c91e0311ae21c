//! Directory-based storage backend for persistent storage.
//!
//! Layout:
//!
//! ```text
//! <storage_path>/
//! ├─ seg1.seg          # one CBOR record per segment
//! ├─ promo%2Fspring.seg
//! └─ ...
//! ```
//!
//! File names are derived from segment IDs: ASCII letters, digits, `-` and
//! `_` are kept, every other byte is written as `%XX`. Writes go to a
//! `.tmp` sibling first and are renamed into place.

use crate::backend::SegmentBackend;
use crate::error::{StorageError, StorageResult};
use segdb_codec::{decode_record, encode_record, SegmentRecord};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const RECORD_EXT: &str = "seg";
const TEMP_EXT: &str = "tmp";

/// A directory-based storage backend.
///
/// Each segment lives in its own file, so saving or deleting one segment
/// never rewrites the others. The directory is created lazily on the first
/// save; a missing directory loads as an empty store.
///
/// # Example
///
/// ```no_run
/// use segdb_codec::SegmentRecord;
/// use segdb_storage::{DirBackend, SegmentBackend};
/// use std::path::Path;
///
/// let mut backend = DirBackend::new(Path::new("var/lib/segdb"));
/// backend.save(&SegmentRecord::new("seg1", "level >= 1")).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirBackend {
    path: PathBuf,
}

impl DirBackend {
    /// Creates a backend rooted at `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Creates a backend and makes sure its directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(path)?;
        Ok(Self::new(path))
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file that holds (or would hold) the given segment.
    #[must_use]
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{}.{}", escape_id(id), RECORD_EXT))
    }

    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> io::Result<()> {
        let temp = target.with_extension(format!("{RECORD_EXT}.{TEMP_EXT}"));
        {
            let mut file = File::create(&temp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp, target)
    }

    fn read_record(path: &Path) -> StorageResult<SegmentRecord> {
        let bytes = fs::read(path)?;
        let record = decode_record(&bytes).map_err(|e| StorageError::Corrupted {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let expected = format!("{}.{}", escape_id(&record.id), RECORD_EXT);
        if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
            return Err(StorageError::Corrupted {
                path: path.to_path_buf(),
                message: format!("file holds segment {:?}", record.id),
            });
        }

        Ok(record)
    }
}

impl SegmentBackend for DirBackend {
    fn save(&mut self, record: &SegmentRecord) -> StorageResult<()> {
        let bytes = encode_record(record)?;
        fs::create_dir_all(&self.path)?;
        self.write_atomic(&self.record_path(&record.id), &bytes)?;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::Missing(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> StorageResult<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared segment directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self) -> StorageResult<BTreeMap<String, SegmentRecord>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let record = Self::read_record(&path)?;
            records.insert(record.id.clone(), record);
        }

        debug!(path = %self.path.display(), count = records.len(), "loaded segment records");
        Ok(records)
    }
}

fn escape_id(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

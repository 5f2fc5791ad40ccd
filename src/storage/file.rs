use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::Mutex;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use tracing::debug;
use tracing::info;

use super::DurableStorage;
use crate::constants::FILE_STORAGE_EXTENSION;
use crate::StorageError;

const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// File-based storage: one file per entry name under `data_dir`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated payload behind.
#[derive(Debug)]
pub struct FileStorage {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::PathError {
            path: data_dir.clone(),
            source,
        })?;
        info!("file storage opened at {:?}", data_dir);

        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File for `name`. Names are percent-encoded, so distinct names never
    /// share a file and none can escape `data_dir`.
    pub(crate) fn entry_path(
        &self,
        name: &str,
    ) -> PathBuf {
        let file_name = utf8_percent_encode(name, FILE_NAME);
        self.data_dir
            .join(format!("{file_name}.{FILE_STORAGE_EXTENSION}"))
    }
}

impl DurableStorage for FileStorage {
    fn get(
        &self,
        name: &str,
    ) -> Result<Option<String>, StorageError> {
        let path = self.entry_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::PathError { path, source }),
        }
    }

    fn set(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.entry_path(name);
        let tmp_path = path.with_extension("tmp");

        fs::write(&tmp_path, value).map_err(|source| StorageError::PathError {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StorageError::PathError {
            path: path.clone(),
            source,
        })?;

        debug!("file storage wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove(
        &self,
        name: &str,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::PathError { path, source }),
        }
    }
}

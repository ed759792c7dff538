//! File storage adapter (SD card over the ESP-IDF VFS, plain files on
//! the host).
//!
//! One instance per output stream (cycle log, result report). The
//! control core opens the file and requests the close; the writer task
//! drains the associated line channel into it via [`FileStorage::service`]
//! and performs the close once the channel has emptied, so no report
//! line is ever cut off by an early close.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::buffer::LineChannel;
use crate::error::StorageError;

pub struct FileStorage {
    /// Mount point prefix ("/sdcard" on target, a temp dir in tests).
    root: PathBuf,
    file: Option<File>,
    close_requested: bool,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file: None,
            close_requested: false,
        }
    }

    /// Drain pending lines into the open file; honour a deferred close
    /// once the channel is empty. Runs in the writer task.
    pub fn service(&mut self, chan: &LineChannel) {
        while let Some(line) = chan.take_filled() {
            if let Err(e) = self.write(line.as_bytes()) {
                warn!("storage: dropped line ({e})");
            }
            // A rejected release is a pairing bug, counted by the buffer.
            let _ = chan.release_empty(line);
        }
        if self.close_requested && chan.filled_len() == 0 {
            if let Some(file) = self.file.take() {
                if let Err(e) = file.sync_all() {
                    warn!("storage: sync on close failed ({e})");
                }
                info!("storage: file closed");
            }
            self.close_requested = false;
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl StoragePort for FileStorage {
    fn open(&mut self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|_| StorageError::OpenFailed)?;
        }
        match File::create(&full) {
            Ok(file) => {
                self.file = Some(file);
                self.close_requested = false;
                info!("storage: opened {}", full.display());
                Ok(())
            }
            Err(e) => {
                warn!("storage: open {} failed ({e})", full.display());
                Err(StorageError::OpenFailed)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes).map_err(|_| StorageError::WriteFailed),
            None => Err(StorageError::NotOpen),
        }
    }

    fn request_close(&mut self) {
        if self.file.is_some() {
            self.close_requested = true;
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Cheap cross-task handle: locks per call so a control core never
/// holds the storage lock across its drain loop while the writer task
/// needs it.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<FileStorage>>,
}

impl SharedStorage {
    pub fn new(storage: FileStorage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut FileStorage) -> R) -> R {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Writer-task entry point.
    pub fn service(&self, chan: &LineChannel) {
        self.with(|s| s.service(chan));
    }
}

impl StoragePort for SharedStorage {
    fn open(&mut self, path: &str) -> Result<(), StorageError> {
        self.with(|s| s.open(path))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.with(|s| s.write(bytes))
    }

    fn request_close(&mut self) {
        self.with(FileStorage::request_close);
    }

    fn is_open(&self) -> bool {
        self.with(|s| s.is_open())
    }
}

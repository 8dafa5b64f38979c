//! File upload contract, an in-memory service, and batch uploads.
//!
//! Photos, logos and exported signature PNGs all go through the same
//! `upload(file) -> file_url` call.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LaudoError, Result};

/// A file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// A signature rasterized to PNG.
    pub fn signature_png(name: impl Into<String>, png: Vec<u8>) -> Self {
        Self::new(name, "image/png", png)
    }

    fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LaudoError::Upload("file name is empty".to_string()));
        }
        if self.bytes.is_empty() {
            return Err(LaudoError::Upload(format!("{} has no content", self.name)));
        }
        Ok(())
    }
}

/// Where an uploaded file can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
}

pub trait UploadService: Sync {
    fn upload(&self, file: &UploadFile) -> Result<UploadedFile>;
}

#[derive(Debug, Default)]
struct Stored {
    next: u64,
    files: Vec<(String, UploadFile)>,
}

/// Keeps uploads in memory and hands out `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryUploadService {
    stored: Mutex<Stored>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload of a file with this name fail.
    pub fn fail_on(&self, name: impl Into<String>) {
        recover(&self.failing).insert(name.into());
    }

    /// The stored file behind a URL, if any.
    pub fn fetch(&self, file_url: &str) -> Option<UploadFile> {
        recover(&self.stored)
            .files
            .iter()
            .find(|(url, _)| url == file_url)
            .map(|(_, file)| file.clone())
    }

    pub fn len(&self) -> usize {
        recover(&self.stored).files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A panic while holding the lock leaves the data intact; keep going.
fn recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl UploadService for MemoryUploadService {
    fn upload(&self, file: &UploadFile) -> Result<UploadedFile> {
        file.check()?;

        let rejected = recover(&self.failing).contains(&file.name);
        if rejected {
            return Err(LaudoError::Upload(format!("{} was rejected by the server", file.name)));
        }

        let mut stored = recover(&self.stored);
        stored.next += 1;
        let file_url = format!("memory://uploads/{}/{}", stored.next, file.name);
        stored.files.push((file_url.clone(), file.clone()));
        Ok(UploadedFile { file_url })
    }
}

/// Upload every file on the rayon pool and wait for all of them. If any
/// single upload fails the whole batch fails; successful uploads of a
/// failed batch are not reported. Results keep input order.
pub fn upload_batch(service: &dyn UploadService, files: &[UploadFile]) -> Result<Vec<UploadedFile>> {
    let uploaded = files
        .par_iter()
        .map(|file| service.upload(file))
        .collect::<Result<Vec<_>>>();
    match &uploaded {
        Ok(done) => log::info!("Uploaded batch of {} file(s)", done.len()),
        Err(e) => log::warn!("Batch upload of {} file(s) failed: {}", files.len(), e),
    }
    uploaded
}

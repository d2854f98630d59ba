//! In-process object store for tests and the CLI.

use super::{ensure_valid_key, format_signed_url, new_storage_key, MediaResult, ObjectStore};
use crate::media::MediaError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Stored blob with its declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Keeps blobs in a process-local map.
pub struct MemoryObjectStore {
    base_url: String,
    secret: Vec<u8>,
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_puts: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
            objects: Mutex::new(HashMap::new()),
            fail_puts: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `put` fail, to exercise storage error paths.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.lock_objects().ok()?.get(key).cloned()
    }

    /// Number of stored blobs; fails if a writer panicked while holding the map.
    pub fn len(&self) -> MediaResult<usize> {
        Ok(self.lock_objects()?.len())
    }

    pub fn is_empty(&self) -> MediaResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock_objects(
        &self,
    ) -> MediaResult<std::sync::MutexGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| MediaError::Io(std::io::Error::other("object map lock poisoned")))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, bytes: &[u8], mime_type: &str, original_name: &str) -> MediaResult<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(MediaError::Io(std::io::Error::other(
                "memory object store configured to fail",
            )));
        }
        let key = new_storage_key(original_name);
        self.lock_objects()?.insert(
            key.clone(),
            StoredObject {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        Ok(key)
    }

    fn signed_url(&self, key: &str, ttl_secs: u64, now_ms: i64) -> MediaResult<String> {
        ensure_valid_key(key)?;
        if !self.lock_objects()?.contains_key(key) {
            return Err(MediaError::UnknownKey(key.to_string()));
        }
        format_signed_url(&self.base_url, &self.secret, key, ttl_secs, now_ms)
    }
}

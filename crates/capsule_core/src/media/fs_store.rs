//! Filesystem-backed object store.
//!
//! Blobs live flat under `root_dir/<key>`; the MIME type is kept in a
//! `<key>.mime` sidecar so a serving layer can set `Content-Type`.

use super::{ensure_valid_key, format_signed_url, new_storage_key, MediaResult, ObjectStore};
use crate::config::MediaConfig;
use crate::media::MediaError;
use log::{error, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MIME_SIDECAR_SUFFIX: &str = "mime";

pub struct FsObjectStore {
    root_dir: PathBuf,
    base_url: String,
    secret: Vec<u8>,
}

impl FsObjectStore {
    /// Creates the store, creating `root_dir` when missing.
    pub fn open(root_dir: impl AsRef<Path>, base_url: &str, secret: &[u8]) -> MediaResult<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir)?;
        Ok(Self {
            root_dir,
            base_url: base_url.to_string(),
            secret: secret.to_vec(),
        })
    }

    pub fn from_config(config: &MediaConfig) -> MediaResult<Self> {
        Self::open(
            &config.root_dir,
            &config.public_base_url,
            config.signing_secret.as_bytes(),
        )
    }

    /// Absolute path of the blob for `key`.
    pub fn blob_path(&self, key: &str) -> MediaResult<PathBuf> {
        ensure_valid_key(key)?;
        Ok(self.root_dir.join(key))
    }

    fn write_blob(&self, key: &str, bytes: &[u8], mime_type: &str) -> MediaResult<()> {
        let path = self.blob_path(key)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::write(
            self.root_dir.join(format!("{key}.{MIME_SIDECAR_SUFFIX}")),
            mime_type,
        )?;
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bytes: &[u8], mime_type: &str, original_name: &str) -> MediaResult<String> {
        let key = new_storage_key(original_name);
        match self.write_blob(&key, bytes, mime_type) {
            Ok(()) => {
                info!(
                    "event=media_put module=media status=ok key={key} size_bytes={}",
                    bytes.len()
                );
                Ok(key)
            }
            Err(err) => {
                error!(
                    "event=media_put module=media status=error key={key} error_code=media_write_failed error={err}"
                );
                Err(err)
            }
        }
    }

    fn signed_url(&self, key: &str, ttl_secs: u64, now_ms: i64) -> MediaResult<String> {
        if !self.blob_path(key)?.is_file() {
            return Err(MediaError::UnknownKey(key.to_string()));
        }
        format_signed_url(&self.base_url, &self.secret, key, ttl_secs, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::FsObjectStore;
    use crate::media::{verify_signed_url, MediaError, ObjectStore};

    #[test]
    fn put_writes_blob_and_mime_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path(), "https://m.test", b"s").unwrap();

        let key = store.put(b"png-bytes", "image/png", "cat.png").unwrap();
        let path = store.blob_path(&key).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        let mime = std::fs::read_to_string(dir.path().join(format!("{key}.mime"))).unwrap();
        assert_eq!(mime, "image/png");

        let url = store.signed_url(&key, 1800, 0).unwrap();
        assert_eq!(verify_signed_url(&url, b"s", 1).as_deref(), Some(key.as_str()));
    }

    #[test]
    fn signed_url_for_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path(), "https://m.test", b"s").unwrap();
        let err = store
            .signed_url("00000000-0000-0000-0000-000000000000.png", 60, 0)
            .unwrap_err();
        assert!(matches!(err, MediaError::UnknownKey(_)));
    }
}

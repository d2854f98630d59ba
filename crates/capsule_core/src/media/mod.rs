//! Object storage capability for binary contributions.
//!
//! # Responsibility
//! - Accept uploaded bytes and hand back an opaque storage key.
//! - Produce time-limited read URLs for stored keys.
//!
//! # Invariants
//! - Core records only ever hold keys, never raw bytes.
//! - Keys are `<uuid v4>[.<ext>]`, where `ext` comes from the original name.
//! - A `put` that succeeds is never rolled back by core; a later persistence
//!   failure leaves the blob orphaned (logged, not compensated).

mod fs_store;
mod memory_store;

pub use fs_store::FsObjectStore;
pub use memory_store::{MemoryObjectStore, StoredObject};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

pub type MediaResult<T> = Result<T, MediaError>;

/// Object store failures.
#[derive(Debug)]
pub enum MediaError {
    /// Underlying I/O failure while reading/writing a blob.
    Io(std::io::Error),
    /// Requested key is unknown to the store.
    UnknownKey(String),
    /// Key contains characters outside the generated key alphabet.
    InvalidKey(String),
    /// Signing secret unusable for HMAC.
    Signing(String),
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "object store i/o failure: {err}"),
            Self::UnknownKey(key) => write!(f, "unknown storage key `{key}`"),
            Self::InvalidKey(key) => write!(f, "invalid storage key `{key}`"),
            Self::Signing(message) => write!(f, "url signing failure: {message}"),
        }
    }
}

impl Error for MediaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Blob storage collaborator.
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` and returns a fresh opaque key.
    fn put(&self, bytes: &[u8], mime_type: &str, original_name: &str) -> MediaResult<String>;

    /// Returns a URL granting read access to `key` until `now_ms + ttl_secs`.
    fn signed_url(&self, key: &str, ttl_secs: u64, now_ms: i64) -> MediaResult<String>;
}

/// Builds a fresh storage key keeping the original file extension.
pub fn new_storage_key(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match file_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

fn file_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name.trim()).extension()?.to_str()?;
    let valid = !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// Rejects keys that could escape a storage root or break a URL path.
pub(crate) fn ensure_valid_key(key: &str) -> MediaResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(MediaError::InvalidKey(key.to_string()))
    }
}

type HmacSha256 = Hmac<Sha256>;

fn signing_mac(secret: &[u8], key: &str, expires_ms: i64) -> MediaResult<HmacSha256> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|err| MediaError::Signing(err.to_string()))?;
    mac.update(key.as_bytes());
    mac.update(b"|");
    mac.update(expires_ms.to_string().as_bytes());
    Ok(mac)
}

/// Hex HMAC-SHA256 over `key` and the expiry instant.
pub fn url_signature(secret: &[u8], key: &str, expires_ms: i64) -> MediaResult<String> {
    let mac = signing_mac(secret, key, expires_ms)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Formats `<base>/<key>?expires=<ms>&signature=<hex>`.
pub(crate) fn format_signed_url(
    base_url: &str,
    secret: &[u8],
    key: &str,
    ttl_secs: u64,
    now_ms: i64,
) -> MediaResult<String> {
    let ttl_ms = i64::try_from(ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    let expires_ms = now_ms.saturating_add(ttl_ms);
    let signature = url_signature(secret, key, expires_ms)?;
    Ok(format!(
        "{}/{key}?expires={expires_ms}&signature={signature}",
        base_url.trim_end_matches('/')
    ))
}

/// Checks a URL produced by [`format_signed_url`] against `secret` and `now_ms`.
///
/// Returns the key when the signature matches and the URL has not expired.
/// The signature is compared in constant time.
pub fn verify_signed_url(url: &str, secret: &[u8], now_ms: i64) -> Option<String> {
    let (path, query) = url.split_once('?')?;
    let key = path.rsplit('/').next()?;
    let mut expires_ms: Option<i64> = None;
    let mut signature: Option<&str> = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", value)) => expires_ms = value.parse().ok(),
            Some(("signature", value)) => signature = Some(value),
            _ => {}
        }
    }
    let expires_ms = expires_ms?;
    if now_ms >= expires_ms {
        return None;
    }
    let signature = hex::decode(signature?).ok()?;
    let mac = signing_mac(secret, key, expires_ms).ok()?;
    mac.verify_slice(&signature).ok()?;
    Some(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ensure_valid_key, format_signed_url, new_storage_key, verify_signed_url};

    #[test]
    fn storage_key_keeps_lowercased_extension() {
        let key = new_storage_key("Holiday.JPG");
        assert!(key.ends_with(".jpg"));
        assert_eq!(key.len(), 36 + 4);
        assert!(ensure_valid_key(&key).is_ok());
    }

    #[test]
    fn storage_key_without_extension_is_bare_uuid() {
        assert_eq!(new_storage_key("README").len(), 36);
        assert_eq!(new_storage_key("").len(), 36);
        assert_eq!(new_storage_key("weird.ex t").len(), 36);
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(ensure_valid_key("../etc/passwd").is_err());
        assert!(ensure_valid_key("a/b").is_err());
        assert!(ensure_valid_key("").is_err());
    }

    #[test]
    fn signed_url_verifies_until_expiry() {
        let url = format_signed_url("https://media.test/", b"secret", "k.png", 60, 1_000).unwrap();
        assert!(url.starts_with("https://media.test/k.png?expires=61000&signature="));
        assert_eq!(
            verify_signed_url(&url, b"secret", 60_999).as_deref(),
            Some("k.png")
        );
        assert_eq!(verify_signed_url(&url, b"secret", 61_000), None);
        assert_eq!(verify_signed_url(&url, b"other", 2_000), None);
    }

    #[test]
    fn tampered_or_non_hex_signature_is_rejected() {
        let url = format_signed_url("https://media.test", b"secret", "k.png", 60, 0).unwrap();
        let (prefix, signature) = url.split_once("signature=").unwrap();

        let mut flipped: Vec<char> = signature.chars().collect();
        flipped[0] = if flipped[0] == '0' { '1' } else { '0' };
        let flipped: String = flipped.into_iter().collect();
        let tampered = format!("{prefix}signature={flipped}");
        assert_eq!(verify_signed_url(&tampered, b"secret", 1), None);

        let non_hex = format!("{prefix}signature=zz{}", &signature[2..]);
        assert_eq!(verify_signed_url(&non_hex, b"secret", 1), None);

        let truncated = format!("{prefix}signature={}", &signature[..10]);
        assert_eq!(verify_signed_url(&truncated, b"secret", 1), None);
        assert_eq!(
            verify_signed_url(&url, b"secret", 1).as_deref(),
            Some("k.png")
        );
    }
}

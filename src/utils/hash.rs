//! Content hashing for emitted file names.
//!
//! Emitted assets are named after a hash of their bytes so browsers can cache
//! them forever. The hash is blake3, truncated the same way for every asset:
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let name = format!("{}.woff2", hash::content_hash(&bytes)); // 20 hex chars
//! ```

/// Length of the `[contenthash]` placeholder in hex characters.
pub const CONTENT_HASH_LEN: usize = 20;

/// Hex digest of `data`, truncated to [`CONTENT_HASH_LEN`].
pub fn content_hash<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let digest = blake3::hash(data.as_ref());
    let mut hex = hex::encode(digest.as_bytes());
    hex.truncate(CONTENT_HASH_LEN);
    hex
}

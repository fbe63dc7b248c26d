//! Digests of scoped identifiers.
//!
//! Only a short, stable digest is needed, not a cryptographic one.

use xxhash_rust::xxh3::xxh3_64;

/// xxh3-64 of a string.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Lowercase hex digest of `content`, cut to `len` characters (at most 16).
pub fn short_digest(content: &str, len: usize) -> String {
    let mut hex = format!("{:016x}", hash_str(content));
    hex.truncate(len.min(16));
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_depends_on_module() {
        let a = short_digest("primary--a/styles.scoped.scss", 16);
        let b = short_digest("primary--b/styles.scoped.scss", 16);
        assert_ne!(a, b);
        assert_eq!(a, short_digest("primary--a/styles.scoped.scss", 16));
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(hash_str("abc"), 0x78af5f94892f3950);
        assert_eq!(short_digest("abc", 5), "78af5");
        assert_eq!(short_digest("", 16), "2d06800538d394c2");
        assert_eq!(short_digest("abc", 64).len(), 16);
    }
}

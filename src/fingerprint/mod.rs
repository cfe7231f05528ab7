//! Content fingerprinting for cache drift detection.
//!
//! A fingerprint is a 32-bit rolling digest of a document's text, rendered
//! as a signed decimal string. It is compared on every cached read to decide
//! whether derived data still belongs to the current content.
//!
//! The digest is not collision resistant. Two different texts can share a
//! fingerprint, in which case a stale value may be served until the next
//! invalidation or TTL expiry.
//!
//! Author: kelexine (<https://github.com/kelexine>)

/// Fingerprint of the empty string.
pub const EMPTY_FINGERPRINT: &str = "0";

/// Computes the fingerprint of `text`.
///
/// Folds every UTF-16 code unit into a wrapping `i32` accumulator with
/// `hash = hash * 31 + unit`. Case and whitespace sensitive.
pub fn fingerprint(text: &str) -> String {
    digest(text).to_string()
}

/// Raw 32-bit digest behind [`fingerprint`].
pub fn digest(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        // (hash << 5) - hash == hash * 31
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

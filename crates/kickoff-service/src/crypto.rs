//! HMAC helpers for webhook signatures.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `message` keyed with `secret` (64 characters).
///
/// # Errors
///
/// Returns `InvalidLength` if the key is rejected. HMAC accepts keys of any
/// length, so this only surfaces a broken MAC implementation.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare two strings without short-circuiting on the first differing byte.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

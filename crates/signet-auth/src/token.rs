//! Opaque random handle generation.
//!
//! Session tokens and export job identifiers share the same shape: 16
//! bytes from the operating system RNG, hex encoded to 32 lowercase
//! characters. At 128 bits the handle itself is the capability; no
//! sequential IDs ever leak.

use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes per handle.
const TOKEN_BYTES: usize = 16;

/// Generate a new random handle.
pub fn mint() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(&bytes)
}

/// Check that a presented handle has the exact minted shape.
///
/// Anything else is rejected before it reaches a query, which also keeps
/// arbitrary strings out of log lines and file names derived from job IDs.
pub fn is_valid_format(value: &str) -> bool {
    value.len() == TOKEN_BYTES * 2
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Simple hex encoding without external dependency.
mod hex {
    /// Encode bytes to hex string.
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

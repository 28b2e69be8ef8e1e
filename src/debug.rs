// src/debug.rs
//! Dev-only diagnostics helpers. Raw message text never reaches the logs;
//! messages are identified by a short SHA-256 prefix instead.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

pub const ENV_DEV_LOG: &str = "INSULT_DEV_LOG";
pub const ENV_RUNTIME: &str = "INSULT_ENV";

/// INSULT_DEV_LOG=1 AND dev environment (debug build or INSULT_ENV in {local,development,dev}).
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var(ENV_RUNTIME)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// First 6 bytes of SHA-256 as 12 hex chars.
pub fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("you idiot");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("you idiot"));
        assert_ne!(a, anon_hash("you idiot!"));
    }
}

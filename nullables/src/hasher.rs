//! Nullable seed hasher: SHA-256 that remembers its inputs.

use splitline_crypto::{Sha256SplitHasher, SplitHasher};
use std::sync::Mutex;

/// Produces the same digests as [`Sha256SplitHasher`], so material derived
/// through it interoperates with a real peer, and records every input.
#[derive(Debug, Default)]
pub struct NullHasher {
    inputs: Mutex<Vec<Vec<u8>>>,
}

impl NullHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every input hashed so far, oldest first.
    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().unwrap().clone()
    }

    /// Inputs decoded as UTF-8 (seed strings are always text).
    pub fn seeds(&self) -> Vec<String> {
        self.inputs()
            .into_iter()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .collect()
    }
}

impl SplitHasher for NullHasher {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        self.inputs.lock().unwrap().push(data.to_vec());
        Sha256SplitHasher.hash(data)
    }

    fn name(&self) -> &str {
        "sha256-recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sha256_and_records() {
        let hasher = NullHasher::new();
        assert_eq!(hasher.hash(b"seed_sender"), Sha256SplitHasher.hash(b"seed_sender"));
        assert_eq!(hasher.seeds(), vec!["seed_sender".to_string()]);
    }
}

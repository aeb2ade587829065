//! Nullable random: deterministic random bytes.

use splitline_crypto::RandomSource;
use std::sync::Mutex;

/// A deterministic random source for testing.
///
/// Each `fill_bytes` call consumes the next pre-configured value, cycling
/// when the list runs out. Requests longer than 32 bytes repeat the value.
#[derive(Debug)]
pub struct NullRandom {
    outputs: Vec<[u8; 32]>,
    index: Mutex<usize>,
}

impl NullRandom {
    /// Create with a sequence of deterministic random values.
    pub fn new(outputs: Vec<[u8; 32]>) -> Self {
        assert!(!outputs.is_empty(), "NullRandom needs at least one output");
        Self {
            outputs,
            index: Mutex::new(0),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for NullRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        let mut idx = self.index.lock().unwrap();
        let value = self.outputs[*idx % self.outputs.len()];
        *idx += 1;
        for (byte, source) in dest.iter_mut().zip(value.iter().cycle()) {
            *byte = *source;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_outputs() {
        let rng = NullRandom::new(vec![[1; 32], [2; 32]]);
        assert_eq!(rng.random_32(), [1; 32]);
        assert_eq!(rng.random_16(), [2; 16]);
        assert_eq!(rng.random_32(), [1; 32]);
    }
}

//! Duration helpers.

use std::time::Instant;

/// Milliseconds since `start`, saturating at `u64::MAX`.
pub fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let start = Instant::now();
        assert!(elapsed_ms(start) < 60_000);
    }
}

//! Random source for envelope draws and firework bursts.
//!
//! A xorshift64 generator is plenty for a novelty widget and keeps draws
//! reproducible in tests. In the browser it is seeded from `getrandom` (feature
//! `rng`), falling back to the performance clock.

/// Uniform floats in `[0, 1)` plus a couple of derived helpers.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform float in `[lo, hi)`.
    fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Uniform index in `[0, len)`. Returns 0 for `len == 0`.
    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves the all-zero state
        let state = seed ^ 0x9e37_79b9_7f4a_7c15;
        Self { state: if state == 0 { 0x2545_f491_4f6c_dd1d } else { state } }
    }

    pub fn from_entropy() -> Self {
        Self::new(entropy_seed())
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl RandomSource for XorShift {
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(feature = "rng")]
fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            log::warn!("getrandom unavailable ({}), seeding from clock", err);
            clock_seed()
        }
    }
}

#[cfg(not(feature = "rng"))]
fn entropy_seed() -> u64 {
    clock_seed()
}

#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u64 {
    let now = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    (now * 1_000.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = XorShift::new(7);
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = XorShift::new(42);
        let mut b = XorShift::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn index_handles_empty_and_bounds() {
        let mut rng = XorShift::new(3);
        assert_eq!(rng.index(0), 0);
        for _ in 0..1_000 {
            assert!(rng.index(5) < 5);
        }
    }

    #[test]
    fn zero_seed_still_produces_values() {
        let mut rng = XorShift::new(0x9e37_79b9_7f4a_7c15);
        assert_ne!(rng.next_u64(), 0);
    }
}

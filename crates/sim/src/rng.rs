//! Seeded pseudo-random generator (mulberry32).
//!
//! The wind draw on client and server must come from the same stream, so the
//! generator is pinned to a specific 32-bit mix/avalanche algorithm rather
//! than an ecosystem RNG whose output could change between versions. All
//! arithmetic is `u32` with wraparound; 64-bit or floating-point substitutes
//! silently diverge from the reference sequence.

/// Mulberry32 generator keyed by a `u32` seed.
///
/// Same seed ⇒ identical infinite output sequence on every platform.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
    seed: u32,
}

impl SeededRng {
    /// Create a generator with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed, seed }
    }

    /// Return the seed this generator was constructed (or last reset) with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Advance the stream and return a value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        // f64 holds every u32 exactly; division by 2^32 is exact scaling.
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }

    /// Return a value in `[min, max)`.
    ///
    /// Degenerate ranges (`min == max`) return `min` exactly.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Reinitialize state to `seed`, or to the original seed when `None`.
    pub fn reset(&mut self, seed: Option<u32>) {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self.state = self.seed;
    }
}

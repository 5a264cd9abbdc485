use rand::{
    rngs::{OsRng, ThreadRng},
    RngCore,
};

/// Source of uniform random values for question selection.
///
/// Implemented for every [`RngCore`], so seeded generators can be passed in
/// tests.
pub trait RandomSource {
    /// Returns a value uniformly distributed in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_uniform(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }
}

/// Operating system randomness, switching permanently to the thread-local
/// generator the first time the OS source fails.
#[derive(Debug, Default)]
pub struct SystemRandom {
    fallback: Option<ThreadRng>,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl RngCore for SystemRandom {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Some(fallback) = &mut self.fallback {
            fallback.fill_bytes(dest);
            return;
        }
        if let Err(e) = OsRng.try_fill_bytes(dest) {
            log::warn!("system random source failed ({e}); using pseudorandom fallback");
            self.fallback.insert(rand::thread_rng()).fill_bytes(dest);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub fn uniform_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    let index = (rng.next_uniform() * len as f64) as usize;
    index.min(len - 1)
}

/// Fisher–Yates shuffle.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = uniform_index(rng, i + 1);
        items.swap(i, j);
    }
}

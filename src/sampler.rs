use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the generator's only random decision: which unvisited neighbour
/// to walk into.
pub trait Sampler {
    /// Returns an index in `0..len`, uniformly distributed. `len` is never 0.
    fn pick(&mut self, len: usize) -> usize;
}

/// [`Sampler`] backed by any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSampler<R> {
    rng: R,
}

impl<R: Rng> RngSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSampler<StdRng> {
    /// Seeded sampler when `seed` is given, otherwise seeded from OS entropy.
    pub fn seeded(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng> Sampler for RngSampler<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

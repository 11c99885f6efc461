use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::sampler::Sampler;
use crate::{Float, Point2f, Point2i};

/// Uncorrelated uniform samples, grounded on `IndependentSampler` in the
/// original renderer (every call is just `randf()`). This is the simplest
/// possible `Sampler` and the baseline the other implementations are tested
/// against.
pub struct IndependentSampler {
    samples_per_pixel: usize,
    rng: Xoshiro256Plus,
    current_pixel_sample: usize,
}

impl IndependentSampler {
    pub fn new(samples_per_pixel: usize, seed: u64) -> Self {
        Self {
            samples_per_pixel,
            rng: Xoshiro256Plus::seed_from_u64(seed),
            current_pixel_sample: 0,
        }
    }
}

impl Sampler for IndependentSampler {
    fn start_pixel(&mut self, _pixel: Point2i) {
        self.current_pixel_sample = 0;
    }

    fn start_next_sample(&mut self) -> bool {
        self.current_pixel_sample += 1;
        self.current_pixel_sample <= self.samples_per_pixel
    }

    fn next_1d(&mut self) -> Float {
        self.rng.gen()
    }

    fn next_2d(&mut self) -> Point2f {
        Point2f::new(self.rng.gen(), self.rng.gen())
    }

    fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(Self::new(self.samples_per_pixel, seed))
    }
}

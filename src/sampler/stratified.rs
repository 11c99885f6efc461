use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::sampler::Sampler;
use crate::{Float, Point2f, Point2i};

/// Jittered stratified sampling: `samples_per_pixel` is rounded up to the
/// nearest perfect square and split into an `n x n` grid of strata, each
/// jittered within its cell and shuffled independently per pixel. Completes
/// the `StratifiedSampler` skeleton left as `TODO` in the original renderer's
/// `sampler.cpp`.
///
/// Only the *first* 1-D and first 2-D request within a given pixel sample
/// draw from the stratified grid (this is what the camera sample consumes);
/// anything requested after that (BSDF/light samples deeper in the path)
/// falls back to independent uniform draws, since stratifying arbitrarily
/// many nested requests would require pre-declaring their count up front.
/// This keeps the implementation honest about what it actually stratifies
/// rather than pretending to stratify dimensions it doesn't.
pub struct StratifiedSampler {
    strata_per_dim: usize,
    samples_per_pixel: usize,
    rng: Xoshiro256Plus,
    samples_1d: Vec<Float>,
    samples_2d: Vec<Point2f>,
    current_pixel_sample: usize,
    used_1d: bool,
    used_2d: bool,
}

fn round_to_perfect_square(n: usize) -> usize {
    ((n as Float).sqrt().ceil() as usize).max(1)
}

impl StratifiedSampler {
    pub fn new(requested_samples_per_pixel: usize, seed: u64) -> Self {
        let strata_per_dim = round_to_perfect_square(requested_samples_per_pixel.max(1));
        let mut sampler = Self {
            strata_per_dim,
            samples_per_pixel: strata_per_dim * strata_per_dim,
            rng: Xoshiro256Plus::seed_from_u64(seed),
            samples_1d: Vec::new(),
            samples_2d: Vec::new(),
            current_pixel_sample: 0,
            used_1d: false,
            used_2d: false,
        };
        sampler.stratify_1d();
        sampler.stratify_2d();
        sampler
    }

    fn stratify_1d(&mut self) {
        let n = self.samples_per_pixel;
        self.samples_1d = (0..n)
            .map(|i| ((i as Float) + self.rng.gen::<Float>()) / n as Float)
            .collect();
        self.samples_1d.shuffle(&mut self.rng);
    }

    fn stratify_2d(&mut self) {
        let n = self.strata_per_dim;
        let mut samples = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                let jx = (x as Float + self.rng.gen::<Float>()) / n as Float;
                let jy = (y as Float + self.rng.gen::<Float>()) / n as Float;
                samples.push(Point2f::new(jx, jy));
            }
        }
        samples.shuffle(&mut self.rng);
        self.samples_2d = samples;
    }
}

impl Sampler for StratifiedSampler {
    fn start_pixel(&mut self, _pixel: Point2i) {
        self.current_pixel_sample = 0;
        self.used_1d = false;
        self.used_2d = false;
        self.stratify_1d();
        self.stratify_2d();
    }

    fn start_next_sample(&mut self) -> bool {
        self.used_1d = false;
        self.used_2d = false;
        self.current_pixel_sample += 1;
        self.current_pixel_sample <= self.samples_per_pixel
    }

    fn next_1d(&mut self) -> Float {
        if !self.used_1d && self.current_pixel_sample >= 1 {
            self.used_1d = true;
            self.samples_1d[self.current_pixel_sample - 1]
        } else {
            self.rng.gen()
        }
    }

    fn next_2d(&mut self) -> Point2f {
        if !self.used_2d && self.current_pixel_sample >= 1 {
            self.used_2d = true;
            self.samples_2d[self.current_pixel_sample - 1]
        } else {
            Point2f::new(self.rng.gen(), self.rng.gen())
        }
    }

    fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel
    }

    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(Self::new(self.samples_per_pixel, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_perfect_square() {
        let s = StratifiedSampler::new(10, 0);
        assert_eq!(s.samples_per_pixel(), 16);
    }
}

//! The `Sampler` contract (spec.md §4.1): integrators only rely on
//! `next_1d`/`next_2d` returning values in `[0, 1)` and on `start_pixel`/
//! `start_next_sample` partitioning the sample sequence per pixel. They must
//! not depend on the structure of any particular implementation (independent,
//! stratified, Halton...).

pub mod independent;
pub mod stratified;

pub use independent::IndependentSampler;
pub use stratified::StratifiedSampler;

use crate::{Float, Point2f, Point2i};

pub trait Sampler: Send {
    fn start_pixel(&mut self, pixel: Point2i);

    /// Advance to the next sample for the current pixel. Returns `false`
    /// once `samples_per_pixel` samples have been produced.
    fn start_next_sample(&mut self) -> bool;

    fn next_1d(&mut self) -> Float;

    fn next_2d(&mut self) -> Point2f;

    fn samples_per_pixel(&self) -> usize;

    /// An independent copy of this sampler re-seeded for a different tile,
    /// so tiles can be rendered in parallel without sharing RNG state.
    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler>;
}

//! The image accumulator (spec.md §4.9, §5): accumulates per-pixel radiance
//! samples and averages them into a linear RGB image.
//!
//! Grounded on the teacher's `Film`/`FilmTile` (`film.rs`) for the
//! tile-ownership shape (a `Mutex<Vec<Pixel>>` merged from disjoint,
//! per-worker `FilmTile`s so writes never alias, per spec.md §5). The
//! teacher's reconstruction filter (box/Gaussian/Mitchell, `filter_table`)
//! has no counterpart here: spec.md §4.9 only asks for a plain running mean
//! per pixel, so `Pixel` is a sum and a count rather than a filter-weighted
//! contribution.

use parking_lot::Mutex;

use crate::color::Color;
use crate::Point2i;

#[derive(Clone, Copy, Default)]
struct Pixel {
    sum: Color,
    count: u32,
}

pub struct Film {
    resolution: Point2i,
    pixels: Mutex<Vec<Pixel>>,
}

/// A worker's private accumulation buffer for one tile, later merged into
/// the shared `Film` by `merge_film_tile`. Tiles are disjoint rectangles, so
/// no synchronization is needed until the merge (spec.md §5).
pub struct FilmTile {
    x0: i32,
    y0: i32,
    width: i32,
    pixels: Vec<Pixel>,
}

impl Film {
    pub fn new(resolution: Point2i) -> Self {
        let n = (resolution.x * resolution.y).max(0) as usize;
        Self {
            resolution,
            pixels: Mutex::new(vec![Pixel::default(); n]),
        }
    }

    pub fn resolution(&self) -> Point2i {
        self.resolution
    }

    pub fn get_film_tile(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> FilmTile {
        let width = x1 - x0;
        let height = y1 - y0;
        FilmTile {
            x0,
            y0,
            width,
            pixels: vec![Pixel::default(); (width * height).max(0) as usize],
        }
    }

    pub fn merge_film_tile(&self, tile: FilmTile) {
        let mut pixels = self.pixels.lock();
        let tile_height = tile.pixels.len() as i32 / tile.width.max(1);
        for ty in 0..tile_height {
            for tx in 0..tile.width {
                let src = &tile.pixels[(ty * tile.width + tx) as usize];
                if src.count == 0 {
                    continue;
                }
                let x = tile.x0 + tx;
                let y = tile.y0 + ty;
                let idx = (y * self.resolution.x + x) as usize;
                pixels[idx].sum += src.sum;
                pixels[idx].count += src.count;
            }
        }
    }

    /// The final averaged linear RGB image, row-major, `(width, height)`.
    pub fn into_rgb_buffer(self) -> (Vec<[crate::Float; 3]>, (u32, u32)) {
        let pixels = self.pixels.into_inner();
        let buf = pixels
            .into_iter()
            .map(|p| {
                if p.count == 0 {
                    [0.0, 0.0, 0.0]
                } else {
                    let avg = p.sum / p.count as crate::Float;
                    [avg.r, avg.g, avg.b]
                }
            })
            .collect();
        (buf, (self.resolution.x as u32, self.resolution.y as u32))
    }
}

impl FilmTile {
    pub fn add_sample(&mut self, x: i32, y: i32, radiance: Color) {
        let tx = x - self.x0;
        let ty = y - self.y0;
        let idx = (ty * self.width + tx) as usize;
        let pixel = &mut self.pixels[idx];
        pixel.sum += radiance;
        pixel.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_samples_within_a_pixel() {
        let film = Film::new(Point2i::new(2, 2));
        let mut tile = film.get_film_tile(0, 0, 2, 2);
        tile.add_sample(0, 0, Color::uniform(1.0));
        tile.add_sample(0, 0, Color::uniform(3.0));
        film.merge_film_tile(tile);

        let (buf, dims) = film.into_rgb_buffer();
        assert_eq!(dims, (2, 2));
        assert_eq!(buf[0], [2.0, 2.0, 2.0]);
        assert_eq!(buf[1], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn disjoint_tiles_merge_without_clobbering() {
        let film = Film::new(Point2i::new(4, 2));
        let mut left = film.get_film_tile(0, 0, 2, 2);
        let mut right = film.get_film_tile(2, 0, 4, 2);
        left.add_sample(1, 1, Color::uniform(5.0));
        right.add_sample(3, 0, Color::uniform(7.0));
        film.merge_film_tile(left);
        film.merge_film_tile(right);

        let (buf, _) = film.into_rgb_buffer();
        assert_eq!(buf[1 * 4 + 1], [5.0, 5.0, 5.0]);
        assert_eq!(buf[0 * 4 + 3], [7.0, 7.0, 7.0]);
    }
}

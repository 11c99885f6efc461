//! Background radiance for rays that escape the scene (spec.md §3, "Background").
//!
//! `ConstantBackground` mirrors the original renderer's `ConstantBackground`
//! (`background.h`/`background.cpp`). `GradientBackground` is a second,
//! commonly-used variant (vertical lerp between a horizon and zenith color,
//! built on this crate's own `lerp`) kept mainly so the CLI driver and
//! scenario tests have a non-black default without needing image-based
//! environment maps, which stay out of scope.

use crate::color::Color;
use crate::lerp;
use crate::ray::Ray;
use crate::InnerSpace;

pub trait Background: Send + Sync {
    fn value(&self, ray: &Ray) -> Color;
}

pub struct ConstantBackground {
    pub color: Color,
}

impl Background for ConstantBackground {
    fn value(&self, _ray: &Ray) -> Color {
        self.color
    }
}

pub struct GradientBackground {
    pub horizon: Color,
    pub zenith: Color,
}

impl Background for GradientBackground {
    fn value(&self, ray: &Ray) -> Color {
        let d = ray.d.normalize();
        let t = 0.5 * (d.y + 1.0);
        Color::new(
            lerp(t, self.horizon.r, self.zenith.r),
            lerp(t, self.horizon.g, self.zenith.g),
            lerp(t, self.horizon.b, self.zenith.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3f;
    use crate::Vec3f;

    #[test]
    fn gradient_interpolates_by_vertical_direction() {
        let bg = GradientBackground {
            horizon: Color::BLACK,
            zenith: Color::WHITE,
        };
        let up = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0));
        let down = Ray::new(Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, -1.0, 0.0));
        assert!(bg.value(&up).r > bg.value(&down).r);
    }
}

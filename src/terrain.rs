use crate::surface::{DrawingSurface, Rgb};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    // Perturbation bound at the coarsest level, in pixels
    pub initial_displacement: f32,
    // Displacement multiplier applied after each halving level
    pub roughness: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            initial_displacement: 140.0,
            roughness: 0.6,
        }
    }
}

/// Ridge heights from 1-D midpoint displacement, one entry per column up to
/// the smallest power of two that covers the width.
pub struct HeightProfile {
    width: usize,
    height: usize,
    points: Vec<f32>,
}

impl HeightProfile {
    pub fn generate(width: usize, height: usize, params: TerrainParams, rng: &mut fastrand::Rng) -> Self {
        Self::generate_with(width, height, params, || rng.f32())
    }

    // `random` yields uniform draws in [0, 1)
    fn generate_with(width: usize, height: usize, params: TerrainParams, mut random: impl FnMut() -> f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let power = width.next_power_of_two();
        let h = height as f32;

        let mut displacement = params.initial_displacement;
        let mut points = vec![0.0f32; power + 1];
        points[0] = h - random() * h / 2.0 - displacement;
        points[power] = h - random() * h / 2.0 - displacement;

        let mut step = 1;
        while step < power {
            let half = power / step / 2;
            let mut j = half;
            while j < power {
                let mid = (points[j - half] + points[j + half]) / 2.0;
                points[j] = mid + (random() * -displacement + displacement).floor();
                j += power / step;
            }
            displacement *= params.roughness;
            step *= 2;
        }

        debug!(width, height, power, "terrain profile generated");

        Self { width, height, points }
    }

    pub fn power(&self) -> usize {
        self.points.len() - 1
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.points.get(index).copied()
    }

    /// Closed silhouette: the ridge across `0..=width`, then down to the
    /// bottom corners and back to the start.
    pub fn outline(&self) -> Vec<(f32, f32)> {
        let bottom = self.height as f32;
        let mut path = Vec::with_capacity(self.width + 4);
        path.extend(
            self.points[..=self.width]
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f32, y)),
        );
        path.push((self.width as f32, bottom));
        path.push((0.0, bottom));
        path.push((0.0, self.points[0]));
        path
    }

    pub fn rasterize(&self, surface: &mut impl DrawingSurface, color: Rgb) {
        surface.set_fill_color(color);
        surface.fill_polygon(&self.outline());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Canvas;

    #[test]
    fn power_covers_width() {
        let mut rng = fastrand::Rng::with_seed(1);
        for (width, power) in [(1, 1), (2, 2), (3, 4), (1000, 1024), (1024, 1024), (1025, 2048)] {
            let profile = HeightProfile::generate(width, 900, TerrainParams::default(), &mut rng);
            assert_eq!(profile.power(), power, "width {width}");
            assert_eq!(profile.len(), power + 1);
            assert!(profile.get(0).is_some());
            assert!(profile.get(width).is_some());
            assert!(profile.get(power + 1).is_none());
        }
    }

    #[test]
    fn zero_dimensions_are_clamped() {
        let mut rng = fastrand::Rng::with_seed(2);
        let profile = HeightProfile::generate(0, 0, TerrainParams::default(), &mut rng);
        assert_eq!(profile.power(), 1);
        assert!(profile.outline().iter().all(|p| p.0.is_finite() && p.1.is_finite()));
    }

    #[test]
    fn heights_stay_inside_displacement_envelope() {
        let params = TerrainParams::default();
        // Perturbations are never negative and sum to at most d / (1 - roughness)
        let total = params.initial_displacement / (1.0 - params.roughness);

        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            for (width, height) in [(1024, 900), (1366, 950), (37, 1100)] {
                let h = height as f32;
                let profile = HeightProfile::generate(width, height, params, &mut rng);
                let low = h / 2.0 - params.initial_displacement;
                let high = h - params.initial_displacement + total;
                for i in 0..=width {
                    let y = profile.get(i).unwrap();
                    assert!(y >= low - 1e-3 && y <= high + 1e-3, "seed {seed} index {i}: {y}");
                    assert!(y >= -params.initial_displacement);
                }
            }
        }
    }

    #[test]
    fn midpoints_are_neighbour_means_without_noise() {
        // Distinct endpoints, then draws that floor the perturbation to zero
        let mut draws = [0.1f32, 0.8].into_iter();
        let profile = HeightProfile::generate_with(256, 900, TerrainParams::default(), || {
            draws.next().unwrap_or(0.999_999)
        });

        let power = profile.power();
        let mut step = 1;
        while step < power {
            let half = power / step / 2;
            for j in (half..power).step_by(power / step) {
                let left = profile.get(j - half).unwrap();
                let right = profile.get(j + half).unwrap();
                assert_eq!(profile.get(j).unwrap(), (left + right) / 2.0, "index {j}");
            }
            step *= 2;
        }

        assert!((profile.get(0).unwrap() - 715.0).abs() < 1e-3);
        assert!((profile.get(256).unwrap() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn outline_closes_along_the_bottom() {
        let mut rng = fastrand::Rng::with_seed(3);
        let profile = HeightProfile::generate(100, 900, TerrainParams::default(), &mut rng);
        let outline = profile.outline();

        assert_eq!(outline.len(), 101 + 3);
        assert_eq!(outline[0], (0.0, profile.get(0).unwrap()));
        assert_eq!(outline[100].0, 100.0);
        assert_eq!(outline[101], (100.0, 900.0));
        assert_eq!(outline[102], (0.0, 900.0));
        assert_eq!(outline[103], outline[0]);
    }

    #[test]
    fn rasterized_ridge_fills_the_bottom_only() {
        let profile = HeightProfile::generate_with(64, 900, TerrainParams::default(), || 0.5);
        let mut canvas = Canvas::new(64, 900, 64, 90).unwrap();
        profile.rasterize(&mut canvas, (0, 0, 0));

        for column in 0..64 {
            for row in 0..30 {
                assert_eq!(canvas.alpha_at(column, row), 0.0, "sky at ({column}, {row})");
            }
            assert!(canvas.alpha_at(column, 89) > 0.99, "ground at column {column}");
        }
    }
}

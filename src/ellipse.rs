//! # Ellipse fitting
//!
//! The spatial model only needs center, orientation and the two semi-axes of an ellipse
//! covering a planar point cloud. [`EllipseFit`] is the seam; [`MinimumVolumeEllipse`] is the
//! default implementation.

use itertools::{Itertools, MinMaxResult};
use log::{trace, warn};
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use ordered_float::OrderedFloat;

use crate::config::EllipseFitConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ellipse {
    pub center_x: f64,
    pub center_y: f64,
    /// Direction of the major axis in radians, within (-π/2, π/2]
    pub orientation: f64,
    pub semi_major: f64,
    pub semi_minor: f64,
}

pub trait EllipseFit {
    /// Fits an ellipse to the points `(xs[i], ys[i])`. Returns `None` for an empty cloud.
    fn fit(&self, xs: &[f64], ys: &[f64]) -> Option<Ellipse>;
}

/// Smallest-area ellipse enclosing every point.
///
/// Solved with Khachiyan's iteration plus Todd–Yildirim away steps on the lifted points
/// `(x, y, 1)`, then scaled to reach the farthest point. Coincident and collinear clouds have
/// no finite solution and fall back to a flat ellipse spanning the points along their
/// principal direction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinimumVolumeEllipse {
    config: EllipseFitConfig,
}

/// Dimension of the fitted space
const DIM: f64 = 2.0;

/// Weighted mean and second central moments (xx, xy, yy)
fn weighted_moments(points: &[Vector2<f64>], weights: &[f64]) -> (Vector2<f64>, f64, f64, f64) {
    let mean = points
        .iter()
        .zip(weights)
        .fold(Vector2::zeros(), |acc, (p, w)| acc + p * *w);
    let (xx, xy, yy) = points.iter().zip(weights).fold((0.0, 0.0, 0.0), |(xx, xy, yy), (p, w)| {
        let d = p - mean;
        (xx + w * d.x * d.x, xy + w * d.x * d.y, yy + w * d.y * d.y)
    });
    (mean, xx, xy, yy)
}

/// Eigenvalues (larger, smaller) and the angle of the larger one's eigenvector
fn principal_axes(xx: f64, xy: f64, yy: f64) -> (f64, f64, f64) {
    let half_trace = 0.5 * (xx + yy);
    let radius = (0.25 * (xx - yy) * (xx - yy) + xy * xy).sqrt();
    let angle = 0.5 * (2.0 * xy).atan2(xx - yy);
    (half_trace + radius, half_trace - radius, angle)
}

impl MinimumVolumeEllipse {
    pub fn new(config: EllipseFitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EllipseFitConfig {
        &self.config
    }

    fn flat(points: &[Vector2<f64>], mean: Vector2<f64>, angle: f64) -> Ellipse {
        let direction = Vector2::new(angle.cos(), angle.sin());
        let (lo, hi) = match points
            .iter()
            .map(|p| OrderedFloat((p - mean).dot(&direction)))
            .minmax()
        {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(t) => (t.0, t.0),
            MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        };
        let center = mean + direction * (0.5 * (lo + hi));
        Ellipse {
            center_x: center.x,
            center_y: center.y,
            orientation: angle,
            semi_major: 0.5 * (hi - lo),
            semi_minor: 0.0,
        }
    }

    /// Weights of the points in the optimal ellipse, `None` if the lifted scatter turns singular.
    ///
    /// Stops once every lifted distance is within `tolerance` (relative) of `DIM + 1`, the
    /// optimality condition. Unconverged weights are still usable: [`EllipseFit::fit`] scales
    /// the result until it encloses every point.
    fn khachiyan(&self, points: &[Vector2<f64>]) -> Option<Vec<f64>> {
        let n = points.len();
        let lifted = points.iter().map(|p| Vector3::new(p.x, p.y, 1.0)).collect_vec();
        let mut weights = vec![1.0 / n as f64; n];
        let target = DIM + 1.0;
        let tolerance = self.config.tolerance;

        for iteration in 0..self.config.max_iterations {
            let scatter = lifted
                .iter()
                .zip(&weights)
                .fold(Matrix3::zeros(), |acc, (q, w)| acc + q * q.transpose() * *w);
            let inverse = scatter.try_inverse()?;
            let distances = lifted.iter().map(|q| q.dot(&(inverse * q))).collect_vec();

            let (far, far_distance) = distances
                .iter()
                .copied()
                .enumerate()
                .max_by_key(|(_, d)| OrderedFloat(*d))?;
            let (near, near_distance) = distances
                .iter()
                .copied()
                .enumerate()
                .filter(|(i, _)| weights[*i] > 0.0)
                .min_by_key(|(_, d)| OrderedFloat(*d))?;

            if far_distance <= target * (1.0 + tolerance) && near_distance >= target * (1.0 - tolerance) {
                trace!("ellipse fit converged after {} iterations", iteration);
                return Some(weights);
            }

            let (index, step) = if far_distance - target >= target - near_distance {
                // far_distance >= target > 1 here: the weighted mean distance is exactly target
                (far, (far_distance - target) / (target * (far_distance - 1.0)))
            } else {
                // away step, at most removing all weight from `near`
                let cap = -weights[near] / (1.0 - weights[near]);
                let step = if near_distance > 1.0 {
                    ((near_distance - target) / (target * (near_distance - 1.0))).max(cap)
                } else {
                    cap
                };
                (near, step)
            };

            for (i, w) in weights.iter_mut().enumerate() {
                *w *= 1.0 - step;
                if i == index {
                    *w += step;
                }
                // rounding only, the cap keeps the update non-negative
                *w = w.max(0.0);
            }
        }
        warn!(
            "ellipse fit stopped after {} iterations without converging",
            self.config.max_iterations
        );
        Some(weights)
    }
}

impl EllipseFit for MinimumVolumeEllipse {
    fn fit(&self, xs: &[f64], ys: &[f64]) -> Option<Ellipse> {
        if xs.len() != ys.len() {
            warn!("ellipse fit got {} x values and {} y values", xs.len(), ys.len());
        }
        let points = xs.iter().zip(ys).map(|(x, y)| Vector2::new(*x, *y)).collect_vec();
        if points.is_empty() {
            return None;
        }

        let uniform = vec![1.0 / points.len() as f64; points.len()];
        let (mean, xx, xy, yy) = weighted_moments(&points, &uniform);
        let (major, minor, angle) = principal_axes(xx, xy, yy);
        if minor <= self.config.degeneracy_ratio * major {
            trace!("degenerate point cloud of {} points, fitting a flat ellipse", points.len());
            return Some(Self::flat(&points, mean, angle));
        }

        let weights = match self.khachiyan(&points) {
            Some(weights) => weights,
            None => return Some(Self::flat(&points, mean, angle)),
        };
        let (center, xx, xy, yy) = weighted_moments(&points, &weights);
        let shape = match Matrix2::new(xx, xy, xy, yy).try_inverse() {
            Some(shape) => shape,
            None => return Some(Self::flat(&points, mean, angle)),
        };
        // squared radius reaching the farthest point, DIM at the optimum
        let radius = points
            .iter()
            .map(|p| {
                let d = p - center;
                d.dot(&(shape * d))
            })
            .fold(0.0, f64::max);
        let (major, minor, angle) = principal_axes(xx, xy, yy);
        Some(Ellipse {
            center_x: center.x,
            center_y: center.y,
            orientation: angle,
            semi_major: (radius * major).sqrt(),
            semi_minor: (radius * minor.max(0.0)).sqrt(),
        })
    }
}

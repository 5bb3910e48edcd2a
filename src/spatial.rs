//! # Group spatial model
//!
//! One pose, covariance and extent standing for a whole group, always re-derived from the
//! members and never transformed on its own.

use crate::data::{CovIndex, Covariance, Point3, Pose, PoseWithCovariance, Quaternion, Span};
use crate::ellipse::EllipseFit;
use crate::person::Person;

/// Out-of-band "unknown" marker stored in covariance cells.
///
/// Not a statistically meaningful variance; downstream consumers compare against the literal.
pub const COVARIANCE_UNKNOWN: f64 = 9_999_999.9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialModel {
    pub pose: PoseWithCovariance,
    pub span: Span,
}

impl SpatialModel {
    /// Model of a group without member objects: centered on its center of gravity,
    /// every covariance cell unknown, zero span
    pub fn unknown(center_of_gravity: &Point3) -> Self {
        Self {
            pose: PoseWithCovariance {
                pose: Pose::new(*center_of_gravity, Quaternion::identity()),
                covariance: Covariance::from_element(COVARIANCE_UNKNOWN),
            },
            span: Span::default(),
        }
    }

    /// Fits the model to the members' planar positions.
    ///
    /// Position covariance is the cell-wise maximum over members, with XY and YX forced equal.
    /// z, roll and pitch are unknown while yaw is marked as confident (the reciprocal of the
    /// unknown marker).
    pub fn fit<F>(members: &[Person], center_of_gravity: &Point3, fitter: &F) -> Self
    where
        F: EllipseFit + ?Sized,
    {
        let (xs, ys): (Vec<f64>, Vec<f64>) = members.iter().map(|p| (p.position_x(), p.position_y())).unzip();
        let ellipse = match fitter.fit(&xs, &ys) {
            Some(ellipse) => ellipse,
            None => return Self::unknown(center_of_gravity),
        };

        let z = members.iter().map(Person::position_z).sum::<f64>() / members.len() as f64;
        let max_cell = |index: CovIndex| {
            members
                .iter()
                .map(|p| p.pose().cov(index))
                .fold(f64::NEG_INFINITY, f64::max)
        };

        let mut pose = PoseWithCovariance::new(
            Pose::planar(ellipse.center_x, ellipse.center_y, z, ellipse.orientation),
            Covariance::zeros(),
        );
        let xy = max_cell(CovIndex::XY).max(max_cell(CovIndex::YX));
        pose.set_cov(CovIndex::XX, max_cell(CovIndex::XX));
        pose.set_cov(CovIndex::XY, xy);
        pose.set_cov(CovIndex::YX, xy);
        pose.set_cov(CovIndex::YY, max_cell(CovIndex::YY));
        for index in [CovIndex::ZZ, CovIndex::RollRoll, CovIndex::PitchPitch] {
            pose.set_cov(index, COVARIANCE_UNKNOWN);
        }
        pose.set_cov(CovIndex::YawYaw, 1.0 / COVARIANCE_UNKNOWN);

        Self {
            pose,
            span: Span {
                x: 2.0 * ellipse.semi_major,
                y: 2.0 * ellipse.semi_minor,
            },
        }
    }

    /// Mean position of `members`, `None` when there are none
    pub fn centroid(members: &[&Person]) -> Option<Point3> {
        if members.is_empty() {
            return None;
        }
        let sum = members.iter().map(|p| p.position().coords).reduce(|a, b| a + b)?;
        Some(Point3::from(sum / members.len() as f64))
    }
}

use std::fmt;

use nalgebra as na;

use derive_more::Display;
use num_enum::IntoPrimitive;

pub type Point3 = na::Point3<f64>;
pub type Vector3 = na::Vector3<f64>;
pub type Quaternion = na::UnitQuaternion<f64>;

/// 6x6 covariance over (x, y, z, roll, pitch, yaw), flattened row-major on the wire
pub type Covariance = na::Matrix6<f64>;

/// Number of values in a flattened 6x6 covariance
pub const COVARIANCE_LEN: usize = 36;

/// Named cells of the row-major flattened covariance
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(usize)]
pub enum CovIndex {
    XX = 0,
    XY = 1,
    YX = 6,
    YY = 7,
    ZZ = 14,
    RollRoll = 21,
    PitchPitch = 28,
    YawYaw = 35,
}

impl CovIndex {
    /// (row, column) of the cell inside the 6x6 matrix
    #[inline]
    pub fn cell(self) -> (usize, usize) {
        let flat = usize::from(self);
        (flat / 6, flat % 6)
    }
}

/// Builds a covariance from exactly 36 row-major values
pub fn covariance_from_row_major(values: &[f64]) -> Option<Covariance> {
    if values.len() != COVARIANCE_LEN {
        return None;
    }
    Some(Covariance::from_row_slice(values))
}

/// Flattens a covariance back into its 36 row-major values
pub fn covariance_to_row_major(cov: &Covariance) -> Vec<f64> {
    (0..6).flat_map(|row| (0..6).map(move |col| cov[(row, col)])).collect()
}

/// Position and orientation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Point3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Point3, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }

    /// Planar pose, rotation only around z
    pub fn planar(x: f64, y: f64, z: f64, yaw: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            orientation: Quaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    #[inline]
    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: {}, y: {}, z: {}, yaw: {}", self.position.x, self.position.y, self.position.z, self.yaw())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            orientation: Quaternion::identity(),
        }
    }
}

/// Pose together with its 6x6 covariance.
///
/// Velocities reuse the same shape: linear velocity lives in `pose.position`
/// and angular velocity in `pose.orientation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseWithCovariance {
    pub pose: Pose,
    pub covariance: Covariance,
}

impl PoseWithCovariance {
    pub fn new(pose: Pose, covariance: Covariance) -> Self {
        Self { pose, covariance }
    }

    #[inline]
    pub fn cov(&self, index: CovIndex) -> f64 {
        self.covariance[index.cell()]
    }

    #[inline]
    pub fn set_cov(&mut self, index: CovIndex, value: f64) {
        self.covariance[index.cell()] = value;
    }
}

impl Default for PoseWithCovariance {
    fn default() -> Self {
        Self {
            pose: Pose::default(),
            covariance: Covariance::zeros(),
        }
    }
}

/// Extents of the fitted group ellipse along its major (x) and minor (y) axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Display)]
#[display(fmt = "span x: {}, span y: {}", x, y)]
pub struct Span {
    pub x: f64,
    pub y: f64,
}

/// Rigid transform from a parent frame into a child frame.
///
/// Translation moves positions only; covariances and velocities are rotated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
    isometry: na::Isometry3<f64>,
}

impl FrameTransform {
    pub fn new(translation: Vector3, rotation: Quaternion) -> Self {
        Self {
            isometry: na::Isometry3::from_parts(na::Translation3::from(translation), rotation),
        }
    }

    pub fn identity() -> Self {
        Self {
            isometry: na::Isometry3::identity(),
        }
    }

    pub fn translation(&self) -> Vector3 {
        self.isometry.translation.vector
    }

    pub fn rotation(&self) -> Quaternion {
        self.isometry.rotation
    }

    /// blockdiag(R, R), rotating both the linear and the angular part
    fn rotation_6d(&self) -> Covariance {
        let r = self.isometry.rotation.to_rotation_matrix().into_inner();
        let mut rot = Covariance::zeros();
        rot.fixed_slice_mut::<3, 3>(0, 0).copy_from(&r);
        rot.fixed_slice_mut::<3, 3>(3, 3).copy_from(&r);
        rot
    }

    fn rotate_covariance(&self, cov: &Covariance) -> Covariance {
        let rot = self.rotation_6d();
        rot * cov * rot.transpose()
    }

    pub fn apply_to_point(&self, point: &Point3) -> Point3 {
        self.isometry * point
    }

    pub fn apply_to_pose(&self, pose: &PoseWithCovariance) -> PoseWithCovariance {
        PoseWithCovariance {
            pose: Pose {
                position: self.isometry * pose.pose.position,
                orientation: self.isometry.rotation * pose.pose.orientation,
            },
            covariance: self.rotate_covariance(&pose.covariance),
        }
    }

    /// Rotates the linear velocity; the angular part is a rate and stays as is
    pub fn apply_to_velocity(&self, velocity: &PoseWithCovariance) -> PoseWithCovariance {
        let linear = self.isometry.rotation * velocity.pose.position.coords;
        PoseWithCovariance {
            pose: Pose {
                position: Point3::from(linear),
                orientation: velocity.pose.orientation,
            },
            covariance: self.rotate_covariance(&velocity.covariance),
        }
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

pub mod input;

//! # Tracked person

use derivative::Derivative;

use crate::data::{
    input::PersonRecord, CovIndex, FrameTransform, Point3, Pose, PoseWithCovariance, Quaternion, Vector3,
};
use crate::error::Result;
use crate::tags::{self, DecodedTags};

/// One tracked individual.
///
/// Immutable after construction except for [`Person::transform`].
#[derive(Clone, Debug, PartialEq, Derivative)]
#[derivative(Default)]
pub struct Person {
    /// Opaque track label
    id: String,
    pose: PoseWithCovariance,
    velocity: PoseWithCovariance,
    reliability: f64,
    #[derivative(Default(value = "true"))]
    occluded: bool,
    /// Whether the perception system currently matches this track
    matched: bool,
    detection_id: u32,
    track_age: u64,
    /// Empty when the person is not assigned to a group
    group_id: String,
    /// Group state as this person's record last reported it
    group_age: u64,
    group_track_ids: Vec<String>,
    #[derivative(Default(value = "Point3::origin()"))]
    group_center_of_gravity: Point3,
}

impl Person {
    /// Person without tag data: heading follows the velocity, covariances are zero
    pub fn new(id: impl Into<String>, position: Point3, velocity: Vector3, reliability: f64) -> Self {
        Self {
            id: id.into(),
            pose: PoseWithCovariance {
                pose: Pose::planar(position.x, position.y, position.z, velocity.y.atan2(velocity.x)),
                ..PoseWithCovariance::default()
            },
            velocity: PoseWithCovariance {
                pose: Pose::new(Point3::from(velocity), Quaternion::identity()),
                ..PoseWithCovariance::default()
            },
            reliability,
            ..Self::default()
        }
    }

    /// Person from full pose and velocity states
    pub fn from_states(
        id: impl Into<String>,
        pose: PoseWithCovariance,
        velocity: PoseWithCovariance,
        reliability: f64,
    ) -> Self {
        Self {
            id: id.into(),
            pose,
            velocity,
            reliability,
            ..Self::default()
        }
    }

    /// Decodes a raw record; see [`crate::tags`] for the vocabulary
    pub fn from_record(record: &PersonRecord) -> Result<Self> {
        let decoded = tags::decode(&record.tag_names, &record.tags)?;
        Ok(Self::from_decoded(record, decoded.as_ref()))
    }

    /// Builds the person from a record whose tags were already decoded
    pub fn from_decoded(record: &PersonRecord, decoded: Option<&DecodedTags>) -> Self {
        let person = Self::new(record.id.clone(), record.position, record.velocity, record.reliability);
        match decoded {
            Some(decoded) => person.with_decoded(decoded),
            None => person,
        }
    }

    fn with_decoded(mut self, decoded: &DecodedTags) -> Self {
        if let Some(orientation) = decoded.orientation {
            self.pose.pose.orientation = orientation;
        }
        if let Some(cov) = decoded.pose_covariance {
            self.pose.covariance = cov;
        }
        if let Some(cov) = decoded.twist_covariance {
            self.velocity.covariance = cov;
        }
        if let Some(occluded) = decoded.occluded {
            self.occluded = occluded;
        }
        if let Some(matched) = decoded.matched {
            self.matched = matched;
        }
        if let Some(detection_id) = decoded.detection_id {
            self.detection_id = detection_id;
        }
        if let Some(track_age) = decoded.track_age {
            self.track_age = track_age;
        }
        if let Some(group_id) = &decoded.group_id {
            self.group_id = group_id.clone();
        }
        if let Some(group_age) = decoded.group_age {
            self.group_age = group_age;
        }
        if let Some(track_ids) = &decoded.group_track_ids {
            self.group_track_ids = track_ids.clone();
        }
        if let Some(cog) = decoded.group_center_of_gravity {
            self.group_center_of_gravity = cog;
        }
        self
    }

    pub fn with_occluded(mut self, occluded: bool) -> Self {
        self.occluded = occluded;
        self
    }

    pub fn with_matched(mut self, matched: bool) -> Self {
        self.matched = matched;
        self
    }

    pub fn with_detection_id(mut self, detection_id: u32) -> Self {
        self.detection_id = detection_id;
        self
    }

    pub fn with_track_age(mut self, track_age: u64) -> Self {
        self.track_age = track_age;
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Moves the person into another frame, in place
    pub fn transform(&mut self, transform: &FrameTransform) {
        self.pose = transform.apply_to_pose(&self.pose);
        self.velocity = transform.apply_to_velocity(&self.velocity);
        self.group_center_of_gravity = transform.apply_to_point(&self.group_center_of_gravity);
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn pose(&self) -> &PoseWithCovariance {
        &self.pose
    }

    #[inline]
    pub fn position(&self) -> Point3 {
        self.pose.pose.position
    }

    #[inline]
    pub fn orientation(&self) -> Quaternion {
        self.pose.pose.orientation
    }

    pub fn position_x(&self) -> f64 {
        self.pose.pose.position.x
    }

    pub fn position_y(&self) -> f64 {
        self.pose.pose.position.y
    }

    pub fn position_z(&self) -> f64 {
        self.pose.pose.position.z
    }

    pub fn yaw(&self) -> f64 {
        self.pose.pose.yaw()
    }

    #[inline]
    pub fn velocity(&self) -> &PoseWithCovariance {
        &self.velocity
    }

    pub fn velocity_x(&self) -> f64 {
        self.velocity.pose.position.x
    }

    pub fn velocity_y(&self) -> f64 {
        self.velocity.pose.position.y
    }

    pub fn velocity_z(&self) -> f64 {
        self.velocity.pose.position.z
    }

    /// Angular velocity around z
    pub fn velocity_theta(&self) -> f64 {
        self.velocity.pose.yaw()
    }

    pub fn pose_cov(&self, index: CovIndex) -> f64 {
        self.pose.cov(index)
    }

    pub fn velocity_cov(&self, index: CovIndex) -> f64 {
        self.velocity.cov(index)
    }

    pub fn reliability(&self) -> f64 {
        self.reliability
    }

    pub fn is_occluded(&self) -> bool {
        self.occluded
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn detection_id(&self) -> u32 {
        self.detection_id
    }

    pub fn track_age(&self) -> u64 {
        self.track_age
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn is_assigned_to_group(&self) -> bool {
        !self.group_id.is_empty()
    }

    /// Age of the group this person reported, 0 without the tag
    pub fn group_age(&self) -> u64 {
        self.group_age
    }

    /// Member ids this person reported for its group
    pub fn group_track_ids(&self) -> &[String] {
        &self.group_track_ids
    }

    /// Reported group center of gravity, in the person's current frame
    pub fn group_center_of_gravity(&self) -> Point3 {
        self.group_center_of_gravity
    }
}

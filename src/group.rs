//! # Groups of people
//!
//! A group knows its members by id and, once resolved, by [`Person`] object. The two are kept
//! apart on purpose: a group rebuilt from persisted tags lists member ids long before the
//! person objects are available.

use std::collections::{HashMap, HashSet};

use log::{trace, warn};
use once_cell::sync::Lazy;

use crate::data::{CovIndex, FrameTransform, Point3, PoseWithCovariance, Quaternion, Span};
use crate::ellipse::{EllipseFit, MinimumVolumeEllipse};
use crate::error::{Error, Result};
use crate::person::Person;
use crate::relations::RelationSet;
use crate::spatial::SpatialModel;
use crate::tags;

/// Id of [`EMPTY_GROUP`], the largest `u32` spelled out
pub const EMPTY_GROUP_ID: &str = "4294967295";

/// "No group": no members, no relations, age 0
pub static EMPTY_GROUP: Lazy<Group> =
    Lazy::new(|| Group::id_only(EMPTY_GROUP_ID, 0, Vec::new(), RelationSet::new(), Point3::origin()));

/// Whether the member objects of a group have been resolved
#[derive(Clone, Debug, PartialEq)]
pub enum Members {
    Known(Vec<Person>),
    Unknown,
}

impl Members {
    /// An empty list means nothing was resolved
    pub fn from_vec(members: Vec<Person>) -> Self {
        if members.is_empty() {
            Members::Unknown
        } else {
            Members::Known(members)
        }
    }

    pub fn as_slice(&self) -> &[Person] {
        match self {
            Members::Known(members) => members,
            Members::Unknown => &[],
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Members::Known(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    id: String,
    /// How long the group has been tracked
    age: u64,
    members: Members,
    member_ids: Vec<String>,
    relations: RelationSet,
    center_of_gravity: Point3,
    model: SpatialModel,
}

impl Group {
    /// Builds the group and fits its spatial model right away
    pub fn new(
        id: impl Into<String>,
        age: u64,
        members: Vec<Person>,
        member_ids: Vec<String>,
        relations: RelationSet,
        center_of_gravity: Point3,
    ) -> Self {
        Self::unfitted(id, age, members, member_ids, relations, center_of_gravity)
            .fitted_with(&MinimumVolumeEllipse::default())
    }

    /// Group whose members are known by id only
    pub fn id_only(
        id: impl Into<String>,
        age: u64,
        member_ids: Vec<String>,
        relations: RelationSet,
        center_of_gravity: Point3,
    ) -> Self {
        Self::new(id, age, Vec::new(), member_ids, relations, center_of_gravity)
    }

    /// Reads age, member ids, center of gravity and relations from group tags.
    ///
    /// Missing tags fall back to: age 0, the ids of `members`, the mean member position,
    /// no relations.
    pub fn from_tags<N, V>(
        id: impl Into<String>,
        members: Vec<Person>,
        tag_names: &[N],
        tag_values: &[V],
    ) -> Result<Self>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let decoded = tags::decode(tag_names, tag_values)?.unwrap_or_default();
        let member_ids = decoded
            .group_track_ids
            .unwrap_or_else(|| members.iter().map(|p| p.id().to_owned()).collect());
        let center_of_gravity = decoded
            .group_center_of_gravity
            .or_else(|| SpatialModel::centroid(&members.iter().collect::<Vec<_>>()))
            .unwrap_or_else(Point3::origin);
        Ok(Self::new(
            id,
            decoded.group_age.unwrap_or(0),
            members,
            member_ids,
            decoded.social_relations.unwrap_or_default(),
            center_of_gravity,
        ))
    }

    /// Assembles the group with a placeholder model; callers fit it before handing it out
    pub(crate) fn unfitted(
        id: impl Into<String>,
        age: u64,
        members: Vec<Person>,
        member_ids: Vec<String>,
        relations: RelationSet,
        center_of_gravity: Point3,
    ) -> Self {
        Self {
            id: id.into(),
            age,
            members: Members::from_vec(members),
            member_ids,
            relations,
            center_of_gravity,
            model: SpatialModel::unknown(&center_of_gravity),
        }
    }

    pub fn fitted_with<F: EllipseFit + ?Sized>(mut self, fitter: &F) -> Self {
        self.recompute_spatial_model_with(fitter);
        self
    }

    /// Refits with the default [`MinimumVolumeEllipse`]; groups built with another fitter
    /// should use [`Group::recompute_spatial_model_with`]
    pub fn recompute_spatial_model(&mut self) {
        self.recompute_spatial_model_with(&MinimumVolumeEllipse::default());
    }

    pub fn recompute_spatial_model_with<F: EllipseFit + ?Sized>(&mut self, fitter: &F) {
        self.model = match &self.members {
            Members::Known(members) => SpatialModel::fit(members, &self.center_of_gravity, fitter),
            Members::Unknown => SpatialModel::unknown(&self.center_of_gravity),
        };
    }

    /// Same group with `members` attached; member ids stay untouched and the model is refitted
    /// with the default fitter
    pub fn with_members(self, members: Vec<Person>) -> Self {
        self.with_members_fitted(members, &MinimumVolumeEllipse::default())
    }

    pub fn with_members_fitted<F: EllipseFit + ?Sized>(mut self, members: Vec<Person>, fitter: &F) -> Self {
        self.members = Members::from_vec(members);
        self.fitted_with(fitter)
    }

    /// Moves members and center of gravity into another frame and refits the model with the
    /// default fitter
    pub fn transform(&mut self, transform: &FrameTransform) {
        self.transform_with(transform, &MinimumVolumeEllipse::default());
    }

    pub fn transform_with<F: EllipseFit + ?Sized>(&mut self, transform: &FrameTransform, fitter: &F) {
        if let Members::Known(members) = &mut self.members {
            members.iter_mut().for_each(|member| member.transform(transform));
        }
        self.center_of_gravity = transform.apply_to_point(&self.center_of_gravity);
        self.recompute_spatial_model_with(fitter);
    }

    /// Drops member ids missing from `known`, along with their member objects and relations.
    ///
    /// The center of gravity is re-derived from the surviving people only when ids were
    /// dropped.
    pub(crate) fn restrict_to<F: EllipseFit + ?Sized>(
        &mut self,
        known: &HashMap<&str, &Person>,
        fitter: &F,
    ) -> Result<()> {
        let before = self.member_ids.len();
        self.member_ids.retain(|id| known.contains_key(id.as_str()));
        let dropped = before - self.member_ids.len();

        let surviving: HashSet<&str> = self.member_ids.iter().map(String::as_str).collect();
        let dropped_relations = self.relations.retain_between(&surviving);
        if let Members::Known(members) = &mut self.members {
            members.retain(|p| surviving.contains(p.id()));
        }
        if self.members.as_slice().is_empty() {
            self.members = Members::Unknown;
        }
        trace!(
            "group `{}`: dropped {} member ids, {} relations",
            self.id,
            dropped,
            dropped_relations
        );

        if dropped > 0 {
            warn!("group `{}` referenced {} unknown people", self.id, dropped);
            let survivors = self
                .member_ids
                .iter()
                .filter_map(|id| known.get(id.as_str()).copied())
                .collect::<Vec<_>>();
            self.center_of_gravity = SpatialModel::centroid(&survivors).ok_or_else(|| Error::NoSurvivingMembers {
                group_id: self.id.clone(),
            })?;
        }
        self.recompute_spatial_model_with(fitter);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    /// Resolved member objects, empty for an id-only group
    pub fn members(&self) -> &[Person] {
        self.members.as_slice()
    }

    pub fn member_state(&self) -> &Members {
        &self.members
    }

    pub fn member_ids(&self) -> &[String] {
        &self.member_ids
    }

    /// Whether the member object is available, regardless of the id list
    pub fn has_member(&self, id: &str) -> bool {
        self.members().iter().any(|p| p.id() == id)
    }

    /// Whether `id` is listed as a member, resolved or not
    pub fn lists_member(&self, id: &str) -> bool {
        self.member_ids.iter().any(|member| member == id)
    }

    pub fn social_relations(&self) -> &RelationSet {
        &self.relations
    }

    /// `(other id, strength)` of every relation of `id`
    pub fn social_relations_of(&self, id: &str) -> Vec<(&str, f64)> {
        self.relations.of(id)
    }

    pub fn center_of_gravity(&self) -> Point3 {
        self.center_of_gravity
    }

    pub fn spatial_model(&self) -> &SpatialModel {
        &self.model
    }

    pub fn pose(&self) -> &PoseWithCovariance {
        &self.model.pose
    }

    pub fn position(&self) -> Point3 {
        self.model.pose.pose.position
    }

    pub fn orientation(&self) -> Quaternion {
        self.model.pose.pose.orientation
    }

    pub fn yaw(&self) -> f64 {
        self.model.pose.pose.yaw()
    }

    pub fn pose_cov(&self, index: CovIndex) -> f64 {
        self.model.pose.cov(index)
    }

    pub fn span(&self) -> Span {
        self.model.span
    }

    pub fn span_x(&self) -> f64 {
        self.model.span.x
    }

    pub fn span_y(&self) -> f64 {
        self.model.span.y
    }

    pub fn is_empty_group(&self) -> bool {
        self.id == EMPTY_GROUP_ID
    }
}

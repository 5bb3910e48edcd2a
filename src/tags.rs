//! # Tag codec
//!
//! Upstream producers attach free-form `tag_names[i] -> tags[i]` string pairs to every person.
//! The recognized vocabulary:
//!
//! | key                       | payload                                   |
//! |---------------------------|-------------------------------------------|
//! | `orientation`             | 4 floats, quaternion x y z w              |
//! | `pose_covariance`         | 36 floats, row-major 6x6                  |
//! | `twist_covariance`        | 36 floats, row-major 6x6                  |
//! | `occluded`, `matched`     | `true` / `True` / `1`, anything else false |
//! | `detection_id`            | unsigned integer                          |
//! | `track_age`, `group_age`  | unsigned integer                          |
//! | `group_id`                | string, kept verbatim                     |
//! | `group_track_ids`         | space separated ids                       |
//! | `group_center_of_gravity` | 3 floats                                  |
//! | `social_relations`        | `id id strength` triples, flattened       |
//!
//! A tag name resolves to a key when it equals the key, or when its last `/` or `:` separated
//! segment equals the key (`people/group_id`). Unknown names are ignored.

use std::{fmt, str::FromStr};

use itertools::Itertools;
use log::{trace, warn};
use nalgebra as na;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::data::{
    covariance_from_row_major, covariance_to_row_major, input::PersonRecord, Covariance, Point3, Quaternion,
};
use crate::error::{Error, Result};
use crate::group::Group;
use crate::person::Person;
use crate::relations::{Relation, RelationSet};

/// Separator between values inside one payload
pub const DELIMITER: char = ' ';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TagKey {
    Orientation,
    PoseCovariance,
    TwistCovariance,
    Occluded,
    Matched,
    DetectionId,
    TrackAge,
    GroupId,
    GroupAge,
    GroupTrackIds,
    GroupCenterOfGravity,
    SocialRelations,
}

impl TagKey {
    pub fn resolve(tag_name: &str) -> Option<Self> {
        let name = tag_name.trim();
        TagKey::from_str(name).ok().or_else(|| {
            name.rsplit(|c: char| c == '/' || c == ':')
                .next()
                .filter(|segment| segment.len() < name.len())
                .and_then(|segment| TagKey::from_str(segment).ok())
        })
    }
}

/// Numeric types a payload value may be narrowed into.
///
/// Values are always parsed as `f64` first.
pub trait FromTagValue: Sized {
    fn narrow(value: f64) -> Self;
}

impl FromTagValue for f64 {
    fn narrow(value: f64) -> Self {
        value
    }
}

impl FromTagValue for f32 {
    fn narrow(value: f64) -> Self {
        value as f32
    }
}

/// Warns when `value` lies outside `0..=max`; the cast that follows saturates
fn check_unsigned(value: f64, max: f64, type_name: &str) {
    if !(0.0..=max).contains(&value) {
        warn!("value {} does not fit a {}, saturating", value, type_name);
    }
}

impl FromTagValue for u32 {
    fn narrow(value: f64) -> Self {
        check_unsigned(value, u32::MAX as f64, "u32");
        value as u32
    }
}

impl FromTagValue for u64 {
    fn narrow(value: f64) -> Self {
        check_unsigned(value, u64::MAX as f64, "u64");
        value as u64
    }
}

/// Splits a payload on [`DELIMITER`], skipping blank tokens
pub fn tokens(payload: &str) -> impl Iterator<Item = &str> {
    payload.split(DELIMITER).map(str::trim).filter(|token| !token.is_empty())
}

fn parse_number(key: TagKey, token: &str) -> Result<f64> {
    token.parse::<f64>().map_err(|_| Error::malformed_token(key, token))
}

/// Parses every token of the payload; a non-numeric token fails the whole payload
pub fn parse_values<T: FromTagValue>(key: TagKey, payload: &str) -> Result<Vec<T>> {
    tokens(payload).map(|token| parse_number(key, token).map(T::narrow)).collect()
}

fn parse_scalar<T: FromTagValue>(key: TagKey, payload: &str) -> Result<Option<T>> {
    let mut values = parse_values::<T>(key, payload)?;
    match values.len() {
        0 => Ok(None),
        1 => Ok(values.pop()),
        n => {
            warn!("tag `{}` expects a single value, got {}", key, n);
            Ok(None)
        }
    }
}

fn parse_exact<const N: usize>(key: TagKey, payload: &str) -> Result<Option<[f64; N]>> {
    let values = parse_values::<f64>(key, payload)?;
    let count = values.len();
    match <[f64; N]>::try_from(values) {
        Ok(array) => Ok(Some(array)),
        Err(_) => {
            warn!("tag `{}` expects {} values, got {}", key, N, count);
            Ok(None)
        }
    }
}

pub fn parse_bool(payload: &str) -> bool {
    matches!(payload.trim(), "true" | "True" | "1")
}

fn parse_orientation(payload: &str) -> Result<Option<Quaternion>> {
    let [x, y, z, w] = match parse_exact::<4>(TagKey::Orientation, payload)? {
        Some(values) => values,
        None => return Ok(None),
    };
    let quat = na::Quaternion::new(w, x, y, z);
    if quat.norm() <= f64::EPSILON {
        warn!("ignoring zero-norm orientation {:?}", payload);
        return Ok(None);
    }
    Ok(Some(Quaternion::from_quaternion(quat)))
}

fn parse_covariance(key: TagKey, payload: &str) -> Result<Option<Covariance>> {
    let values = parse_values::<f64>(key, payload)?;
    let cov = covariance_from_row_major(&values);
    if cov.is_none() {
        warn!("tag `{}` expects 36 values, got {}", key, values.len());
    }
    Ok(cov)
}

fn parse_relations(payload: &str) -> Result<Option<RelationSet>> {
    let tokens = tokens(payload).collect_vec();
    if tokens.len() % 3 != 0 {
        warn!(
            "skipping social relations: {} tokens do not form (id, id, strength) triples",
            tokens.len()
        );
        return Ok(None);
    }
    let mut relations = RelationSet::new();
    for (a, b, strength) in tokens.into_iter().tuples() {
        let strength = parse_number(TagKey::SocialRelations, strength)?;
        relations.insert(Relation::new(a, b, strength));
    }
    Ok(Some(relations))
}

/// Everything a tag array may carry; `None` means the tag was absent or unusable
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedTags {
    pub orientation: Option<Quaternion>,
    pub pose_covariance: Option<Covariance>,
    pub twist_covariance: Option<Covariance>,
    pub occluded: Option<bool>,
    pub matched: Option<bool>,
    pub detection_id: Option<u32>,
    pub track_age: Option<u64>,
    pub group_id: Option<String>,
    pub group_age: Option<u64>,
    pub group_track_ids: Option<Vec<String>>,
    pub group_center_of_gravity: Option<Point3>,
    pub social_relations: Option<RelationSet>,
}

impl DecodedTags {
    fn apply(&mut self, key: TagKey, payload: &str) -> Result<()> {
        match key {
            TagKey::Orientation => {
                if let Some(orientation) = parse_orientation(payload)? {
                    self.orientation = Some(orientation);
                }
            }
            TagKey::PoseCovariance => {
                if let Some(cov) = parse_covariance(key, payload)? {
                    self.pose_covariance = Some(cov);
                }
            }
            TagKey::TwistCovariance => {
                if let Some(cov) = parse_covariance(key, payload)? {
                    self.twist_covariance = Some(cov);
                }
            }
            TagKey::Occluded => self.occluded = Some(parse_bool(payload)),
            TagKey::Matched => self.matched = Some(parse_bool(payload)),
            TagKey::DetectionId => {
                if let Some(id) = parse_scalar(key, payload)? {
                    self.detection_id = Some(id);
                }
            }
            TagKey::TrackAge => {
                if let Some(age) = parse_scalar(key, payload)? {
                    self.track_age = Some(age);
                }
            }
            TagKey::GroupId => self.group_id = Some(payload.to_owned()),
            TagKey::GroupAge => {
                if let Some(age) = parse_scalar(key, payload)? {
                    self.group_age = Some(age);
                }
            }
            TagKey::GroupTrackIds => {
                self.group_track_ids = Some(tokens(payload).map(str::to_owned).collect());
            }
            TagKey::GroupCenterOfGravity => {
                if let Some([x, y, z]) = parse_exact::<3>(key, payload)? {
                    self.group_center_of_gravity = Some(Point3::new(x, y, z));
                }
            }
            TagKey::SocialRelations => {
                if let Some(relations) = parse_relations(payload)? {
                    self.social_relations = Some(relations);
                }
            }
        }
        Ok(())
    }
}

/// Decodes parallel tag arrays.
///
/// Returns `Ok(None)` when nothing can be parsed: the arrays differ in length or are empty.
/// A malformed numeric token aborts the whole decode.
pub fn decode<N, V>(tag_names: &[N], tags: &[V]) -> Result<Option<DecodedTags>>
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    if tag_names.len() != tags.len() || tag_names.is_empty() {
        trace!(
            "nothing to decode: {} tag names, {} tags",
            tag_names.len(),
            tags.len()
        );
        return Ok(None);
    }

    let mut decoded = DecodedTags::default();
    for (name, payload) in tag_names.iter().zip(tags) {
        match TagKey::resolve(name.as_ref()) {
            Some(key) => decoded.apply(key, payload.as_ref())?,
            None => trace!("ignoring unknown tag `{}`", name.as_ref()),
        }
    }
    Ok(Some(decoded))
}

/// Ordered `(key, payload)` pairs ready to be split into parallel arrays
pub type TagList = Vec<(TagKey, String)>;

fn join_values<I>(values: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    values.into_iter().join(&DELIMITER.to_string())
}

/// Person-level tags, the inverse of what [`Person::from_record`] reads
pub fn encode_person(person: &Person) -> TagList {
    let orientation = person.orientation();
    vec![
        (TagKey::Orientation, join_values(orientation.coords.iter())),
        (TagKey::PoseCovariance, join_values(covariance_to_row_major(&person.pose().covariance))),
        (TagKey::TwistCovariance, join_values(covariance_to_row_major(&person.velocity().covariance))),
        (TagKey::Occluded, person.is_occluded().to_string()),
        (TagKey::Matched, person.is_matched().to_string()),
        (TagKey::DetectionId, person.detection_id().to_string()),
        (TagKey::TrackAge, person.track_age().to_string()),
        (TagKey::GroupId, person.group_id().to_owned()),
    ]
}

/// Group-level tags, the inverse of what [`Group::from_tags`] reads
pub fn encode_group(group: &Group) -> TagList {
    let cog = group.center_of_gravity();
    vec![
        (TagKey::GroupId, group.id().to_owned()),
        (TagKey::GroupAge, group.age().to_string()),
        (TagKey::GroupTrackIds, join_values(group.member_ids())),
        (TagKey::GroupCenterOfGravity, join_values([cog.x, cog.y, cog.z])),
        (
            TagKey::SocialRelations,
            join_values(
                group
                    .social_relations()
                    .iter()
                    .flat_map(|rel| [rel.a().to_owned(), rel.b().to_owned(), rel.strength().to_string()]),
            ),
        ),
    ]
}

pub fn split_tags(list: TagList) -> (Vec<String>, Vec<String>) {
    list.into_iter().map(|(key, value)| (key.to_string(), value)).unzip()
}

/// Rebuilds a raw record from a person and, optionally, the group it belongs to
pub fn encode_record(person: &Person, group: Option<&Group>) -> PersonRecord {
    let mut list = encode_person(person);
    if let Some(group) = group {
        // the group carries its own id
        list.retain(|(key, _)| *key != TagKey::GroupId);
        list.extend(encode_group(group));
    }
    let (tag_names, tags) = split_tags(list);
    PersonRecord {
        id: person.id().to_owned(),
        position: person.position(),
        velocity: person.velocity().pose.position.coords,
        reliability: person.reliability(),
        tag_names,
        tags,
    }
}

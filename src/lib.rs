//! # People and groups from tracked-person records
//!
//! Turns a flat list of [`PersonRecord`]s into typed [`Person`]s and [`Group`]s. Grouping is
//! driven entirely by the `group_id` tag of each person; every group of two or more people is
//! enriched with its social relations and a fitted spatial model.
//!
//! ```text
//! records ─► Person (tag codec) ─► partition by group id ─► merge relations ─► Group ─► cleanup
//! ```

pub mod config;
pub mod data;
pub mod ellipse;
pub mod error;
pub mod group;
pub mod person;
pub mod relations;
pub mod spatial;
pub mod tags;

use std::collections::HashMap;

use itertools::Itertools;
use log::{debug, trace};

pub use crate::config::{AggregationConfig, EllipseFitConfig};
pub use crate::data::input::PersonRecord;
pub use crate::error::{Error, Result};
pub use crate::group::{Group, Members, EMPTY_GROUP};
pub use crate::person::Person;
pub use crate::relations::{Relation, RelationSet};

use crate::data::Point3;
use crate::ellipse::MinimumVolumeEllipse;
use crate::spatial::SpatialModel;
use crate::tags::DecodedTags;

/// People sharing one group id, in first-encounter order
struct Bucket<'a> {
    group_id: &'a str,
    member_ids: Vec<String>,
    /// Index of each member's record, first occurrence of every id only
    records: Vec<usize>,
}

fn partition(people: &[Person]) -> Vec<Bucket<'_>> {
    let mut buckets: Vec<Bucket<'_>> = Vec::new();
    for (index, person) in people.iter().enumerate() {
        if !person.is_assigned_to_group() {
            continue;
        }
        let found = buckets.iter().position(|bucket| bucket.group_id == person.group_id());
        let position = match found {
            Some(position) => position,
            None => {
                buckets.push(Bucket {
                    group_id: person.group_id(),
                    member_ids: Vec::new(),
                    records: Vec::new(),
                });
                buckets.len() - 1
            }
        };

        let bucket = &mut buckets[position];
        if bucket.member_ids.iter().any(|id| id == person.id()) {
            trace!("person `{}` listed twice in group `{}`", person.id(), bucket.group_id);
            continue;
        }
        bucket.member_ids.push(person.id().to_owned());
        bucket.records.push(index);
    }
    buckets
}

/// Runs the aggregation pipeline with one configuration.
///
/// The ellipse settings only reach groups this aggregator builds or refits. To move such a
/// group later without losing them, pass [`Aggregator::fitter`] to [`Group::transform_with`].
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    config: AggregationConfig,
    fitter: MinimumVolumeEllipse,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fitter: MinimumVolumeEllipse::new(config.ellipse.clone()),
            config,
        })
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    pub fn fitter(&self) -> &MinimumVolumeEllipse {
        &self.fitter
    }

    /// Decodes every record and groups people by their declared group id.
    ///
    /// People keep the input order. Groups follow the order in which their id is first seen;
    /// ids shared by fewer than `min_group_size` people produce no group.
    pub fn create_from_people(&self, records: &[PersonRecord]) -> Result<(Vec<Person>, Vec<Group>)> {
        if records.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let decoded = records
            .iter()
            .map(|record| tags::decode(&record.tag_names, &record.tags))
            .collect::<Result<Vec<_>>>()?;
        let people = records
            .iter()
            .zip(&decoded)
            .map(|(record, tags)| Person::from_decoded(record, tags.as_ref()))
            .collect_vec();
        debug!("decoded {} people", people.len());

        let buckets = partition(&people);
        debug!("found {} group ids", buckets.len());

        let groups = buckets
            .into_iter()
            .filter(|bucket| {
                let keep = bucket.member_ids.len() >= self.config.min_group_size;
                if !keep {
                    debug!(
                        "group `{}` has {} member(s), not a group",
                        bucket.group_id,
                        bucket.member_ids.len()
                    );
                }
                keep
            })
            .map(|bucket| Self::materialize(bucket, &people, &decoded))
            .collect_vec();

        let groups = self.retain_known_members(groups, &people)?;
        debug!("built {} groups", groups.len());
        Ok((people, groups))
    }

    /// Collects members, merged relations and the representative record's group tags.
    ///
    /// The spatial model is left for the cleanup stage to fit.
    fn materialize(bucket: Bucket<'_>, people: &[Person], decoded: &[Option<DecodedTags>]) -> Group {
        let representative = bucket.records.first().and_then(|&index| decoded[index].as_ref());
        let members = bucket.records.iter().map(|&index| people[index].clone()).collect_vec();

        let mut relations = RelationSet::new();
        for &index in &bucket.records {
            if let Some(reported) = decoded[index].as_ref().and_then(|tags| tags.social_relations.clone()) {
                let added = relations.merge(reported);
                trace!("group `{}`: {} new relations from `{}`", bucket.group_id, added, people[index].id());
            }
        }

        let age = representative.and_then(|tags| tags.group_age).unwrap_or(0);
        let center_of_gravity = representative
            .and_then(|tags| tags.group_center_of_gravity)
            .or_else(|| SpatialModel::centroid(&members.iter().collect_vec()))
            .unwrap_or_else(Point3::origin);

        Group::unfitted(bucket.group_id, age, members, bucket.member_ids, relations, center_of_gravity)
    }

    /// Attaches person objects to groups by member id.
    ///
    /// Returns new groups; ids without a matching person are skipped and member ids stay as they
    /// were. The spatial model is refitted from the attached members.
    pub fn fill_groups_with_members(&self, groups: &[Group], people: &[Person]) -> Vec<Group> {
        groups
            .iter()
            .map(|group| {
                let members = group
                    .member_ids()
                    .iter()
                    .filter_map(|id| people.iter().find(|person| person.id() == id))
                    .cloned()
                    .collect_vec();
                trace!(
                    "group `{}`: resolved {} of {} members",
                    group.id(),
                    members.len(),
                    group.member_ids().len()
                );
                group.clone().with_members_fitted(members, &self.fitter)
            })
            .collect()
    }

    /// Drops member ids, member objects and relations that reference people absent from
    /// `people`, then refits every group.
    ///
    /// Fails with [`Error::NoSurvivingMembers`] when a group that lost ids has none left.
    pub fn retain_known_members(&self, groups: Vec<Group>, people: &[Person]) -> Result<Vec<Group>> {
        let mut known: HashMap<&str, &Person> = HashMap::with_capacity(people.len());
        for person in people {
            known.entry(person.id()).or_insert(person);
        }
        groups
            .into_iter()
            .map(|mut group| {
                group.restrict_to(&known, &self.fitter)?;
                Ok(group)
            })
            .collect()
    }
}

/// [`Aggregator::create_from_people`] with the default configuration
pub fn create_from_people(records: &[PersonRecord]) -> Result<(Vec<Person>, Vec<Group>)> {
    Aggregator::default().create_from_people(records)
}

/// [`Aggregator::fill_groups_with_members`] with the default configuration
pub fn fill_groups_with_members(groups: &[Group], people: &[Person]) -> Vec<Group> {
    Aggregator::default().fill_groups_with_members(groups, people)
}

/// [`Aggregator::retain_known_members`] with the default configuration
pub fn retain_known_members(groups: Vec<Group>, people: &[Person]) -> Result<Vec<Group>> {
    Aggregator::default().retain_known_members(groups, people)
}

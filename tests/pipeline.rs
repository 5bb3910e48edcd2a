mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::FRAC_PI_2;

use people_groups::{
    create_from_people,
    data::{FrameTransform, Point3, Quaternion, Vector3},
    retain_known_members, AggregationConfig, Aggregator, EllipseFitConfig, Error, Group, Person, PersonRecord,
    Relation,
};
use proptest::prelude::*;

use common::{init_logger, prepare_groups};

fn record(id: &str, x: f64, y: f64, group_id: Option<&str>) -> PersonRecord {
    let record = PersonRecord::new(id, Point3::new(x, y, 0.0), Vector3::zeros(), 0.9);
    match group_id {
        Some(group_id) => record.with_tag("group_id", group_id),
        None => record,
    }
}

#[test]
fn cleanup_drops_unknown_ids() -> () {
    init_logger();
    let (people, _) = create_from_people(&prepare_groups()).unwrap();
    let group = Group::id_only(
        "5",
        1,
        vec!["0".into(), "1".into(), "42".into()],
        [("0", "1", 0.5), ("0", "42", 0.7), ("42", "1", 0.2)]
            .into_iter()
            .map(Relation::from)
            .collect(),
        Point3::new(9.0, 9.0, 9.0),
    );
    let group = people_groups::fill_groups_with_members(&[group], &people).remove(0);
    assert_eq!(group.members().len(), 2);

    let cleaned = retain_known_members(vec![group], &people).unwrap().remove(0);
    assert_eq!(cleaned.member_ids(), ["0", "1"]);
    assert!(!cleaned.has_member("42"));
    assert_eq!(cleaned.social_relations().len(), 1);
    assert!(cleaned.social_relations_of("42").is_empty());
    // re-derived from the surviving people, all standing at (1, 2, 0)
    assert_eq!(cleaned.center_of_gravity(), Point3::new(1.0, 2.0, 0.0));
}

#[test]
fn cleanup_keeps_declared_center_when_nothing_is_dropped() -> () {
    let (people, _) = create_from_people(&prepare_groups()).unwrap();
    let group = Group::id_only("9", 1, vec!["4".into(), "5".into()], Default::default(), Point3::new(1.0, 2.5, 3.0));
    let cleaned = retain_known_members(vec![group], &people).unwrap().remove(0);
    assert_eq!(cleaned.center_of_gravity(), Point3::new(1.0, 2.5, 3.0));
}

#[test]
fn cleanup_without_survivors_is_an_error() -> () {
    let (people, _) = create_from_people(&prepare_groups()).unwrap();
    let group = Group::id_only("3", 1, vec!["41".into(), "42".into()], Default::default(), Point3::origin());
    let err = retain_known_members(vec![group], &people).unwrap_err();
    assert_eq!(err, Error::NoSurvivingMembers { group_id: "3".to_owned() });
}

#[test]
fn duplicate_records_count_once() -> () {
    let records = vec![
        record("a", 0.0, 0.0, Some("g")),
        record("a", 5.0, 5.0, Some("g")),
        record("b", 1.0, 0.0, Some("h")),
    ];
    let (people, groups) = create_from_people(&records).unwrap();
    assert_eq!(people.len(), 3);
    // "g" lists "a" once and is therefore a singleton
    assert!(groups.is_empty());
}

#[test]
fn center_of_gravity_falls_back_to_member_mean() -> () {
    let records = vec![record("a", 0.0, 0.0, Some("g")), record("b", 2.0, 4.0, Some("g"))];
    let (_, groups) = create_from_people(&records).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].center_of_gravity(), Point3::new(1.0, 2.0, 0.0));
    assert_eq!(groups[0].age(), 0);
}

#[test]
fn namespaced_group_tags_resolve() -> () {
    let records = vec![
        record("a", 0.0, 0.0, None).with_tag("people/group_id", "g"),
        record("b", 2.0, 0.0, None).with_tag("tracker:group_id", "g"),
    ];
    let (_, groups) = create_from_people(&records).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id(), "g");
}

#[test]
fn larger_minimum_group_size() -> () {
    let config: AggregationConfig = serde_json::from_str(r#"{ "min_group_size": 3 }"#).unwrap();
    let aggregator = Aggregator::new(config).unwrap();
    let (people, groups) = aggregator.create_from_people(&prepare_groups()).unwrap();
    assert_eq!(people.len(), 7);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id(), "5");
}

#[test]
fn invalid_config_is_rejected() -> () {
    let config = AggregationConfig {
        min_group_size: 1,
        ..AggregationConfig::default()
    };
    assert!(matches!(Aggregator::new(config), Err(Error::InvalidConfig(_))));
}

#[test]
fn transform_keeps_the_aggregator_fit_settings() -> () {
    // a thin triangle counts as a line under this ratio
    let config = AggregationConfig {
        ellipse: EllipseFitConfig {
            degeneracy_ratio: 0.5,
            ..EllipseFitConfig::default()
        },
        ..AggregationConfig::default()
    };
    let aggregator = Aggregator::new(config).unwrap();
    let records = vec![
        record("a", 0.0, 0.0, Some("g")),
        record("b", 4.0, 0.0, Some("g")),
        record("c", 2.0, 0.5, Some("g")),
    ];
    let (_, groups) = aggregator.create_from_people(&records).unwrap();
    assert_eq!(groups[0].span_y(), 0.0);

    let rotation = Quaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    let transform = FrameTransform::new(Vector3::new(1.0, 2.0, 0.0), rotation);
    let mut moved = groups[0].clone();
    moved.transform_with(&transform, aggregator.fitter());
    assert_eq!(moved.span_y(), 0.0);
    approx::assert_abs_diff_eq!(moved.span_x(), groups[0].span_x(), epsilon = 1e-9);

    // the default fitter sees a proper ellipse
    let mut refit = groups[0].clone();
    refit.transform(&transform);
    assert!(refit.span_y() > 0.0);
}

/// Up to twelve people, each either alone or in one of four groups
fn labelled_records() -> impl Strategy<Value = Vec<(Option<u8>, f64, f64)>> {
    prop::collection::vec((prop::option::of(0u8..4), -10.0..10.0f64, -10.0..10.0f64), 0..12)
}

fn build(labels: &[(Option<u8>, f64, f64)]) -> Vec<PersonRecord> {
    labels
        .iter()
        .enumerate()
        .map(|(index, (label, x, y))| {
            let group_id = label.map(|label| format!("g{}", label));
            record(&index.to_string(), *x, *y, group_id.as_deref())
        })
        .collect()
}

proptest! {
    #[test]
    fn every_shared_group_id_becomes_one_group(labels in labelled_records()) {
        let (people, groups) = create_from_people(&build(&labels)).unwrap();
        prop_assert_eq!(people.len(), labels.len());

        let mut expected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (index, (label, _, _)) in labels.iter().enumerate() {
            if let Some(label) = label {
                expected.entry(format!("g{}", label)).or_default().insert(index.to_string());
            }
        }
        expected.retain(|_, ids| ids.len() >= 2);

        let actual: BTreeMap<String, BTreeSet<String>> = groups
            .iter()
            .map(|group| (group.id().to_owned(), group.member_ids().iter().cloned().collect()))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn singletons_stay_people(labels in labelled_records()) {
        let (people, groups) = create_from_people(&build(&labels)).unwrap();
        for (index, (label, _, _)) in labels.iter().enumerate() {
            let id = index.to_string();
            prop_assert!(people.iter().any(|person: &Person| person.id() == id));
            let shared = labels.iter().filter(|(other, _, _)| other.is_some() && other == label).count();
            if label.is_some() && shared == 1 {
                prop_assert!(groups.iter().all(|group| !group.lists_member(&id)));
            }
        }
    }

    #[test]
    fn mutual_reports_give_one_relation(strength in 0.0..1.0f64, swap in any::<bool>()) {
        let payload = |a: &str, b: &str| format!("{} {} {}", a, b, strength);
        let (first, second) = if swap { ("b", "a") } else { ("a", "b") };
        let records = vec![
            record("a", 0.0, 0.0, Some("g")).with_tag("social_relations", payload("a", "b")),
            record("b", 1.0, 1.0, Some("g")).with_tag("social_relations", payload(first, second)),
        ];
        let (_, groups) = create_from_people(&records).unwrap();
        prop_assert_eq!(groups.len(), 1);
        let relations = groups[0].social_relations();
        prop_assert_eq!(relations.len(), 1);
        prop_assert_eq!(relations[0].strength(), strength);
        prop_assert_eq!(groups[0].social_relations_of("b"), vec![("a", strength)]);
    }
}

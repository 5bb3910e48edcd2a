#![allow(dead_code)]

use people_groups::{data::{Point3, Vector3}, PersonRecord};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const TAG_NAMES: [&str; 8] = [
    "orientation",
    "pose_covariance",
    "twist_covariance",
    "occluded",
    "matched",
    "detection_id",
    "track_age",
    "group_id",
];

pub const GROUP_TAG_NAMES: [&str; 4] = ["group_age", "group_track_ids", "group_center_of_gravity", "social_relations"];

/// Row-major 6x6 payload with the given diagonal and a symmetric XY term, six decimals per value
pub fn cov_array(xx: f64, xy: f64, yy: f64, zz: f64, rr: f64, pp: f64, yawyaw: f64) -> String {
    let mut cells = [0.0; 36];
    cells[0] = xx;
    cells[1] = xy;
    cells[6] = xy;
    cells[7] = yy;
    cells[14] = zz;
    cells[21] = rr;
    cells[28] = pp;
    cells[35] = yawyaw;
    cells.iter().map(|v| format!("{:.6}", v)).collect::<Vec<_>>().join(" ")
}

fn person_tags(
    orientation: &str,
    pose_cov: String,
    occluded: &str,
    matched: &str,
    detection_id: &str,
    track_age: &str,
    group_id: &str,
) -> Vec<String> {
    vec![
        orientation.to_owned(),
        pose_cov,
        cov_array(0.983, 0.982, 0.981, 99999.0, 99999.0, 99999.0, 99999.0),
        occluded.to_owned(),
        matched.to_owned(),
        detection_id.to_owned(),
        track_age.to_owned(),
        group_id.to_owned(),
    ]
}

/// One person, no group
pub fn prepare_single() -> Vec<PersonRecord> {
    let record = PersonRecord::new(
        "145",
        Point3::new(1.123, 2.321, 0.321),
        Vector3::new(0.123, 0.321, 0.123),
        0.987,
    )
    .with_tags(
        TAG_NAMES,
        person_tags(
            "0.0 0.0 0.247404 0.9689124",
            cov_array(0.987, 0.986, 0.985, 99999.0, 99999.0, 99999.0, 0.984),
            "true",
            "true",
            "369",
            "963",
            "",
        ),
    );
    vec![record]
}

fn group_member(id: &str, reliability: f64, person: Vec<String>, group: [&str; 4]) -> PersonRecord {
    let mut values = person;
    values.extend(group.iter().map(|v| v.to_string()));
    PersonRecord::new(id, Point3::new(1.0, 2.0, 0.0), Vector3::new(0.3, 0.3, 0.0), reliability)
        .with_tags(TAG_NAMES.iter().chain(GROUP_TAG_NAMES.iter()).copied(), values)
}

fn loner(id: &str, reliability: f64, person: Vec<String>) -> PersonRecord {
    PersonRecord::new(id, Point3::new(1.0, 2.0, 0.0), Vector3::new(0.3, 0.3, 0.0), reliability)
        .with_tags(TAG_NAMES, person)
}

/// Seven people: "0", "1", "8" in group "5", "4", "5" in group "9", "2" and "9" alone
pub fn prepare_groups() -> Vec<PersonRecord> {
    let small = || cov_array(0.03, 0.01, 0.02, 99999.0, 99999.0, 99999.0, 0.03);
    let large = || cov_array(0.13, 0.01, 0.12, 99999.0, 99999.0, 99999.0, 0.13);
    vec![
        group_member(
            "0",
            0.998,
            person_tags("0.0 0.0 0.0 1.0", small(), "1", "false", "123", "0987", "5"),
            ["159", "0 1 8", "9.0 8.5 7.0", "0 1 0.459 0 8 0.456 1 8 0.789"],
        ),
        group_member(
            "1",
            0.978,
            person_tags("0.0 0.0 -0.247404 0.9689124", small(), "true", "false", "321", "456", "5"),
            ["159", "1 8 0", "9.0 8.5 7.0", "1 8 0.789 0 1 0.459 0 8 0.456"],
        ),
        loner(
            "2",
            0.478,
            person_tags("0.0 0.0 0.0 1.0", large(), "true", "false", "322", "466", ""),
        ),
        group_member(
            "4",
            0.778,
            person_tags("0.0 0.0 0.247404 0.9689124", large(), "false", "false", "951", "159", "9"),
            ["147", "4 5", "1.0 2.5 3.0", "4 5 0.987"],
        ),
        group_member(
            "5",
            0.578,
            person_tags("0.0 0.0 0.0 1.0", large(), "true", "false", "941", "169", "9"),
            ["147", "5 4", "1.0 2.5 3.0", "4 5 0.987"],
        ),
        group_member(
            "8",
            0.378,
            person_tags("0.0 0.0 -0.247404 0.9689124", large(), "false", "true", "931", "179", "5"),
            ["159", "8 1 0", "9.0 8.5 7.0", "8 1 0.789 0 1 0.459 0 8 0.456"],
        ),
        loner(
            "9",
            0.278,
            person_tags("0.0 0.0 0.0 1.0", large(), "true", "true", "831", "279", ""),
        ),
    ]
}

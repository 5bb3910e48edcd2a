//! # Raw input records
//!
//! One record per tracked person, as produced by the upstream perception stack.

use super::{Point3, Vector3};

/// A single tracked person before decoding.
///
/// `tag_names` and `tags` are parallel arrays; see [`crate::tags`] for the vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonRecord {
    /// Opaque track label, numeric-looking but never parsed
    pub id: String,
    pub position: Point3,
    pub velocity: Vector3,
    /// Accuracy of pose and velocity, passed through unchanged
    pub reliability: f64,
    pub tag_names: Vec<String>,
    pub tags: Vec<String>,
}

impl Default for PersonRecord {
    fn default() -> Self {
        Self::new(String::new(), Point3::origin(), Vector3::zeros(), 0.0)
    }
}

impl PersonRecord {
    pub fn new(id: impl Into<String>, position: Point3, velocity: Vector3, reliability: f64) -> Self {
        Self {
            id: id.into(),
            position,
            velocity,
            reliability,
            tag_names: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Appends one tag name/value pair
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tag_names.push(name.into());
        self.tags.push(value.into());
        self
    }

    pub fn with_tags<N, V>(mut self, names: N, values: V) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        self.tag_names = names.into_iter().map(Into::into).collect();
        self.tags = values.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_sits_at_the_origin() {
        let record = PersonRecord::default();
        assert_eq!(record.position, Point3::origin());
        assert_eq!(record.velocity, Vector3::zeros());
        assert!(record.id.is_empty());
        assert!(record.tag_names.is_empty() && record.tags.is_empty());
    }

    #[test]
    fn tags_stay_parallel() {
        let record = PersonRecord::default().with_tag("group_id", "5").with_tag("group_age", "3");
        assert_eq!(record.tag_names, vec!["group_id", "group_age"]);
        assert_eq!(record.tags, vec!["5", "3"]);
    }
}

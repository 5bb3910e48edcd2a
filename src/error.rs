use thiserror::Error;

use crate::tags::TagKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A numeric tag carried a token that does not parse as a number
    #[error("malformed numeric token {token:?} in tag `{key}`")]
    MalformedToken { key: TagKey, token: String },

    /// Cleanup left a group with member ids but none of them resolvable
    #[error("group `{group_id}` has no members left after cross-referencing people")]
    NoSurvivingMembers { group_id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn malformed_token<S: Into<String>>(key: TagKey, token: S) -> Self {
        Self::MalformedToken { key, token: token.into() }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

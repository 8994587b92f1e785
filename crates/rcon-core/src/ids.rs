use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlates a reply frame to the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(
    /// Numeric identifier carried in the `Identifier` field.
    pub i64,
);

impl RequestId {
    /// Channel used by the server for chat broadcasts.
    pub const BROADCAST: Self = Self(-1);
    /// Channel used by the server for generic log broadcasts.
    pub const GENERIC: Self = Self(0);
    /// First identifier handed to a caller request.
    pub const FIRST: Self = Self(1);

    /// Returns true for identifiers that denote a broadcast channel.
    pub fn is_reserved(self) -> bool {
        self == Self::BROADCAST || self == Self::GENERIC
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

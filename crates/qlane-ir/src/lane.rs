//! Lane, barrier and block identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an execution lane (a physical or logical channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(pub u32);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

impl From<u32> for LaneId {
    fn from(id: u32) -> Self {
        LaneId(id)
    }
}

/// Stable identifier of a barrier, shared by every lane taking part in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarrierId(pub u32);

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Identifier of a concurrent block, assigned upstream in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(LaneId(3).to_string(), "ch3");
        assert_eq!(BarrierId(7).to_string(), "b7");
        assert_eq!(BlockId(1).to_string(), "block1");
    }

    #[test]
    fn test_lane_ordering() {
        let mut lanes = vec![LaneId(2), LaneId(0), LaneId(1)];
        lanes.sort();
        assert_eq!(lanes, vec![LaneId(0), LaneId(1), LaneId(2)]);
    }
}

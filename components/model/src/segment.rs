use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{CollectionId, NodeId, PartitionId, SegmentId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    /// Still accepting inserts on its channel.
    Growing,

    /// Flushed and immutable.
    #[default]
    Sealed,
}

/// Segment description as recovered from the data service. This is what a target is made of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SegmentInfo {
    pub id: SegmentId,
    pub collection_id: CollectionId,
    pub partition_id: PartitionId,
    pub channel: String,

    #[serde(default)]
    pub num_of_rows: i64,
}

impl SegmentInfo {
    pub fn new<C>(
        collection_id: CollectionId,
        partition_id: PartitionId,
        id: SegmentId,
        channel: C,
    ) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            id,
            collection_id,
            partition_id,
            channel: channel.as_ref().to_owned(),
            num_of_rows: 0,
        }
    }
}

/// A segment as reported by the query node hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Segment {
    pub id: SegmentId,
    pub collection_id: CollectionId,
    pub partition_id: PartitionId,

    /// Query node hosting this copy.
    pub node: NodeId,

    /// Bumped each time the segment is (re)assigned to a node, so that the latest copy wins.
    #[serde(default)]
    pub version: i64,

    pub channel: String,

    #[serde(default)]
    pub kind: SegmentKind,

    /// Position of the first record in the segment. Only meaningful for growing segments.
    #[serde(default)]
    pub start_position: Timestamp,

    #[serde(default)]
    pub num_of_rows: i64,
}

impl Segment {
    pub fn sealed<C>(
        collection_id: CollectionId,
        partition_id: PartitionId,
        id: SegmentId,
        node: NodeId,
        version: i64,
        channel: C,
    ) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            id,
            collection_id,
            partition_id,
            node,
            version,
            channel: channel.as_ref().to_owned(),
            kind: SegmentKind::Sealed,
            start_position: 0,
            num_of_rows: 0,
        }
    }

    pub fn growing<C>(
        collection_id: CollectionId,
        partition_id: PartitionId,
        id: SegmentId,
        node: NodeId,
        start_position: Timestamp,
        channel: C,
    ) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            kind: SegmentKind::Growing,
            start_position,
            ..Self::sealed(collection_id, partition_id, id, node, 0, channel)
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.kind == SegmentKind::Sealed
    }

    pub fn is_growing(&self) -> bool {
        self.kind == SegmentKind::Growing
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{collection={}, partition={}, segment={}}}@node-{}[v{}, {}, {}]",
            self.collection_id,
            self.partition_id,
            self.id,
            self.node,
            self.version,
            self.channel,
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growing() {
        let segment = Segment::growing(1, 2, 3, 4, 10, "ch-0");
        assert!(segment.is_growing());
        assert!(!segment.is_sealed());
        assert_eq!(10, segment.start_position);
        assert_eq!(4, segment.node);
        assert_eq!(
            "{collection=1, partition=2, segment=3}@node-4[v0, ch-0, Growing]",
            segment.to_string()
        );
    }

    #[test]
    fn test_yaml() -> Result<(), serde_yaml::Error> {
        let yaml = r#"
id: 7
collection-id: 1
partition-id: 1
node: 2
channel: ch-1
"#;
        let segment: Segment = serde_yaml::from_str(yaml)?;
        assert!(segment.is_sealed());
        assert_eq!(0, segment.version);
        assert_eq!("ch-1", segment.channel);
        Ok(())
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CollectionId, NodeId, Segment, SegmentId, TargetVersion};

/// Where a sealed segment is served from, as acknowledged by a shard leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDist {
    pub node: NodeId,
}

impl SegmentDist {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

/// View of a channel reported by the node that leads (delegates) it.
///
/// The leader routes queries of the channel to the sealed segments listed in `segments` and serves
/// `growing_segments` itself. `target_version` is the latest collection target the leader has
/// acknowledged, so anything decided against a newer target may not be visible to it yet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LeaderView {
    /// Node id of the leader.
    pub node: NodeId,

    pub collection_id: CollectionId,

    pub channel: String,

    /// Distribution version of the report; the higher one wins among leaders of a channel.
    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub target_version: TargetVersion,

    #[serde(default)]
    pub serviceable: bool,

    #[serde(default)]
    pub segments: BTreeMap<SegmentId, SegmentDist>,

    #[serde(default)]
    pub growing_segments: BTreeMap<SegmentId, Segment>,
}

impl LeaderView {
    pub fn new<C>(node: NodeId, collection_id: CollectionId, channel: C) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            node,
            collection_id,
            channel: channel.as_ref().to_owned(),
            ..Default::default()
        }
    }

    pub fn with_serviceable(mut self, serviceable: bool) -> Self {
        self.serviceable = serviceable;
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn with_target_version(mut self, target_version: TargetVersion) -> Self {
        self.target_version = target_version;
        self
    }

    pub fn with_segment(mut self, segment_id: SegmentId, node: NodeId) -> Self {
        self.segments.insert(segment_id, SegmentDist::new(node));
        self
    }

    pub fn with_growing(mut self, segment: Segment) -> Self {
        self.growing_segments.insert(segment.id, segment);
        self
    }

    /// Test if the leader routes the given sealed segment to `node`.
    pub fn serves(&self, segment_id: SegmentId, node: NodeId) -> bool {
        self.segments
            .get(&segment_id)
            .map(|dist| dist.node == node)
            .unwrap_or(false)
    }

    /// Test if the leader knows the segment at all, either sealed or growing.
    pub fn knows(&self, segment_id: SegmentId) -> bool {
        self.segments.contains_key(&segment_id) || self.growing_segments.contains_key(&segment_id)
    }
}

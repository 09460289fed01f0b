use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{CollectionId, PartitionId, SegmentId, SegmentInfo, TargetVersion, Timestamp};

/// Desired state of one channel (virtual channel) of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelTarget {
    pub collection_id: CollectionId,

    pub channel: String,

    /// Checkpoint of the channel. Data before this position has been flushed into sealed segments.
    #[serde(default)]
    pub seek_position: Timestamp,

    /// Segments dropped by compaction. Any growing copy of them is stale.
    #[serde(default)]
    pub dropped_segment_ids: BTreeSet<SegmentId>,

    /// Segments not flushed yet. They are served as growing segments by the channel leader.
    #[serde(default)]
    pub unflushed_segment_ids: BTreeSet<SegmentId>,
}

impl ChannelTarget {
    pub fn new<C>(collection_id: CollectionId, channel: C) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            collection_id,
            channel: channel.as_ref().to_owned(),
            ..Default::default()
        }
    }

    pub fn with_seek_position(mut self, position: Timestamp) -> Self {
        self.seek_position = position;
        self
    }

    pub fn with_dropped(mut self, segment_ids: &[SegmentId]) -> Self {
        self.dropped_segment_ids.extend(segment_ids);
        self
    }

    pub fn with_unflushed(mut self, segment_ids: &[SegmentId]) -> Self {
        self.unflushed_segment_ids.extend(segment_ids);
        self
    }
}

/// Recovery information of a collection as returned by the data service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecoveryInfo {
    #[serde(default)]
    pub channels: Vec<ChannelTarget>,

    #[serde(default)]
    pub segments: Vec<SegmentInfo>,
}

/// One generation of the desired state of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionTarget {
    version: TargetVersion,
    segments: BTreeMap<SegmentId, SegmentInfo>,
    channels: BTreeMap<String, ChannelTarget>,
    partitions: BTreeSet<PartitionId>,
}

impl CollectionTarget {
    pub fn new(
        version: TargetVersion,
        segments: BTreeMap<SegmentId, SegmentInfo>,
        channels: BTreeMap<String, ChannelTarget>,
        partitions: BTreeSet<PartitionId>,
    ) -> Self {
        Self {
            version,
            segments,
            channels,
            partitions,
        }
    }

    pub fn version(&self) -> TargetVersion {
        self.version
    }

    pub fn segments(&self) -> &BTreeMap<SegmentId, SegmentInfo> {
        &self.segments
    }

    pub fn channels(&self) -> &BTreeMap<String, ChannelTarget> {
        &self.channels
    }

    pub fn partitions(&self) -> &BTreeSet<PartitionId> {
        &self.partitions
    }

    pub fn segment(&self, segment_id: SegmentId) -> Option<&SegmentInfo> {
        self.segments.get(&segment_id)
    }

    pub fn channel(&self, channel: &str) -> Option<&ChannelTarget> {
        self.channels.get(channel)
    }

    /// Sealed segments of the target that belong to the given channel.
    pub fn segments_of_channel<'a>(
        &'a self,
        channel: &'a str,
    ) -> impl Iterator<Item = &'a SegmentInfo> + 'a {
        self.segments.values().filter(move |s| s.channel == channel)
    }

    /// Unflushed segments of all channels, which are expected to be served as growing segments.
    pub fn growing_segment_ids(&self) -> BTreeSet<SegmentId> {
        self.channels
            .values()
            .flat_map(|ch| ch.unflushed_segment_ids.iter().copied())
            .collect()
    }

    /// Drop the given partitions and their segments, keeping the version.
    pub fn without_partitions(&self, partitions: &[PartitionId]) -> Self {
        Self {
            version: self.version,
            segments: self
                .segments
                .iter()
                .filter(|(_, s)| !partitions.contains(&s.partition_id))
                .map(|(id, s)| (*id, s.clone()))
                .collect(),
            channels: self.channels.clone(),
            partitions: self
                .partitions
                .iter()
                .filter(|p| !partitions.contains(p))
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> CollectionTarget {
        let segments = [
            SegmentInfo::new(1, 10, 1, "ch-0"),
            SegmentInfo::new(1, 10, 2, "ch-1"),
            SegmentInfo::new(1, 11, 3, "ch-0"),
        ]
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
        let channels = [
            ChannelTarget::new(1, "ch-0").with_unflushed(&[4, 5]),
            ChannelTarget::new(1, "ch-1").with_unflushed(&[6]),
        ]
        .into_iter()
        .map(|c| (c.channel.clone(), c))
        .collect();
        CollectionTarget::new(3, segments, channels, [10, 11].into_iter().collect())
    }

    #[test]
    fn test_segments_of_channel() {
        let target = target();
        let ids: Vec<_> = target.segments_of_channel("ch-0").map(|s| s.id).collect();
        assert_eq!(vec![1, 3], ids);
        assert_eq!(0, target.segments_of_channel("ch-9").count());
        assert_eq!(
            vec![4, 5, 6],
            target.growing_segment_ids().into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_without_partitions() {
        let target = target().without_partitions(&[11]);
        assert_eq!(3, target.version());
        assert!(target.segment(3).is_none());
        assert!(target.segment(1).is_some());
        assert_eq!(1, target.partitions().len());
        assert_eq!(2, target.channels().len());
    }
}

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::{info, warn};
use model::{
    ChannelTarget, CollectionId, CollectionTarget, PartitionId, SegmentId, SegmentInfo,
    TargetVersion, INITIAL_TARGET_VERSION,
};
use parking_lot::RwLock;

use crate::{broker::Broker, error::MetaError, Meta};

/// Which generation of the target to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    /// The target query nodes should be serving now.
    Current,

    /// The target being prepared; promoted to current once it is fully loaded.
    Next,

    /// Current target, or next target if there is no current one.
    CurrentFirst,

    /// Next target, or current target if there is no next one.
    NextFirst,
}

#[derive(Debug, Default, Clone)]
struct Targets {
    current: BTreeMap<CollectionId, Arc<CollectionTarget>>,
    next: BTreeMap<CollectionId, Arc<CollectionTarget>>,
}

impl Targets {
    fn get(&self, collection_id: CollectionId, scope: TargetScope) -> Option<&Arc<CollectionTarget>> {
        match scope {
            TargetScope::Current => self.current.get(&collection_id),
            TargetScope::Next => self.next.get(&collection_id),
            TargetScope::CurrentFirst => self
                .current
                .get(&collection_id)
                .or_else(|| self.next.get(&collection_id)),
            TargetScope::NextFirst => self
                .next
                .get(&collection_id)
                .or_else(|| self.current.get(&collection_id)),
        }
    }
}

/// Versioned desired state of every loaded collection.
///
/// The next target is refreshed from the data service by the target observer; once query nodes have
/// loaded it, the observer promotes it to current. Each refresh gets a fresh, strictly increasing
/// version that shard leaders acknowledge when they switch to it.
pub struct TargetManager {
    broker: Arc<dyn Broker + Send + Sync>,
    meta: Arc<Meta>,
    targets: RwLock<Arc<Targets>>,
    version: AtomicI64,
}

impl TargetManager {
    pub fn new(broker: Arc<dyn Broker + Send + Sync>, meta: Arc<Meta>) -> Self {
        Self {
            broker,
            meta,
            targets: RwLock::new(Arc::new(Targets::default())),
            version: AtomicI64::new(INITIAL_TARGET_VERSION),
        }
    }

    fn snapshot(&self) -> Arc<Targets> {
        Arc::clone(&*self.targets.read())
    }

    fn next_version(&self) -> TargetVersion {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Pull the recovery info of the collection and install it as the next target.
    ///
    /// Only segments of partitions loaded in metadata make it into the target. On failure, the
    /// previous next target, if any, stays in place.
    pub fn update_collection_next_target(&self, collection_id: CollectionId) -> Result<(), MetaError> {
        if !self.meta.collections.exists(collection_id) {
            return Err(MetaError::CollectionNotFound(collection_id));
        }

        let recovery = self.broker.get_recovery_info(collection_id).map_err(|e| {
            warn!(
                "Failed to refresh next target of collection={}: {}",
                collection_id, e
            );
            e
        })?;

        let partitions: BTreeSet<PartitionId> = self
            .meta
            .collections
            .get_partitions_by_collection(collection_id)
            .into_iter()
            .map(|p| p.id)
            .collect();

        let segments: BTreeMap<SegmentId, SegmentInfo> = recovery
            .segments
            .into_iter()
            .filter(|s| partitions.contains(&s.partition_id))
            .map(|s| (s.id, s))
            .collect();

        let channels: BTreeMap<String, ChannelTarget> = recovery
            .channels
            .into_iter()
            .map(|ch| (ch.channel.clone(), ch))
            .collect();

        let version = self.next_version();
        info!(
            "Update next target of collection={}, version={}, segments={}, channels={:?}",
            collection_id,
            version,
            segments.len(),
            channels.keys().collect::<Vec<_>>()
        );
        let target = CollectionTarget::new(version, segments, channels, partitions);

        let mut guard = self.targets.write();
        Arc::make_mut(&mut *guard)
            .next
            .insert(collection_id, Arc::new(target));
        Ok(())
    }

    /// Promote the next target of the collection to current.
    ///
    /// Returns `false` if there is no next target to promote.
    pub fn update_collection_current_target(&self, collection_id: CollectionId) -> bool {
        let mut guard = self.targets.write();
        let targets = Arc::make_mut(&mut *guard);
        match targets.next.remove(&collection_id) {
            Some(next) => {
                info!(
                    "Promote next target of collection={} to current, version={}",
                    collection_id,
                    next.version()
                );
                targets.current.insert(collection_id, next);
                true
            }
            None => false,
        }
    }

    pub fn remove_collection(&self, collection_id: CollectionId) {
        let mut guard = self.targets.write();
        let targets = Arc::make_mut(&mut *guard);
        targets.current.remove(&collection_id);
        targets.next.remove(&collection_id);
        info!("Remove targets of collection={}", collection_id);
    }

    /// Drop released partitions from both generations of the collection target.
    pub fn remove_partitions(&self, collection_id: CollectionId, partitions: &[PartitionId]) {
        let mut guard = self.targets.write();
        let targets = Arc::make_mut(&mut *guard);
        for generation in [&mut targets.current, &mut targets.next] {
            if let Some(target) = generation.get_mut(&collection_id) {
                *target = Arc::new(target.without_partitions(partitions));
            }
        }
    }

    /// One generation of the collection target as a whole.
    pub fn get_collection_target(
        &self,
        collection_id: CollectionId,
        scope: TargetScope,
    ) -> Option<Arc<CollectionTarget>> {
        self.snapshot().get(collection_id, scope).cloned()
    }

    pub fn get_sealed_segments_by_collection(
        &self,
        collection_id: CollectionId,
        scope: TargetScope,
    ) -> BTreeMap<SegmentId, SegmentInfo> {
        self.get_collection_target(collection_id, scope)
            .map(|t| t.segments().clone())
            .unwrap_or_default()
    }

    /// Sealed segments the channel is expected to serve.
    pub fn get_sealed_segments_by_channel(
        &self,
        collection_id: CollectionId,
        channel: &str,
        scope: TargetScope,
    ) -> BTreeMap<SegmentId, SegmentInfo> {
        self.get_collection_target(collection_id, scope)
            .map(|t| {
                t.segments_of_channel(channel)
                    .map(|s| (s.id, s.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_sealed_segment(
        &self,
        collection_id: CollectionId,
        segment_id: SegmentId,
        scope: TargetScope,
    ) -> Option<SegmentInfo> {
        self.get_collection_target(collection_id, scope)
            .and_then(|t| t.segment(segment_id).cloned())
    }

    pub fn get_growing_segments_by_collection(
        &self,
        collection_id: CollectionId,
        scope: TargetScope,
    ) -> BTreeSet<SegmentId> {
        self.get_collection_target(collection_id, scope)
            .map(|t| t.growing_segment_ids())
            .unwrap_or_default()
    }

    pub fn get_dm_channels_by_collection(
        &self,
        collection_id: CollectionId,
        scope: TargetScope,
    ) -> BTreeMap<String, ChannelTarget> {
        self.get_collection_target(collection_id, scope)
            .map(|t| t.channels().clone())
            .unwrap_or_default()
    }

    pub fn get_dm_channel(
        &self,
        collection_id: CollectionId,
        channel: &str,
        scope: TargetScope,
    ) -> Option<ChannelTarget> {
        self.get_collection_target(collection_id, scope)
            .and_then(|t| t.channel(channel).cloned())
    }

    /// Version of the requested generation, or [`INITIAL_TARGET_VERSION`] if there is none.
    pub fn get_collection_target_version(
        &self,
        collection_id: CollectionId,
        scope: TargetScope,
    ) -> TargetVersion {
        self.get_collection_target(collection_id, scope)
            .map(|t| t.version())
            .unwrap_or(INITIAL_TARGET_VERSION)
    }

    pub fn is_next_target_exist(&self, collection_id: CollectionId) -> bool {
        self.snapshot().next.contains_key(&collection_id)
    }

    pub fn is_current_target_exist(&self, collection_id: CollectionId) -> bool {
        self.snapshot().current.contains_key(&collection_id)
    }
}

impl std::fmt::Debug for TargetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let targets = self.snapshot();
        f.debug_struct("TargetManager")
            .field("current", &targets.current.keys().collect::<Vec<_>>())
            .field("next", &targets.next.keys().collect::<Vec<_>>())
            .field("version", &self.version.load(Ordering::Relaxed))
            .finish()
    }
}

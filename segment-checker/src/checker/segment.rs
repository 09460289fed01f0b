use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use itertools::Itertools;
use log::{debug, info, trace, warn};
use meta::TargetScope;
use model::{
    CollectionId, CollectionTarget, DataScope, LeaderView, NodeId, Replica, ReplicaId, Segment,
    SegmentAction, SegmentId, SegmentInfo, SegmentTask, TargetVersion, TaskPriority,
    INITIAL_TARGET_VERSION,
};

use super::{Checker, CheckerType};
use crate::context::CheckerContext;

const REASON_LACK: &str = "lacks of segment";
const REASON_NOT_IN_TARGET: &str = "segment not exists in target";
const REASON_REDUNDANT: &str = "redundancies of segment";
const REASON_STREAMING_NOT_IN_TARGET: &str = "streaming segment not exists in target";
const REASON_DIRTY: &str = "dirty segment";

/// Reduce actions already emitted in the current pass.
type Reduced = HashSet<(SegmentId, NodeId, DataScope)>;

/// Both generations of a collection target, read once per collection and pass.
struct Targets {
    current: Option<Arc<CollectionTarget>>,
    next: Option<Arc<CollectionTarget>>,
}

impl Targets {
    fn current_version(&self) -> TargetVersion {
        self.current
            .as_ref()
            .map(|t| t.version())
            .unwrap_or(INITIAL_TARGET_VERSION)
    }

    fn contains_sealed(&self, segment_id: SegmentId) -> bool {
        [&self.current, &self.next]
            .into_iter()
            .flatten()
            .any(|t| t.segment(segment_id).is_some())
    }

    /// Sealed segments that should be loaded: those of the next target, then those only the
    /// current target still has.
    fn sealed_segments(&self) -> BTreeMap<SegmentId, &SegmentInfo> {
        let mut segments = BTreeMap::new();
        for target in [&self.next, &self.current].into_iter().flatten() {
            for (id, segment) in target.segments() {
                segments.entry(*id).or_insert(segment);
            }
        }
        segments
    }

    fn unflushed_segment_ids(&self) -> BTreeSet<SegmentId> {
        [&self.current, &self.next]
            .into_iter()
            .flatten()
            .flat_map(|t| t.growing_segment_ids())
            .collect()
    }
}

/// Leader of `channel` if it may be trusted to have released a segment from its routing table.
fn serving_leader<'a>(
    leaders: &'a BTreeMap<String, LeaderView>,
    channel: &str,
    current_version: TargetVersion,
) -> Option<&'a LeaderView> {
    let leader = match leaders.get(channel) {
        Some(leader) => leader,
        None => {
            trace!("No leader serves channel {}", channel);
            return None;
        }
    };

    if !leader.serviceable {
        trace!(
            "Leader of channel {} on node={} is not serviceable yet",
            channel,
            leader.node
        );
        return None;
    }

    if leader.target_version < current_version {
        trace!(
            "Leader of channel {} on node={} has not caught up with target version {}, acknowledged {}",
            channel,
            leader.node,
            current_version,
            leader.target_version
        );
        return None;
    }
    Some(leader)
}

/// Keeps the segments hosted by every replica in line with the collection target.
///
/// Each pass emits load tasks for segments the replica lacks and release tasks for segments that
/// are no longer in the target, duplicated on several nodes, or left behind by released
/// collections. The checker only reads snapshots; executing the tasks is up to the scheduler.
pub struct SegmentChecker {
    ctx: CheckerContext,
    active: AtomicBool,
}

impl SegmentChecker {
    pub fn new(ctx: CheckerContext) -> Self {
        let active = ctx.config.checker.active_on_start;
        Self {
            ctx,
            active: AtomicBool::new(active),
        }
    }

    fn check_collection(
        &self,
        collection_id: CollectionId,
        tasks: &mut Vec<SegmentTask>,
        reduced: &mut Reduced,
    ) {
        let targets = Targets {
            current: self
                .ctx
                .targets
                .get_collection_target(collection_id, TargetScope::Current),
            next: self
                .ctx
                .targets
                .get_collection_target(collection_id, TargetScope::Next),
        };

        if targets.current.is_none() && targets.next.is_none() {
            trace!("Collection={} has no target yet", collection_id);
            return;
        }

        for replica in self.ctx.meta.replicas.get_by_collection(collection_id) {
            self.check_replica(&replica, &targets, tasks, reduced);
        }
    }

    fn check_replica(
        &self,
        replica: &Replica,
        targets: &Targets,
        tasks: &mut Vec<SegmentTask>,
        reduced: &mut Reduced,
    ) {
        let dist: Vec<Segment> = self
            .ctx
            .dist
            .segment_dist
            .get_by_replica(replica)
            .into_iter()
            .filter(|s| s.is_sealed() && self.partition_loaded(s))
            .sorted_by_key(|s| (s.id, s.node))
            .collect();
        let leaders = self.ctx.dist.leader_view.get_leader_views_by_replica(replica);

        if let Some(task) = self.load_task(replica, targets, &dist) {
            tasks.push(task);
        }
        self.release_sealed(replica, targets, &dist, &leaders, tasks, reduced);
        self.release_redundant(replica, targets, &dist, &leaders, tasks, reduced);
        self.release_growing(replica, targets, &leaders, tasks, reduced);
    }

    fn partition_loaded(&self, segment: &Segment) -> bool {
        self.ctx
            .meta
            .collections
            .get_partition(segment.partition_id)
            .map(|p| p.collection_id == segment.collection_id)
            .unwrap_or(false)
    }

    /// The replica a reported segment belongs to, if its collection, partition and replica are
    /// all still known.
    fn resolve_replica(&self, segment: &Segment) -> Option<Replica> {
        if !self.ctx.meta.collections.exists(segment.collection_id) || !self.partition_loaded(segment)
        {
            return None;
        }
        self.ctx
            .meta
            .replicas
            .get_by_collection_and_node(segment.collection_id, segment.node)
    }

    /// Bundle one grow action per segment the replica lacks into a single task.
    fn load_task(
        &self,
        replica: &Replica,
        targets: &Targets,
        dist: &[Segment],
    ) -> Option<SegmentTask> {
        let hosted: HashSet<SegmentId> = dist.iter().map(|s| s.id).collect();
        let mut lacks: BTreeMap<&str, Vec<SegmentInfo>> = BTreeMap::new();
        for segment in targets.sealed_segments().into_values() {
            if !hosted.contains(&segment.id) {
                lacks
                    .entry(segment.channel.as_str())
                    .or_default()
                    .push(segment.clone());
            }
        }

        let mut actions = vec![];
        for (channel, segments) in lacks {
            let leader = match self
                .ctx
                .dist
                .leader_view
                .get_latest_shard_leader(replica, channel)
            {
                Some(leader) => leader,
                None => {
                    debug!(
                        "Replica={} has not subscribed channel {}, skip loading {} segment(s)",
                        replica.id,
                        channel,
                        segments.len()
                    );
                    continue;
                }
            };

            let segments: Vec<SegmentInfo> = segments
                .into_iter()
                .filter(|s| !leader.knows(s.id))
                .collect();
            if segments.is_empty() {
                continue;
            }

            if self.ctx.config.checker.load_requires_serviceable_leader && !leader.serviceable {
                debug!(
                    "Leader of channel {} on node={} is not serviceable, skip loading {} segment(s)",
                    channel,
                    leader.node,
                    segments.len()
                );
                continue;
            }

            let candidates = self.ctx.nodes.live_nodes(replica.nodes.iter().copied());
            if candidates.is_empty() {
                warn!(
                    "No available node in replica={} to load {} segment(s) of channel {}",
                    replica.id,
                    segments.len(),
                    channel
                );
                continue;
            }

            let plans = match self.ctx.balancer.assign_segment(
                replica.collection_id,
                &segments,
                &candidates,
                false,
            ) {
                Ok(plans) => plans,
                Err(e) => {
                    warn!(
                        "Failed to assign segments of channel {} in replica={}: {}",
                        channel, replica.id, e
                    );
                    continue;
                }
            };

            for plan in plans {
                if !candidates.contains(&plan.to) {
                    warn!(
                        "Segment={} is assigned to node={} outside of replica={} candidates {:?}, drop the plan",
                        plan.segment.id, plan.to, replica.id, candidates
                    );
                    continue;
                }
                actions.push(SegmentAction::grow(
                    plan.segment.id,
                    plan.to,
                    &plan.segment.channel,
                ));
            }
        }

        if actions.is_empty() {
            return None;
        }
        actions.sort_by_key(|a| (a.segment_id(), a.node()));

        match SegmentTask::new(
            replica.collection_id,
            Some(replica.id),
            actions,
            self.ctx.config.checker.segment_task_timeout(),
        ) {
            Ok(task) => Some(
                task.with_priority(TaskPriority::Normal)
                    .with_reason(REASON_LACK),
            ),
            Err(e) => {
                warn!("Failed to create load task for replica={}: {}", replica.id, e);
                None
            }
        }
    }

    /// Release sealed segments present in neither target generation.
    fn release_sealed(
        &self,
        replica: &Replica,
        targets: &Targets,
        dist: &[Segment],
        leaders: &BTreeMap<String, LeaderView>,
        tasks: &mut Vec<SegmentTask>,
        reduced: &mut Reduced,
    ) {
        // The target is not settled until the next generation is known.
        if targets.next.is_none() {
            return;
        }

        let current_version = targets.current_version();
        for segment in dist {
            if targets.contains_sealed(segment.id) {
                continue;
            }
            if serving_leader(leaders, &segment.channel, current_version).is_none() {
                continue;
            }
            let action = SegmentAction::reduce(
                segment.id,
                segment.node,
                &segment.channel,
                DataScope::Historical,
            );
            tasks.extend(self.reduce_task(
                replica.collection_id,
                Some(replica.id),
                action,
                TaskPriority::Normal,
                REASON_NOT_IN_TARGET,
                reduced,
            ));
        }
    }

    /// Release every copy of a sealed segment but the one with the highest version.
    ///
    /// A copy the leader still routes queries to is kept until the leader switches over.
    fn release_redundant(
        &self,
        replica: &Replica,
        targets: &Targets,
        dist: &[Segment],
        leaders: &BTreeMap<String, LeaderView>,
        tasks: &mut Vec<SegmentTask>,
        reduced: &mut Reduced,
    ) {
        let current_version = targets.current_version();
        for (segment_id, copies) in &dist.iter().group_by(|s| s.id) {
            let mut copies: Vec<&Segment> = copies.collect();
            if copies.len() < 2 {
                continue;
            }
            copies.sort_by_key(|s| (s.version, s.node));
            let (primary, others) = match copies.split_last() {
                Some(split) => split,
                None => continue,
            };

            let leader = match serving_leader(leaders, &primary.channel, current_version) {
                Some(leader) => leader,
                None => continue,
            };

            for copy in others {
                if leader.serves(segment_id, copy.node) {
                    debug!(
                        "Keep redundant segment={} on node={}, leader on node={} still routes to it",
                        segment_id, copy.node, leader.node
                    );
                    continue;
                }
                let action = SegmentAction::reduce(
                    segment_id,
                    copy.node,
                    &copy.channel,
                    DataScope::Historical,
                );
                tasks.extend(self.reduce_task(
                    replica.collection_id,
                    Some(replica.id),
                    action,
                    TaskPriority::Low,
                    REASON_REDUNDANT,
                    reduced,
                ));
            }
        }
    }

    /// Release growing segments already covered by the channel checkpoint or dropped by
    /// compaction.
    fn release_growing(
        &self,
        replica: &Replica,
        targets: &Targets,
        leaders: &BTreeMap<String, LeaderView>,
        tasks: &mut Vec<SegmentTask>,
        reduced: &mut Reduced,
    ) {
        let current = match &targets.current {
            Some(current) => current,
            None => return,
        };
        let unflushed = targets.unflushed_segment_ids();

        for (channel, leader) in leaders {
            if leader.target_version < current.version() {
                trace!(
                    "Leader of channel {} on node={} lags behind target version {}",
                    channel,
                    leader.node,
                    current.version()
                );
                continue;
            }

            let checkpoint = match current.channel(channel) {
                Some(checkpoint) => checkpoint,
                None => continue,
            };

            for (segment_id, segment) in &leader.growing_segments {
                if unflushed.contains(segment_id) {
                    continue;
                }
                let dropped = checkpoint.dropped_segment_ids.contains(segment_id);
                if !dropped && segment.start_position > checkpoint.seek_position {
                    continue;
                }
                let action = SegmentAction::reduce(
                    *segment_id,
                    segment.node,
                    channel,
                    DataScope::Streaming,
                );
                tasks.extend(self.reduce_task(
                    replica.collection_id,
                    Some(replica.id),
                    action,
                    TaskPriority::Normal,
                    REASON_STREAMING_NOT_IN_TARGET,
                    reduced,
                ));
            }
        }
    }

    /// Release segments whose collection, partition or replica is gone.
    fn release_orphans(&self, tasks: &mut Vec<SegmentTask>, reduced: &mut Reduced) {
        let orphans = self
            .ctx
            .dist
            .segment_dist
            .get_all()
            .into_iter()
            .filter(|s| self.resolve_replica(s).is_none())
            .sorted_by_key(|s| (s.collection_id, s.id, s.node));

        for segment in orphans {
            let scope = if segment.is_growing() {
                DataScope::Streaming
            } else {
                DataScope::Historical
            };
            let action = SegmentAction::reduce(segment.id, segment.node, &segment.channel, scope);
            tasks.extend(self.reduce_task(
                segment.collection_id,
                None,
                action,
                TaskPriority::Normal,
                REASON_DIRTY,
                reduced,
            ));
        }
    }

    fn reduce_task(
        &self,
        collection_id: CollectionId,
        replica: Option<ReplicaId>,
        action: SegmentAction,
        priority: TaskPriority,
        reason: &str,
        reduced: &mut Reduced,
    ) -> Option<SegmentTask> {
        if !reduced.insert((action.segment_id(), action.node(), action.scope())) {
            trace!("Skip {}, already released in this pass", action);
            return None;
        }

        match SegmentTask::new(
            collection_id,
            replica,
            vec![action],
            self.ctx.config.checker.segment_task_timeout(),
        ) {
            Ok(task) => Some(task.with_priority(priority).with_reason(reason)),
            Err(e) => {
                warn!(
                    "Failed to create release task of collection={}: {}",
                    collection_id, e
                );
                None
            }
        }
    }
}

impl Checker for SegmentChecker {
    fn id(&self) -> CheckerType {
        CheckerType::Segment
    }

    fn description(&self) -> &'static str {
        "SegmentChecker checks the lack of segments, or some segments are redundant"
    }

    fn check(&self) -> Vec<SegmentTask> {
        if !self.is_active() {
            return vec![];
        }

        let mut tasks = vec![];
        let mut reduced = Reduced::new();
        for collection_id in self.ctx.meta.collections.collection_ids() {
            self.check_collection(collection_id, &mut tasks, &mut reduced);
        }
        self.release_orphans(&mut tasks, &mut reduced);

        if !tasks.is_empty() {
            info!("{} generated {} task(s)", self.id(), tasks.len());
        }
        tasks
    }

    fn activate(&self) {
        if !self.active.swap(true, Ordering::SeqCst) {
            info!("{} is activated", self.id());
        }
    }

    fn deactivate(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("{} is deactivated", self.id());
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

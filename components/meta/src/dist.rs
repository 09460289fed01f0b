use std::{collections::BTreeMap, sync::Arc};

use log::debug;
use model::{LeaderView, NodeId, Replica, Segment};
use parking_lot::RwLock;

type SegmentSnapshot = Arc<BTreeMap<NodeId, Arc<Vec<Segment>>>>;
type LeaderViewSnapshot = Arc<BTreeMap<NodeId, Arc<BTreeMap<String, LeaderView>>>>;

/// Segments reported by each query node.
///
/// A report replaces everything previously known about the node. Writers swap in a new map, so a
/// snapshot taken by a reader stays consistent no matter how many reports arrive afterwards.
#[derive(Debug, Default)]
pub struct SegmentDistManager {
    segments: RwLock<SegmentSnapshot>,
}

impl SegmentDistManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the segments hosted by `node` with the latest report.
    pub fn update(&self, node: NodeId, segments: Vec<Segment>) {
        debug!("Node={} reports {} segment(s)", node, segments.len());
        let mut guard = self.segments.write();
        Arc::make_mut(&mut *guard).insert(node, Arc::new(segments));
    }

    pub fn remove_node(&self, node: NodeId) {
        let mut guard = self.segments.write();
        Arc::make_mut(&mut *guard).remove(&node);
    }

    /// Point-in-time view of the whole distribution.
    pub fn snapshot(&self) -> SegmentSnapshot {
        Arc::clone(&*self.segments.read())
    }

    pub fn get_by_node(&self, node: NodeId) -> Vec<Segment> {
        self.snapshot()
            .get(&node)
            .map(|segments| Vec::clone(segments))
            .unwrap_or_default()
    }

    /// All reported segments ordered by node.
    pub fn get_all(&self) -> Vec<Segment> {
        self.snapshot()
            .values()
            .flat_map(|segments| segments.iter().cloned())
            .collect()
    }

    /// Segments of the collection reported by members of the replica.
    pub fn get_by_replica(&self, replica: &Replica) -> Vec<Segment> {
        let snapshot = self.snapshot();
        replica
            .nodes
            .iter()
            .filter_map(|node| snapshot.get(node))
            .flat_map(|segments| segments.iter())
            .filter(|s| s.collection_id == replica.collection_id)
            .cloned()
            .collect()
    }

    /// Number of segments each node hosts.
    pub fn segment_count(&self, node: NodeId) -> usize {
        self.snapshot()
            .get(&node)
            .map(|segments| segments.len())
            .unwrap_or(0)
    }
}

/// Channel views reported by the shard leaders.
#[derive(Debug, Default)]
pub struct LeaderViewManager {
    views: RwLock<LeaderViewSnapshot>,
}

impl LeaderViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the views led by `node` with the latest report.
    pub fn update(&self, node: NodeId, views: Vec<LeaderView>) {
        let views: BTreeMap<String, LeaderView> = views
            .into_iter()
            .map(|view| (view.channel.clone(), view))
            .collect();
        debug!(
            "Node={} leads channel(s) {:?}",
            node,
            views.keys().collect::<Vec<_>>()
        );
        let mut guard = self.views.write();
        Arc::make_mut(&mut *guard).insert(node, Arc::new(views));
    }

    pub fn remove_node(&self, node: NodeId) {
        let mut guard = self.views.write();
        Arc::make_mut(&mut *guard).remove(&node);
    }

    pub fn snapshot(&self) -> LeaderViewSnapshot {
        Arc::clone(&*self.views.read())
    }

    pub fn get_leader_view(&self, node: NodeId, channel: &str) -> Option<LeaderView> {
        self.snapshot()
            .get(&node)
            .and_then(|views| views.get(channel))
            .cloned()
    }

    pub fn get_by_node(&self, node: NodeId) -> Vec<LeaderView> {
        self.snapshot()
            .get(&node)
            .map(|views| views.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The leader serving `channel` for the replica.
    ///
    /// During a leader switch two members may report the same channel; the view with the higher
    /// distribution version wins, the lower node id on a tie.
    pub fn get_latest_shard_leader(&self, replica: &Replica, channel: &str) -> Option<LeaderView> {
        let snapshot = self.snapshot();
        let mut latest: Option<&LeaderView> = None;
        for node in replica.nodes.iter() {
            let view = match snapshot.get(node).and_then(|views| views.get(channel)) {
                Some(view) if view.collection_id == replica.collection_id => view,
                _ => continue,
            };
            if latest.map(|l| view.version > l.version).unwrap_or(true) {
                latest = Some(view);
            }
        }
        latest.cloned()
    }

    /// Latest leader of every channel the replica serves, keyed by channel.
    pub fn get_leader_views_by_replica(&self, replica: &Replica) -> BTreeMap<String, LeaderView> {
        let snapshot = self.snapshot();
        let mut leaders: BTreeMap<String, LeaderView> = BTreeMap::new();
        for node in replica.nodes.iter() {
            let views = match snapshot.get(node) {
                Some(views) => views,
                None => continue,
            };
            for view in views
                .values()
                .filter(|v| v.collection_id == replica.collection_id)
            {
                match leaders.get(&view.channel) {
                    Some(existing) if existing.version >= view.version => {}
                    _ => {
                        leaders.insert(view.channel.clone(), view.clone());
                    }
                }
            }
        }
        leaders
    }
}

/// Actual state of the cluster as reported by query nodes.
#[derive(Debug, Default)]
pub struct DistributionManager {
    pub segment_dist: SegmentDistManager,
    pub leader_view: LeaderViewManager,
}

impl DistributionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a segment report of the node.
    pub fn update_segments(&self, node: NodeId, segments: Vec<Segment>) {
        self.segment_dist.update(node, segments);
    }

    /// Handle a leader view report of the node.
    pub fn update_leader_views(&self, node: NodeId, views: Vec<LeaderView>) {
        self.leader_view.update(node, views);
    }

    /// Forget everything reported by the node, e.g. once its session expired.
    pub fn remove_node(&self, node: NodeId) {
        self.segment_dist.remove_node(node);
        self.leader_view.remove_node(node);
    }
}

use std::{collections::BTreeMap, sync::Arc};

use log::{debug, trace};
use meta::{DistributionManager, NodeManager};
use model::{CollectionId, NodeId, NodeState, SegmentInfo};

use crate::{Balance, BalanceError, SegmentAssignPlan};

/// Spread segments evenly, always picking the node that hosts the fewest segments.
#[derive(Debug)]
pub struct RoundRobinBalancer {
    dist: Arc<DistributionManager>,
    nodes: Arc<NodeManager>,
}

impl RoundRobinBalancer {
    pub fn new(dist: Arc<DistributionManager>, nodes: Arc<NodeManager>) -> Self {
        Self { dist, nodes }
    }

    fn eligible(&self, node: NodeId, manual: bool) -> bool {
        match self.nodes.get(node).map(|info| info.state) {
            Some(NodeState::Up) => true,
            Some(NodeState::Stopping) => manual,
            _ => false,
        }
    }
}

impl Balance for RoundRobinBalancer {
    fn assign_segment(
        &self,
        collection_id: CollectionId,
        segments: &[SegmentInfo],
        nodes: &[NodeId],
        manual: bool,
    ) -> Result<Vec<SegmentAssignPlan>, BalanceError> {
        // Segment count of each eligible candidate.
        let mut load: BTreeMap<NodeId, usize> = nodes
            .iter()
            .copied()
            .filter(|node| self.eligible(*node, manual))
            .map(|node| (node, self.dist.segment_dist.segment_count(node)))
            .collect();

        if load.is_empty() {
            return Err(BalanceError::NoAvailableNode(collection_id));
        }
        trace!("Segment count of candidates: {:?}", load);

        let mut plans = Vec::with_capacity(segments.len());
        for segment in segments {
            // BTreeMap iterates in ascending node order, so min_by_key resolves ties to the
            // lower node id.
            let (node, count) = match load.iter_mut().min_by_key(|(_, count)| **count) {
                Some(entry) => entry,
                None => break,
            };
            *count += 1;
            debug!(
                "Assign segment={} of collection={} to node={}",
                segment.id, collection_id, node
            );
            plans.push(SegmentAssignPlan::new(segment.clone(), *node));
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{NodeInfo, Segment};

    fn fixture() -> (Arc<DistributionManager>, Arc<NodeManager>) {
        let dist = Arc::new(DistributionManager::new());
        let nodes = Arc::new(NodeManager::new());
        for id in 1..=3 {
            nodes.add(NodeInfo::new(id, "localhost"));
        }
        dist.update_segments(
            1,
            vec![
                Segment::sealed(1, 1, 100, 1, 1, "ch"),
                Segment::sealed(1, 1, 101, 1, 1, "ch"),
            ],
        );
        dist.update_segments(2, vec![Segment::sealed(1, 1, 102, 2, 1, "ch")]);
        (dist, nodes)
    }

    #[test]
    fn test_assign_least_loaded() -> Result<(), BalanceError> {
        ulog::try_init_log();
        let (dist, nodes) = fixture();
        let balancer = RoundRobinBalancer::new(dist, nodes);
        let segments: Vec<_> = (1..=4).map(|id| SegmentInfo::new(1, 1, id, "ch")).collect();

        let plans = balancer.assign_segment(1, &segments, &[1, 2, 3], false)?;
        let targets: Vec<_> = plans.iter().map(|p| (p.segment.id, p.to)).collect();
        // Loads start at 2, 1, 0.
        assert_eq!(vec![(1, 3), (2, 2), (3, 3), (4, 1)], targets);
        assert!(plans.iter().all(|p| p.from.is_none() && p.replica.is_none()));
        Ok(())
    }

    #[test]
    fn test_skip_unavailable_nodes() -> Result<(), BalanceError> {
        let (dist, nodes) = fixture();
        nodes.set_state(3, NodeState::Stopping);
        nodes.set_state(2, NodeState::Down);
        let balancer = RoundRobinBalancer::new(dist, Arc::clone(&nodes));
        let segments = vec![SegmentInfo::new(1, 1, 1, "ch")];

        let plans = balancer.assign_segment(1, &segments, &[2, 3, 4], false);
        assert_eq!(Err(BalanceError::NoAvailableNode(1)), plans);

        // Operators may still place segments on a node that is shutting down.
        let plans = balancer.assign_segment(1, &segments, &[2, 3], true)?;
        assert_eq!(3, plans[0].to);

        let plans = balancer.assign_segment(1, &segments, &[1, 2, 3], false)?;
        assert_eq!(1, plans[0].to);
        Ok(())
    }
}

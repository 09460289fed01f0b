use std::collections::HashMap;

use log::info;
use model::{NodeId, NodeInfo, NodeState};
use parking_lot::RwLock;

/// Registry of query nodes known through their sessions.
#[derive(Debug, Default)]
pub struct NodeManager {
    nodes: RwLock<HashMap<NodeId, NodeInfo>>,
}

impl NodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, node: NodeInfo) {
        info!("Add query node={}, state={}", node.id, node.state);
        self.nodes.write().insert(node.id, node);
    }

    pub fn remove(&self, node: NodeId) -> Option<NodeInfo> {
        let removed = self.nodes.write().remove(&node);
        if removed.is_some() {
            info!("Remove query node={}", node);
        }
        removed
    }

    pub fn get(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.read().get(&node).cloned()
    }

    /// Update the state of a node. Returns `false` if the node is unknown.
    pub fn set_state(&self, node: NodeId, state: NodeState) -> bool {
        match self.nodes.write().get_mut(&node) {
            Some(info) => {
                if info.state != state {
                    info!("Query node={} transits {} -> {}", node, info.state, state);
                    info.state = state;
                }
                true
            }
            None => false,
        }
    }

    pub fn is_up(&self, node: NodeId) -> bool {
        self.nodes
            .read()
            .get(&node)
            .map(NodeInfo::is_up)
            .unwrap_or(false)
    }

    /// Filter the candidates down to nodes that are up, in ascending id order.
    ///
    /// Unknown, stopping and down nodes are excluded.
    pub fn live_nodes<I>(&self, candidates: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let nodes = self.nodes.read();
        let mut live: Vec<NodeId> = candidates
            .into_iter()
            .filter(|id| nodes.get(id).map(NodeInfo::is_up).unwrap_or(false))
            .collect();
        live.sort_unstable();
        live.dedup();
        live
    }

    pub fn all(&self) -> Vec<NodeInfo> {
        let mut nodes: Vec<_> = self.nodes.read().values().cloned().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_nodes() {
        let manager = NodeManager::new();
        manager.add(NodeInfo::new(1, "localhost"));
        manager.add(NodeInfo::new(2, "localhost"));
        manager.add(NodeInfo::new(3, "localhost"));
        assert!(manager.set_state(2, NodeState::Stopping));
        assert!(manager.set_state(3, NodeState::Down));
        assert!(!manager.set_state(4, NodeState::Down));

        assert_eq!(vec![1], manager.live_nodes([3, 2, 1, 1, 4]));
        assert!(manager.is_up(1));
        assert!(!manager.is_up(2));

        manager.set_state(3, NodeState::Up);
        assert_eq!(vec![1, 3], manager.live_nodes([3, 1]));

        assert!(manager.remove(1).is_some());
        assert!(manager.remove(1).is_none());
        assert_eq!(vec![2, 3], manager.all().iter().map(|n| n.id).collect::<Vec<_>>());
    }
}

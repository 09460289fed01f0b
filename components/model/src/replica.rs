use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CollectionId, NodeId, ReplicaId};

/// A named group of query nodes that serves one full copy of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    pub id: ReplicaId,

    #[serde(rename = "collection-id")]
    pub collection_id: CollectionId,

    pub nodes: BTreeSet<NodeId>,
}

impl Replica {
    pub fn new<I>(id: ReplicaId, collection_id: CollectionId, nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self {
            id,
            collection_id,
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn add_node(&mut self, node: NodeId) {
        self.nodes.insert(node);
    }

    pub fn remove_node(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let mut replica = Replica::new(1, 1, [2, 1, 2]);
        assert_eq!(vec![1, 2], replica.nodes.iter().copied().collect::<Vec<_>>());
        assert!(replica.contains(1));
        assert!(!replica.contains(3));

        replica.add_node(3);
        replica.remove_node(1);
        assert!(replica.contains(3));
        assert!(!replica.contains(1));
    }
}

use std::collections::BTreeMap;

use log::info;
use model::{CollectionId, NodeId, Replica, ReplicaId};
use parking_lot::RwLock;

/// Directory of replicas, each a group of query nodes serving a full copy of a collection.
#[derive(Debug, Default)]
pub struct ReplicaManager {
    replicas: RwLock<BTreeMap<ReplicaId, Replica>>,
}

impl ReplicaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, replica: Replica) {
        info!(
            "Put replica={}, collection={}, nodes={:?}",
            replica.id, replica.collection_id, replica.nodes
        );
        self.replicas.write().insert(replica.id, replica);
    }

    pub fn get(&self, replica_id: ReplicaId) -> Option<Replica> {
        self.replicas.read().get(&replica_id).cloned()
    }

    /// Replicas of the collection in ascending id order.
    pub fn get_by_collection(&self, collection_id: CollectionId) -> Vec<Replica> {
        self.replicas
            .read()
            .values()
            .filter(|r| r.collection_id == collection_id)
            .cloned()
            .collect()
    }

    /// The replica of the collection that the node serves, if any.
    pub fn get_by_collection_and_node(
        &self,
        collection_id: CollectionId,
        node: NodeId,
    ) -> Option<Replica> {
        self.replicas
            .read()
            .values()
            .find(|r| r.collection_id == collection_id && r.contains(node))
            .cloned()
    }

    pub fn remove_collection(&self, collection_id: CollectionId) {
        self.replicas
            .write()
            .retain(|_, r| r.collection_id != collection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let manager = ReplicaManager::new();
        manager.put(Replica::new(2, 1, [3, 4]));
        manager.put(Replica::new(1, 1, [1, 2]));
        manager.put(Replica::new(3, 2, [1]));

        let ids: Vec<_> = manager.get_by_collection(1).iter().map(|r| r.id).collect();
        assert_eq!(vec![1, 2], ids);
        assert_eq!(Some(2), manager.get_by_collection_and_node(1, 4).map(|r| r.id));
        assert_eq!(Some(3), manager.get_by_collection_and_node(2, 1).map(|r| r.id));
        assert!(manager.get_by_collection_and_node(2, 4).is_none());

        manager.remove_collection(1);
        assert!(manager.get(1).is_none());
        assert!(manager.get(3).is_some());
    }
}

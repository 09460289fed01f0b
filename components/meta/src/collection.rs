use std::collections::BTreeMap;

use log::info;
use model::{Collection, CollectionId, LoadStatus, Partition, PartitionId};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Collections {
    collections: BTreeMap<CollectionId, Collection>,
    partitions: BTreeMap<PartitionId, Partition>,
}

/// Loaded collections and partitions.
#[derive(Debug, Default)]
pub struct CollectionManager {
    inner: RwLock<Collections>,
}

impl CollectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_collection(&self, collection: Collection) {
        info!(
            "Put collection={}, replica-number={}",
            collection.id, collection.replica_number
        );
        self.inner
            .write()
            .collections
            .insert(collection.id, collection);
    }

    pub fn put_partition(&self, partition: Partition) {
        self.inner.write().partitions.insert(partition.id, partition);
    }

    pub fn get_collection(&self, collection_id: CollectionId) -> Option<Collection> {
        self.inner.read().collections.get(&collection_id).cloned()
    }

    pub fn exists(&self, collection_id: CollectionId) -> bool {
        self.inner.read().collections.contains_key(&collection_id)
    }

    pub fn get_partition(&self, partition_id: PartitionId) -> Option<Partition> {
        self.inner.read().partitions.get(&partition_id).copied()
    }

    /// Partitions of the collection in ascending id order.
    pub fn get_partitions_by_collection(&self, collection_id: CollectionId) -> Vec<Partition> {
        self.inner
            .read()
            .partitions
            .values()
            .filter(|p| p.collection_id == collection_id)
            .copied()
            .collect()
    }

    /// Ids of all loaded collections in ascending order.
    pub fn collection_ids(&self) -> Vec<CollectionId> {
        self.inner.read().collections.keys().copied().collect()
    }

    pub fn update_load_status(&self, collection_id: CollectionId, status: LoadStatus) -> bool {
        match self.inner.write().collections.get_mut(&collection_id) {
            Some(collection) => {
                collection.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove_partition(&self, partition_id: PartitionId) -> Option<Partition> {
        self.inner.write().partitions.remove(&partition_id)
    }

    /// Remove the collection together with all of its partitions.
    pub fn remove_collection(&self, collection_id: CollectionId) -> Option<Collection> {
        let mut inner = self.inner.write();
        inner
            .partitions
            .retain(|_, p| p.collection_id != collection_id);
        let removed = inner.collections.remove(&collection_id);
        if removed.is_some() {
            info!("Remove collection={}", collection_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_lifecycle() {
        let manager = CollectionManager::new();
        manager.put_collection(Collection::new(2, 1));
        manager.put_collection(Collection::new(1, 1));
        manager.put_partition(Partition::new(1, 10));
        manager.put_partition(Partition::new(1, 11));
        manager.put_partition(Partition::new(2, 20));

        assert_eq!(vec![1, 2], manager.collection_ids());
        assert_eq!(
            vec![10, 11],
            manager
                .get_partitions_by_collection(1)
                .iter()
                .map(|p| p.id)
                .collect::<Vec<_>>()
        );
        assert!(manager.update_load_status(1, LoadStatus::Loaded));
        assert!(manager.get_collection(1).unwrap().is_loaded());

        assert!(manager.remove_collection(1).is_some());
        assert!(!manager.exists(1));
        assert!(manager.get_partition(10).is_none());
        assert!(manager.get_partition(20).is_some());
        assert!(!manager.update_load_status(1, LoadStatus::Loaded));
    }
}

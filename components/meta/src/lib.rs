//! In-memory views the query coordinator keeps about the cluster.
//!
//! All managers are `Send + Sync` and may be read by the checkers while heartbeat and watch
//! handlers update them. Readers never hold a lock across a whole check; stores that are
//! read in bulk hand out `Arc` snapshots instead.

pub mod broker;
pub mod collection;
pub mod dist;
pub mod error;
pub mod node;
pub mod replica;
pub mod target;

pub use crate::broker::Broker;
pub use crate::collection::CollectionManager;
pub use crate::dist::{DistributionManager, LeaderViewManager, SegmentDistManager};
pub use crate::error::MetaError;
pub use crate::node::NodeManager;
pub use crate::replica::ReplicaManager;
pub use crate::target::{TargetManager, TargetScope};

#[cfg(any(test, feature = "mock"))]
pub use crate::broker::MockBroker;

/// Collection, partition and replica metadata.
#[derive(Debug, Default)]
pub struct Meta {
    pub collections: CollectionManager,
    pub replicas: ReplicaManager,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release a collection: drop its partitions and replicas.
    pub fn remove_collection(&self, collection_id: model::CollectionId) {
        self.collections.remove_collection(collection_id);
        self.replicas.remove_collection(collection_id);
    }
}

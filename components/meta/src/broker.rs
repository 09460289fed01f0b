use model::{CollectionId, RecoveryInfo};

#[cfg(any(test, feature = "mock"))]
use mockall::automock;

use crate::error::MetaError;

/// Gateway to the data service, which owns the recovery information of collections.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Broker {
    /// Fetch channels and flushed segments of the collection.
    ///
    /// # Arguments
    /// * `collection_id` - The collection to recover.
    ///
    /// # Returns
    /// Channel checkpoints with their dropped and unflushed segments, plus every flushed segment that
    /// should be loaded. Segments may belong to partitions that are not loaded; callers filter them.
    fn get_recovery_info(&self, collection_id: CollectionId) -> Result<RecoveryInfo, MetaError>;
}

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{CollectionId, PartitionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStatus {
    #[default]
    Loading,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,

    /// Number of replicas the collection was requested to load with.
    #[serde(rename = "replica-number", default = "default_replica_number")]
    pub replica_number: u32,

    #[serde(default)]
    pub status: LoadStatus,
}

fn default_replica_number() -> u32 {
    1
}

impl Collection {
    pub fn new(id: CollectionId, replica_number: u32) -> Self {
        Self {
            id,
            replica_number,
            status: LoadStatus::Loading,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub id: PartitionId,

    #[serde(rename = "collection-id")]
    pub collection_id: CollectionId,
}

impl Partition {
    pub fn new(collection_id: CollectionId, id: PartitionId) -> Self {
        Self { id, collection_id }
    }
}

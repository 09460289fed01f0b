use model::CollectionId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MetaError {
    #[error("Collection `{0}` is not found")]
    CollectionNotFound(CollectionId),

    #[error("Failed to get recovery info of collection `{collection_id}` from data service: {reason}")]
    Broker {
        collection_id: CollectionId,
        reason: String,
    },
}

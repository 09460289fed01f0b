use model::CollectionId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BalanceError {
    #[error("No available node to assign segments of collection `{0}`")]
    NoAvailableNode(CollectionId),
}

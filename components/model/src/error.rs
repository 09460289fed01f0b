use thiserror::Error;

use crate::{NodeId, SegmentId};

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("A task requires at least one action")]
    EmptyActions,

    #[error("Segment `{segment_id}` is both loaded onto and released from node `{node}`")]
    ConflictingActions { segment_id: SegmentId, node: NodeId },
}

//! Placement strategies deciding which query node should load a segment.

pub mod error;
pub mod round_robin;

use model::{CollectionId, NodeId, ReplicaId, SegmentInfo};

#[cfg(any(test, feature = "mock"))]
use mockall::automock;

pub use crate::error::BalanceError;
pub use crate::round_robin::RoundRobinBalancer;

/// Decision to place a segment on a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentAssignPlan {
    pub segment: SegmentInfo,

    /// Node currently hosting the segment when the plan moves it.
    pub from: Option<NodeId>,

    pub to: NodeId,

    pub replica: Option<ReplicaId>,
}

impl SegmentAssignPlan {
    pub fn new(segment: SegmentInfo, to: NodeId) -> Self {
        Self {
            segment,
            from: None,
            to,
            replica: None,
        }
    }
}

#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Balance {
    /// Assign segments of a collection to a subset of the candidate nodes.
    ///
    /// # Arguments
    /// * `collection_id` - Collection the segments belong to.
    /// * `segments` - Segments to place.
    /// * `nodes` - Candidate nodes, in ascending id order.
    /// * `manual` - Whether the assignment was requested by an operator, in which case nodes that
    ///   are shutting down are not excluded.
    ///
    /// # Returns
    /// One plan per segment that could be placed.
    fn assign_segment(
        &self,
        collection_id: CollectionId,
        segments: &[SegmentInfo],
        nodes: &[NodeId],
        manual: bool,
    ) -> Result<Vec<SegmentAssignPlan>, BalanceError>;
}

pub mod collection;
pub mod error;
pub mod leader_view;
pub mod node;
pub mod replica;
pub mod segment;
pub mod target;
pub mod task;

pub use crate::collection::{Collection, LoadStatus, Partition};
pub use crate::leader_view::{LeaderView, SegmentDist};
pub use crate::node::{NodeInfo, NodeState};
pub use crate::replica::Replica;
pub use crate::segment::{Segment, SegmentInfo, SegmentKind};
pub use crate::target::{ChannelTarget, CollectionTarget, RecoveryInfo};
pub use crate::task::{ActionType, DataScope, SegmentAction, SegmentTask, TaskPriority};

pub type CollectionId = i64;
pub type PartitionId = i64;
pub type ReplicaId = i64;
pub type SegmentId = i64;
pub type NodeId = i64;

/// Logical timestamp carried by channel checkpoints and segment start positions.
pub type Timestamp = u64;

/// Version of a collection target. `0` means no target has ever been installed.
pub type TargetVersion = i64;

/// Replica id reported for tasks that do not belong to any replica, e.g. releasing dirty segments.
pub const NIL_REPLICA_ID: ReplicaId = -1;

pub const INITIAL_TARGET_VERSION: TargetVersion = 0;

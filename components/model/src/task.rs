use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use derivative::Derivative;
use strum_macros::Display;

use crate::{error::TaskError, CollectionId, NodeId, ReplicaId, SegmentId, NIL_REPLICA_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ActionType {
    /// Load the segment onto the node.
    Grow,

    /// Release the segment from the node.
    Reduce,
}

/// Which part of a query node a segment action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DataScope {
    /// Sealed segments loaded from object storage.
    Historical,

    /// Growing segments consumed from the channel.
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum TaskPriority {
    Low,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentAction {
    ty: ActionType,
    segment_id: SegmentId,
    node: NodeId,
    channel: String,
    scope: DataScope,
}

impl SegmentAction {
    pub fn new<C>(
        ty: ActionType,
        segment_id: SegmentId,
        node: NodeId,
        channel: C,
        scope: DataScope,
    ) -> Self
    where
        C: AsRef<str>,
    {
        Self {
            ty,
            segment_id,
            node,
            channel: channel.as_ref().to_owned(),
            scope,
        }
    }

    pub fn grow<C: AsRef<str>>(segment_id: SegmentId, node: NodeId, channel: C) -> Self {
        Self::new(
            ActionType::Grow,
            segment_id,
            node,
            channel,
            DataScope::Historical,
        )
    }

    pub fn reduce<C: AsRef<str>>(
        segment_id: SegmentId,
        node: NodeId,
        channel: C,
        scope: DataScope,
    ) -> Self {
        Self::new(ActionType::Reduce, segment_id, node, channel, scope)
    }

    pub fn ty(&self) -> ActionType {
        self.ty
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn scope(&self) -> DataScope {
        self.scope
    }
}

impl Display for SegmentAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(segment={}, node={}, channel={}, scope={})",
            self.ty, self.segment_id, self.node, self.channel, self.scope
        )
    }
}

/// A unit of work for the task scheduler: actions on segments of one replica.
///
/// Tasks are plain descriptors. They are rebuilt on every check and never persisted.
#[derive(Derivative)]
#[derivative(Debug, PartialEq, Clone)]
pub struct SegmentTask {
    collection_id: CollectionId,

    /// `None` if the segments do not belong to any replica, e.g. the collection is released.
    replica: Option<ReplicaId>,

    actions: Vec<SegmentAction>,

    priority: TaskPriority,

    #[derivative(PartialEq = "ignore")]
    reason: String,

    /// Deadline handed to the executor.
    #[derivative(PartialEq = "ignore")]
    timeout: Duration,
}

impl SegmentTask {
    /// Create a task with normal priority.
    ///
    /// A task must carry at least one action, and it must not both grow and reduce the same segment
    /// on the same node.
    pub fn new(
        collection_id: CollectionId,
        replica: Option<ReplicaId>,
        actions: Vec<SegmentAction>,
        timeout: Duration,
    ) -> Result<Self, TaskError> {
        if actions.is_empty() {
            return Err(TaskError::EmptyActions);
        }

        let mut seen: HashMap<(SegmentId, NodeId, DataScope), ActionType> = HashMap::new();
        for action in &actions {
            let key = (action.segment_id, action.node, action.scope);
            match seen.get(&key) {
                Some(ty) if *ty != action.ty => {
                    return Err(TaskError::ConflictingActions {
                        segment_id: action.segment_id,
                        node: action.node,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(key, action.ty);
                }
            }
        }

        Ok(Self {
            collection_id,
            replica,
            actions,
            priority: TaskPriority::Normal,
            reason: String::new(),
            timeout,
        })
    }

    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    pub fn replica(&self) -> Option<ReplicaId> {
        self.replica
    }

    /// Replica id of the task, or [`NIL_REPLICA_ID`] if the task is not owned by a replica.
    pub fn replica_id(&self) -> ReplicaId {
        self.replica.unwrap_or(NIL_REPLICA_ID)
    }

    pub fn actions(&self) -> &[SegmentAction] {
        &self.actions
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: TaskPriority) {
        self.priority = priority;
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn with_reason<R: AsRef<str>>(mut self, reason: R) -> Self {
        self.reason = reason.as_ref().to_owned();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Display for SegmentTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentTask{{collection={}, replica={}, priority={}, reason=\"{}\", actions=[",
            self.collection_id,
            self.replica_id(),
            self.priority,
            self.reason
        )?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", action)?;
        }
        write!(f, "]}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task() -> Result<(), TaskError> {
        let task = SegmentTask::new(
            1,
            None,
            vec![SegmentAction::reduce(3, 2, "ch", DataScope::Historical)],
            Duration::from_secs(1),
        )?
        .with_reason("dirty segment");
        assert_eq!(NIL_REPLICA_ID, task.replica_id());
        assert_eq!(TaskPriority::Normal, task.priority());
        assert_eq!("dirty segment", task.reason());
        assert_eq!(
            "SegmentTask{collection=1, replica=-1, priority=Normal, reason=\"dirty segment\", \
             actions=[Reduce(segment=3, node=2, channel=ch, scope=Historical)]}",
            task.to_string()
        );
        Ok(())
    }

    #[test]
    fn test_reject_invalid_actions() {
        assert_eq!(
            Err(TaskError::EmptyActions),
            SegmentTask::new(1, Some(1), vec![], Duration::from_secs(1))
        );

        let actions = vec![
            SegmentAction::grow(3, 2, "ch"),
            SegmentAction::reduce(3, 2, "ch", DataScope::Historical),
        ];
        assert_eq!(
            Err(TaskError::ConflictingActions {
                segment_id: 3,
                node: 2
            }),
            SegmentTask::new(1, Some(1), actions, Duration::from_secs(1))
        );

        // Growing and sealed copies of one segment live in different scopes.
        let actions = vec![
            SegmentAction::grow(3, 2, "ch"),
            SegmentAction::reduce(3, 2, "ch", DataScope::Streaming),
        ];
        assert!(SegmentTask::new(1, Some(1), actions, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_priority_order() {
        assert!(TaskPriority::Low < TaskPriority::Normal);
    }
}

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::NodeId;

/// Liveness of a query node as observed through its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeState {
    #[default]
    Up,

    /// The node is going away. It keeps serving what it holds but must not receive new segments.
    Stopping,

    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub state: NodeState,
}

impl NodeInfo {
    pub fn new<Addr>(id: NodeId, address: Addr) -> Self
    where
        Addr: AsRef<str>,
    {
        Self {
            id,
            address: address.as_ref().to_owned(),
            hostname: address.as_ref().to_owned(),
            state: NodeState::Up,
        }
    }

    pub fn is_up(&self) -> bool {
        self.state == NodeState::Up
    }

    pub fn is_stopping(&self) -> bool {
        self.state == NodeState::Stopping
    }
}

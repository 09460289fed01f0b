use std::sync::Arc;

use balance::Balance;
use config::Configuration;
use meta::{DistributionManager, Meta, NodeManager, TargetManager};

use crate::error::CheckerError;

/// Everything a checker reads from, shared with the rest of the coordinator.
#[derive(Clone)]
pub struct CheckerContext {
    pub meta: Arc<Meta>,
    pub dist: Arc<DistributionManager>,
    pub targets: Arc<TargetManager>,
    pub nodes: Arc<NodeManager>,
    pub balancer: Arc<dyn Balance + Send + Sync>,
    pub config: Arc<Configuration>,
}

impl CheckerContext {
    pub fn builder() -> CheckerContextBuilder {
        CheckerContextBuilder::default()
    }
}

impl std::fmt::Debug for CheckerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerContext")
            .field("meta", &self.meta)
            .field("dist", &self.dist)
            .field("targets", &self.targets)
            .field("nodes", &self.nodes)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct CheckerContextBuilder {
    meta: Option<Arc<Meta>>,
    dist: Option<Arc<DistributionManager>>,
    targets: Option<Arc<TargetManager>>,
    nodes: Option<Arc<NodeManager>>,
    balancer: Option<Arc<dyn Balance + Send + Sync>>,
    config: Option<Arc<Configuration>>,
}

impl CheckerContextBuilder {
    pub fn meta(mut self, meta: Arc<Meta>) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn dist(mut self, dist: Arc<DistributionManager>) -> Self {
        self.dist = Some(dist);
        self
    }

    pub fn targets(mut self, targets: Arc<TargetManager>) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn nodes(mut self, nodes: Arc<NodeManager>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn balancer(mut self, balancer: Arc<dyn Balance + Send + Sync>) -> Self {
        self.balancer = Some(balancer);
        self
    }

    pub fn config(mut self, config: Arc<Configuration>) -> Self {
        self.config = Some(config);
        self
    }

    /// Assemble the context, failing with the name of the first missing dependency.
    pub fn build(self) -> Result<CheckerContext, CheckerError> {
        Ok(CheckerContext {
            meta: self.meta.ok_or(CheckerError::MissingDependency("meta"))?,
            dist: self.dist.ok_or(CheckerError::MissingDependency("dist"))?,
            targets: self
                .targets
                .ok_or(CheckerError::MissingDependency("targets"))?,
            nodes: self.nodes.ok_or(CheckerError::MissingDependency("nodes"))?,
            balancer: self
                .balancer
                .ok_or(CheckerError::MissingDependency("balancer"))?,
            config: self
                .config
                .ok_or(CheckerError::MissingDependency("config"))?,
        })
    }
}

//! Offline cluster state: everything the segment checker reads, loaded from a YAML file.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use balance::{Balance, RoundRobinBalancer};
use config::{BalancePolicy, Configuration};
use log::{info, warn};
use meta::{Broker, DistributionManager, Meta, MetaError, NodeManager, TargetManager};
use model::{
    Collection, CollectionId, LeaderView, NodeId, NodeInfo, Partition, PartitionId, RecoveryInfo,
    Replica, ReplicaId, Segment,
};
use serde::{Deserialize, Serialize};

use crate::{context::CheckerContext, error::CheckerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaSnapshot {
    pub id: ReplicaId,

    #[serde(default)]
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionSnapshot {
    #[serde(flatten)]
    pub collection: Collection,

    #[serde(default)]
    pub partitions: Vec<PartitionId>,

    #[serde(default)]
    pub replicas: Vec<ReplicaSnapshot>,

    /// What the data service returns when asked to recover the collection.
    #[serde(default)]
    pub recovery: RecoveryInfo,

    /// Whether query nodes have already loaded the target, making it the current one.
    #[serde(default)]
    pub promote: bool,
}

/// What a query node last reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeReport {
    pub node: NodeId,

    #[serde(default)]
    pub segments: Vec<Segment>,

    #[serde(default)]
    pub leader_views: Vec<LeaderView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeInfo>,
    pub collections: Vec<CollectionSnapshot>,
    pub reports: Vec<NodeReport>,
}

/// Broker answering from the recovery info recorded in a snapshot.
#[derive(Debug, Default)]
pub struct SnapshotBroker {
    recovery: BTreeMap<CollectionId, RecoveryInfo>,
}

impl SnapshotBroker {
    pub fn new(recovery: BTreeMap<CollectionId, RecoveryInfo>) -> Self {
        Self { recovery }
    }
}

impl Broker for SnapshotBroker {
    fn get_recovery_info(&self, collection_id: CollectionId) -> Result<RecoveryInfo, MetaError> {
        self.recovery
            .get(&collection_id)
            .cloned()
            .ok_or_else(|| MetaError::Broker {
                collection_id,
                reason: "not recorded in snapshot".to_owned(),
            })
    }
}

impl ClusterSnapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CheckerError> {
        let file = std::fs::File::open(path)?;
        let snapshot = serde_yaml::from_reader(file)?;
        Ok(snapshot)
    }

    /// Populate fresh managers with the snapshot and assemble a checker context on top of them.
    ///
    /// Targets are installed in collection order; each refresh takes the next target version, so
    /// the first promoted collection gets current version 1.
    pub fn install(self, config: Configuration) -> Result<CheckerContext, CheckerError> {
        let meta = Arc::new(Meta::new());
        let nodes = Arc::new(NodeManager::new());
        let dist = Arc::new(DistributionManager::new());

        for node in self.nodes {
            nodes.add(node);
        }

        let mut recovery = BTreeMap::new();
        let mut promoted = vec![];
        for snapshot in self.collections {
            let collection_id = snapshot.collection.id;
            if recovery.contains_key(&collection_id) {
                return Err(CheckerError::Snapshot(format!(
                    "collection {} is listed more than once",
                    collection_id
                )));
            }
            meta.collections.put_collection(snapshot.collection);
            for partition in snapshot.partitions {
                meta.collections
                    .put_partition(Partition::new(collection_id, partition));
            }
            for replica in snapshot.replicas {
                for node in replica.nodes.iter().filter(|n| nodes.get(**n).is_none()) {
                    warn!(
                        "Replica={} of collection={} refers to unknown node={}",
                        replica.id, collection_id, node
                    );
                }
                meta.replicas
                    .put(Replica::new(replica.id, collection_id, replica.nodes));
            }
            recovery.insert(collection_id, snapshot.recovery);
            promoted.push((collection_id, snapshot.promote));
        }

        for report in self.reports {
            if nodes.get(report.node).is_none() {
                warn!("Report of unknown node={}", report.node);
            }
            dist.update_segments(report.node, report.segments);
            dist.update_leader_views(report.node, report.leader_views);
        }

        let broker: Arc<dyn Broker + Send + Sync> = Arc::new(SnapshotBroker::new(recovery));
        let targets = Arc::new(TargetManager::new(broker, Arc::clone(&meta)));
        for (collection_id, promote) in promoted {
            targets.update_collection_next_target(collection_id)?;
            if promote {
                targets.update_collection_current_target(collection_id);
                targets.update_collection_next_target(collection_id)?;
            }
        }
        info!("Installed cluster snapshot, collections={:?}", meta.collections.collection_ids());

        let balancer: Arc<dyn Balance + Send + Sync> = match config.balancer.policy {
            BalancePolicy::RoundRobin => Arc::new(RoundRobinBalancer::new(
                Arc::clone(&dist),
                Arc::clone(&nodes),
            )),
        };

        CheckerContext::builder()
            .meta(meta)
            .dist(dist)
            .targets(targets)
            .nodes(nodes)
            .balancer(balancer)
            .config(Arc::new(config))
            .build()
    }
}

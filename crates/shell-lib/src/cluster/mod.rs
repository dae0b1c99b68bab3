//! Cluster client adapter
//!
//! This module provides:
//! - The `ClusterApi` seam used by the launcher
//! - A kube-rs backed implementation with kubeconfig / in-cluster discovery
//! - Normalization of the reported control-plane version

mod kube_client;
mod version;

pub use kube_client::{ConnectOptions, KubeCluster};
pub use version::ClusterVersion;

use crate::error::Result;
use crate::workload::WorkloadDescriptor;

pub use async_trait::async_trait;

/// Read-only view of the cluster needed to build a debug shell
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch and normalize the control-plane version
    async fn cluster_version(&self) -> Result<ClusterVersion>;

    /// Fetch a point-in-time snapshot of a Deployment
    async fn workload(&self, namespace: &str, name: &str) -> Result<WorkloadDescriptor>;
}

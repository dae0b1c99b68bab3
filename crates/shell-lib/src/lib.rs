//! Core library for kubectl-application-shell
//!
//! This crate provides the core functionality for:
//! - Cluster version and Deployment lookups through the Kubernetes API
//! - Resolving a kubectl binary that matches the cluster version
//! - Synthesizing `kubectl run --overrides` documents from a live Deployment
//! - Composing and launching the debug pod command

pub mod binary;
pub mod cluster;
pub mod command;
pub mod error;
pub mod launcher;
pub mod overrides;
pub mod pod;
pub mod workload;

pub use binary::{BinaryResolver, DownloadProgress, HttpTransport, Platform, Resolution, ResolverConfig};
pub use cluster::{ClusterApi, ClusterVersion, ConnectOptions, KubeCluster};
pub use command::{launch, CommandResult, LaunchMode, ShellCommand};
pub use error::{Result, ShellError};
pub use launcher::{Launcher, PreparedShell, ShellRequest, Stage};
pub use overrides::{synthesize, OverrideDocument};
pub use pod::PodIdentity;
pub use workload::WorkloadDescriptor;

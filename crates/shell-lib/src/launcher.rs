//! End-to-end preparation of a debug shell
//!
//! Stages run strictly in order and any failure aborts the invocation:
//! version → binary → descriptor → overrides → command. There is no retry.

use crate::binary::{BinaryResolver, DownloadProgress, Platform, Resolution, Transport};
use crate::cluster::{ClusterApi, ClusterVersion};
use crate::command::{compose, ComposeRequest, ShellCommand, DEFAULT_POD_RUNNING_TIMEOUT};
use crate::error::Result;
use crate::overrides::{synthesize, OverrideDocument};
use crate::pod::PodIdentity;
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Progress of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    VersionResolved,
    BinaryResolved,
    DescriptorFetched,
    OverrideSynthesized,
    CommandComposed,
    Printed,
    Executed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::VersionResolved => "version_resolved",
            Stage::BinaryResolved => "binary_resolved",
            Stage::DescriptorFetched => "descriptor_fetched",
            Stage::OverrideSynthesized => "override_synthesized",
            Stage::CommandComposed => "command_composed",
            Stage::Printed => "printed",
            Stage::Executed => "executed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the user asked for
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub namespace: String,
    pub deployment: String,
    pub image: Option<String>,
    pub shell: String,
    pub shell_args: Vec<String>,
}

/// Everything produced before the command is printed or executed
#[derive(Debug, Clone)]
pub struct PreparedShell {
    pub version: ClusterVersion,
    pub resolution: Resolution,
    pub pod: PodIdentity,
    pub image: String,
    pub overrides: OverrideDocument,
    pub command: ShellCommand,
}

/// Drives the stages against an explicit cluster client and resolver
pub struct Launcher<'a, C, T> {
    cluster: &'a C,
    resolver: &'a BinaryResolver<T>,
    platform: Platform,
    pod_running_timeout: Duration,
    context: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl<'a, C: ClusterApi, T: Transport> Launcher<'a, C, T> {
    pub fn new(cluster: &'a C, resolver: &'a BinaryResolver<T>) -> Self {
        Self {
            cluster,
            resolver,
            platform: Platform::host(),
            pod_running_timeout: DEFAULT_POD_RUNNING_TIMEOUT,
            context: None,
            kubeconfig: None,
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn pod_running_timeout(mut self, timeout: Duration) -> Self {
        self.pod_running_timeout = timeout;
        self
    }

    /// Context and kubeconfig forwarded to the kubectl invocation
    pub fn cluster_selection(mut self, context: Option<String>, kubeconfig: Option<PathBuf>) -> Self {
        self.context = context;
        self.kubeconfig = kubeconfig;
        self
    }

    /// Run every stage up to a composed command
    pub async fn prepare<R: Rng + ?Sized>(
        &self,
        request: &ShellRequest,
        rng: &mut R,
        progress: &dyn DownloadProgress,
    ) -> Result<PreparedShell> {
        let mut stage = Stage::Start;
        let result = self.run_stages(request, rng, progress, &mut stage).await;

        if let Err(e) = &result {
            warn!(stage = %Stage::Failed, last_stage = %stage, error = %e, "Invocation aborted");
        }

        result
    }

    async fn run_stages<R: Rng + ?Sized>(
        &self,
        request: &ShellRequest,
        rng: &mut R,
        progress: &dyn DownloadProgress,
        stage: &mut Stage,
    ) -> Result<PreparedShell> {
        debug!(stage = %stage, namespace = %request.namespace, deployment = %request.deployment);

        let version = self.cluster.cluster_version().await?;
        *stage = Stage::VersionResolved;
        info!(stage = %stage, version = %version);

        let resolution = self
            .resolver
            .resolve(&version, &self.platform, progress)
            .await?;
        *stage = Stage::BinaryResolved;
        info!(stage = %stage, path = %resolution.path().display(), degraded = resolution.is_degraded());

        let descriptor = self
            .cluster
            .workload(&request.namespace, &request.deployment)
            .await?;
        *stage = Stage::DescriptorFetched;
        info!(stage = %stage, container = %descriptor.container.name);

        let overrides = synthesize(
            &descriptor,
            request.image.as_deref(),
            &request.shell,
            &request.shell_args,
        );
        *stage = Stage::OverrideSynthesized;
        let image = overrides.container().image.clone();
        debug!(stage = %stage, image = %image);

        let pod = PodIdentity::generate(&request.deployment, rng);
        let command = compose(&ComposeRequest {
            binary: resolution.path(),
            namespace: &request.namespace,
            pod: &pod,
            image: &image,
            overrides: &overrides,
            shell: &request.shell,
            pod_running_timeout: self.pod_running_timeout,
            context: self.context.as_deref(),
            kubeconfig: self.kubeconfig.as_deref(),
        })?;
        *stage = Stage::CommandComposed;
        info!(stage = %stage, pod = %pod);

        Ok(PreparedShell {
            version,
            resolution,
            pod,
            image,
            overrides,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::VersionResolved.to_string(), "version_resolved");
        assert_eq!(Stage::CommandComposed.to_string(), "command_composed");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }
}

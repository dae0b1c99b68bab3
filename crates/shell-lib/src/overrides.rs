//! Override document synthesis for `kubectl run --overrides`
//!
//! The document mirrors the first container of a Deployment (env, envFrom,
//! resources, volume mounts, volumes, template annotations) and replaces its
//! command with an interactive shell. Fields absent from the Deployment are
//! omitted rather than emitted as empty lists, because the strategic merge
//! treats an explicit empty list differently from a missing key.

use crate::error::Result;
use crate::workload::WorkloadDescriptor;
use k8s_openapi::api::core::v1::{EnvFromSource, EnvVar, ResourceRequirements, Volume, VolumeMount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation written by `kubectl apply` for declarative bookkeeping
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Partial pod definition layered onto the debug pod at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OverrideMetadata>,
    pub spec: OverrideSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideMetadata {
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideSpec {
    pub containers: Vec<OverrideContainer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideContainer {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_from: Option<Vec<EnvFromSource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
    pub stdin: bool,
    pub stdin_once: bool,
    pub tty: bool,
}

impl OverrideDocument {
    /// The debug container block
    pub fn container(&self) -> &OverrideContainer {
        // synthesize always produces exactly one container
        &self.spec.containers[0]
    }

    /// Compact JSON as passed to `--overrides`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build the override document for a debug shell
///
/// `user_image` replaces the Deployment's image when given; descriptors from
/// [`WorkloadDescriptor::from_deployment`] always carry one. The command is
/// always `[shell]` and `shell_args` become the container args.
pub fn synthesize(
    descriptor: &WorkloadDescriptor,
    user_image: Option<&str>,
    shell: &str,
    shell_args: &[String],
) -> OverrideDocument {
    let source = &descriptor.container;

    let image = user_image
        .map(str::to_string)
        .or_else(|| source.image.clone())
        .unwrap_or_default();

    let container = OverrideContainer {
        name: source.name.clone(),
        image,
        command: vec![shell.to_string()],
        args: shell_args.to_vec(),
        env: source.env.clone(),
        env_from: source.env_from.clone(),
        resources: source.resources.clone(),
        volume_mounts: source.volume_mounts.clone(),
        stdin: true,
        stdin_once: true,
        tty: true,
    };

    let mut annotations = descriptor.annotations.clone();
    annotations.remove(LAST_APPLIED_ANNOTATION);
    let metadata = (!annotations.is_empty()).then_some(OverrideMetadata { annotations });

    OverrideDocument {
        metadata,
        spec: OverrideSpec {
            containers: vec![container],
            volumes: descriptor.volumes.clone(),
        },
    }
}

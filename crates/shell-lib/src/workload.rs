//! Workload descriptor extracted from a live Deployment

use crate::error::{Result, ShellError};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Volume};
use std::collections::BTreeMap;

/// The parts of a Deployment needed to mirror its first container
///
/// Only spec data is kept. Object identity (uid, resourceVersion, owner
/// references) is dropped on extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadDescriptor {
    pub namespace: String,
    pub name: String,
    /// First container of the pod template
    pub container: Container,
    /// Pod-level volumes from the pod template
    pub volumes: Option<Vec<Volume>>,
    /// Pod template annotations
    pub annotations: BTreeMap<String, String>,
}

impl WorkloadDescriptor {
    pub fn from_deployment(namespace: &str, name: &str, deployment: Deployment) -> Result<Self> {
        let invalid = |reason: &str| ShellError::InvalidWorkload {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let template = deployment
            .spec
            .ok_or_else(|| invalid("deployment has no spec"))?
            .template;

        let annotations = template
            .metadata
            .and_then(|m| m.annotations)
            .unwrap_or_default();

        let pod_spec = template
            .spec
            .ok_or_else(|| invalid("pod template has no spec"))?;

        let container = pod_spec
            .containers
            .into_iter()
            .next()
            .ok_or_else(|| invalid("pod template has no containers"))?;

        if container.image.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("first container has no image"));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            container,
            volumes: pod_spec.volumes,
            annotations,
        })
    }
}

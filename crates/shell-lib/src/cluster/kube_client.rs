//! kube-rs backed cluster adapter

use super::{async_trait, ClusterApi, ClusterVersion};
use crate::error::{Result, ShellError};
use crate::workload::WorkloadDescriptor;
use k8s_openapi::api::apps::v1::Deployment;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// How to locate cluster credentials
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,
    /// Explicit kubeconfig file (otherwise KUBECONFIG / ~/.kube/config)
    pub kubeconfig: Option<PathBuf>,
    /// Connect timeout for API requests
    pub connect_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            context: None,
            kubeconfig: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Cluster adapter constructed once per invocation
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Resolve credentials and build a client
    ///
    /// Kubeconfig (with the requested context) is tried first, then the
    /// in-cluster service account. If neither works the error carries both
    /// reasons.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let mut config = load_config(options).await?;
        config.connect_timeout = Some(options.connect_timeout);

        let client = Client::try_from(config)
            .map_err(|e| ShellError::Config(format!("failed to build client: {}", e)))?;

        Ok(Self { client })
    }
}

async fn load_config(options: &ConnectOptions) -> Result<Config> {
    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..Default::default()
    };

    let from_kubeconfig = match &options.kubeconfig {
        Some(path) => match Kubeconfig::read_from(path) {
            Ok(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &kube_options).await,
            Err(e) => Err(e),
        },
        None => Config::from_kubeconfig(&kube_options).await,
    };

    let kubeconfig_err = match from_kubeconfig {
        Ok(config) => {
            debug!(
                context = options.context.as_deref().unwrap_or("<current>"),
                cluster_url = %config.cluster_url,
                "Loaded kubeconfig"
            );
            return Ok(config);
        }
        Err(e) => e,
    };

    debug!(error = %kubeconfig_err, "Kubeconfig unavailable, trying in-cluster credentials");

    match Config::incluster() {
        Ok(config) => {
            info!(cluster_url = %config.cluster_url, "Using in-cluster credentials");
            Ok(config)
        }
        Err(incluster_err) => Err(ShellError::Config(format!(
            "kubeconfig: {}; in-cluster: {}",
            kubeconfig_err, incluster_err
        ))),
    }
}

/// Convert a kube error at the adapter boundary
fn classify(call: &'static str, namespace: &str, name: &str, err: kube::Error) -> ShellError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ShellError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(response) => ShellError::Connectivity {
            call,
            reason: format!("{} ({}): {}", response.reason, response.code, response.message),
        },
        other => ShellError::Connectivity {
            call,
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn cluster_version(&self) -> Result<ClusterVersion> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| ShellError::Connectivity {
                call: "get cluster version",
                reason: e.to_string(),
            })?;

        debug!(git_version = %info.git_version, platform = %info.platform, "API server version");

        ClusterVersion::parse(&info.git_version)
    }

    async fn workload(&self, namespace: &str, name: &str) -> Result<WorkloadDescriptor> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);

        let deployment = deployments
            .get(name)
            .await
            .map_err(|e| classify("get deployment", namespace, name, e))?;

        WorkloadDescriptor::from_deployment(namespace, name, deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} happened", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify("get deployment", "payments", "api", api_error(404, "NotFound"));
        match err {
            ShellError::NotFound { namespace, name } => {
                assert_eq!(namespace, "payments");
                assert_eq!(name, "api");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_forbidden_is_connectivity() {
        let err = classify("get deployment", "payments", "api", api_error(403, "Forbidden"));
        match err {
            ShellError::Connectivity { call, reason } => {
                assert_eq!(call, "get deployment");
                assert!(reason.contains("Forbidden"));
                assert!(reason.contains("403"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_connect_options_default() {
        let options = ConnectOptions::default();
        assert!(options.context.is_none());
        assert!(options.kubeconfig.is_none());
        assert_eq!(options.connect_timeout, Duration::from_secs(5));
    }
}

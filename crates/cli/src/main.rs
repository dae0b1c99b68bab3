//! kubectl-application-shell
//!
//! Starts an interactive debug pod that mirrors the first container of a
//! Deployment (image, env, volumes, resources) using a kubectl that matches
//! the cluster version.

mod commands;
mod config;
mod output;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ShellConfig;
use crate::output::print_error;

/// Debug shell for a Kubernetes Deployment
#[derive(Parser)]
#[command(name = "kubectl-application-shell")]
#[command(author, version, about = "Start a debug shell that mirrors a Deployment's first container", long_about = None)]
pub struct Cli {
    /// Namespace of the deployment
    pub namespace: String,

    /// Deployment to debug
    pub deployment: String,

    /// Image to run in the debug pod (defaults to the deployment's image)
    #[arg(long)]
    pub image: Option<String>,

    /// Shell to run in the debug pod (defaults to /bin/bash)
    #[arg(long)]
    pub shell: Option<String>,

    /// Argument to pass to the shell, repeat for more than one
    #[arg(long = "args", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Run the debug pod instead of printing the command
    #[arg(long)]
    pub run: bool,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Path to kubeconfig file (uses KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Configuration file (defaults to ~/.config/kubectl-application-shell/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for cached kubectl binaries
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

/// Filter used when RUST_LOG is not set
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "shell_lib=debug,kubectl_application_shell=debug,warn"
    } else {
        "warn"
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match ShellConfig::load(cli.config.as_deref()) {
        Ok(config) => commands::shell::open_shell(&cli, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

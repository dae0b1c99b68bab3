//! Debug shell command

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shell_lib::binary::DEFAULT_BINARY_NAME;
use shell_lib::{
    launch, BinaryResolver, CommandResult, ConnectOptions, HttpTransport, KubeCluster, LaunchMode,
    Launcher, Resolution, ResolverConfig, ShellRequest, Stage,
};
use tracing::info;

use crate::config::ShellConfig;
use crate::output::{highlight, print_info, print_success, print_warning, DownloadBar};
use crate::Cli;

/// Exit code used when the user interrupts preparation
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Prepare the debug pod command, then print or run it
///
/// Returns the process exit code.
pub async fn open_shell(cli: &Cli, config: &ShellConfig) -> Result<i32> {
    print_info(&format!(
        "Starting {} in {}",
        highlight(&cli.deployment),
        highlight(&cli.namespace)
    ));
    print_info("Checking your environment...");

    let cluster = KubeCluster::connect(&ConnectOptions {
        context: cli.context.clone(),
        kubeconfig: cli.kubeconfig.clone(),
        connect_timeout: config.connect_timeout(),
    })
    .await?;

    let resolver = BinaryResolver::new(
        ResolverConfig {
            cache_root: cli.cache_dir.clone().unwrap_or_else(|| config.cache_dir.clone()),
            url_template: config.download_url_template.clone(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
        },
        HttpTransport::new(config.connect_timeout())?,
    );

    let launcher = Launcher::new(&cluster, &resolver)
        .pod_running_timeout(config.pod_running_timeout())
        .cluster_selection(cli.context.clone(), cli.kubeconfig.clone());

    let request = ShellRequest {
        namespace: cli.namespace.clone(),
        deployment: cli.deployment.clone(),
        image: cli.image.clone(),
        shell: cli.shell.clone().unwrap_or_else(|| config.default_shell.clone()),
        shell_args: cli.args.clone(),
    };

    let progress = DownloadBar::new();
    let mut rng = StdRng::from_entropy();

    // dropping the preparation future discards any partial download
    let prepared = tokio::select! {
        prepared = launcher.prepare(&request, &mut rng, &progress) => prepared?,
        _ = tokio::signal::ctrl_c() => {
            progress.abandon();
            print_warning("Interrupted, nothing was started");
            return Ok(INTERRUPTED_EXIT_CODE);
        }
    };

    print_info(&format!(
        "Detected cluster version {}, using a matching kubectl",
        highlight(prepared.version.as_str())
    ));

    match &prepared.resolution {
        Resolution::Cached(path) | Resolution::Downloaded(path) => {
            print_success(&format!("kubectl resolved: {}", path.display()));
        }
        Resolution::Fallback { path, reason } => {
            print_warning(&format!("Unable to download kubectl: {}", reason));
            print_warning(&format!("Falling back to {} from PATH", path.display()));
        }
    }

    let mode = if cli.run {
        LaunchMode::Execute
    } else {
        LaunchMode::Print
    };

    if mode == LaunchMode::Execute {
        print_info(&format!("Running debug pod {}", highlight(prepared.pod.as_str())));
    }

    match launch(&prepared.command, mode).await? {
        CommandResult::Printed(line) => {
            info!(stage = %Stage::Printed, pod = %prepared.pod);
            print_success(
                "Ready! Run this command to start your shell (or add --run to run it automatically):",
            );
            println!("{}", line);
            Ok(0)
        }
        CommandResult::Executed { exit_code } => {
            info!(stage = %Stage::Executed, exit_code);
            Ok(exit_code)
        }
    }
}

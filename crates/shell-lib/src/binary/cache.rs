//! Version-matched kubectl cache
//!
//! Layout: `<cache_root>/<version>/kubectl`. A binary only ever appears at
//! that path through an atomic rename of a fully written, already executable
//! temporary file, so existence is the whole validity check.

use super::lock::CacheLock;
use super::platform::Platform;
use super::transport::{DownloadProgress, HttpTransport, Transport};
use crate::cluster::ClusterVersion;
use crate::error::{Result, ShellError};
use futures::StreamExt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use url::Url;

/// Release location of kubectl binaries
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://dl.k8s.io/release/{version}/bin/{os}/{arch}/{binary}";

pub const DEFAULT_BINARY_NAME: &str = "kubectl";

/// Configuration for the binary cache
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Per-user cache root, one subdirectory per version
    pub cache_root: PathBuf,
    /// Download URL with `{version}`, `{os}`, `{arch}` and `{binary}` placeholders
    pub url_template: String,
    pub binary_name: String,
}

impl ResolverConfig {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
        }
    }
}

/// How the kubectl binary was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Already present in the cache
    Cached(PathBuf),
    /// Downloaded by this call
    Downloaded(PathBuf),
    /// Download failed, using a binary found on PATH instead
    Fallback { path: PathBuf, reason: String },
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Cached(path) | Resolution::Downloaded(path) => path,
            Resolution::Fallback { path, .. } => path,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

type PathLookup = Box<dyn Fn(&str) -> Option<PathBuf> + Send + Sync>;

/// Resolves a kubectl binary matching a cluster version
pub struct BinaryResolver<T = HttpTransport> {
    config: ResolverConfig,
    transport: T,
    path_lookup: PathLookup,
}

impl<T: Transport> BinaryResolver<T> {
    pub fn new(config: ResolverConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            path_lookup: Box::new(|name| which::which(name).ok()),
        }
    }

    /// Replace the PATH search used when a download fails
    pub fn with_path_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.path_lookup = Box::new(lookup);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache_dir(&self, version: &ClusterVersion) -> PathBuf {
        self.config.cache_root.join(version.as_str())
    }

    pub fn binary_path(&self, version: &ClusterVersion, platform: &Platform) -> PathBuf {
        self.cache_dir(version)
            .join(platform.executable_name(&self.config.binary_name))
    }

    fn lock_path(&self, version: &ClusterVersion) -> PathBuf {
        self.config
            .cache_root
            .join(format!("{}.lock", version.as_str()))
    }

    pub fn download_url(&self, version: &ClusterVersion, platform: &Platform) -> Result<Url> {
        let rendered = self
            .config
            .url_template
            .replace("{version}", version.as_str())
            .replace("{os}", &platform.os)
            .replace("{arch}", &platform.arch)
            .replace("{binary}", &platform.executable_name(&self.config.binary_name));

        Url::parse(&rendered).map_err(|e| {
            ShellError::Config(format!("invalid download URL {:?}: {}", rendered, e))
        })
    }

    /// Return a kubectl for `version`, downloading it on first use
    pub async fn resolve(
        &self,
        version: &ClusterVersion,
        platform: &Platform,
        progress: &dyn DownloadProgress,
    ) -> Result<Resolution> {
        let target = self.binary_path(version, platform);

        if target.exists() {
            debug!(path = %target.display(), "Using cached kubectl");
            return Ok(Resolution::Cached(target));
        }

        info!(version = %version, platform = %platform, "Downloading kubectl");

        let reason = match self.download(version, platform, &target, progress).await {
            Ok(resolution) => return Ok(resolution),
            Err(reason) => reason,
        };

        progress.failed();
        warn!(version = %version, reason = %reason, "kubectl download failed");

        match (self.path_lookup)(&self.config.binary_name) {
            Some(path) => {
                warn!(path = %path.display(), "Falling back to kubectl on PATH");
                Ok(Resolution::Fallback { path, reason })
            }
            None => Err(ShellError::Download {
                version: version.to_string(),
                reason,
            }),
        }
    }

    async fn download(
        &self,
        version: &ClusterVersion,
        platform: &Platform,
        target: &Path,
        progress: &dyn DownloadProgress,
    ) -> std::result::Result<Resolution, String> {
        let root = &self.config.cache_root;
        create_private_dir(root)
            .map_err(|e| format!("failed to create {}: {}", root.display(), e))?;

        let _lock = CacheLock::acquire(&self.lock_path(version))
            .await
            .map_err(|e| e.to_string())?;

        // another process may have finished while we waited
        if target.exists() {
            debug!(path = %target.display(), "kubectl appeared while waiting for lock");
            return Ok(Resolution::Cached(target.to_path_buf()));
        }

        // the version directory is only created and removed under the lock
        let dir = self.cache_dir(version);
        let result = self.install(&dir, version, platform, target, progress).await;
        if result.is_err() {
            remove_empty_dir(&dir);
        }
        result
    }

    async fn install(
        &self,
        dir: &Path,
        version: &ClusterVersion,
        platform: &Platform,
        target: &Path,
        progress: &dyn DownloadProgress,
    ) -> std::result::Result<Resolution, String> {
        create_private_dir(dir)
            .map_err(|e| format!("failed to create {}: {}", dir.display(), e))?;

        let url = self
            .download_url(version, platform)
            .map_err(|e| e.to_string())?;
        let mut staged = StagedBinary::create(dir)
            .map_err(|e| format!("failed to stage download in {}: {}", dir.display(), e))?;

        let download = self.transport.fetch(&url).await.map_err(|e| e.to_string())?;
        let expected = download.content_length;
        progress.started(expected);

        let mut body = download.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            staged
                .write(&chunk)
                .map_err(|e| format!("failed to write download: {}", e))?;
            progress.advanced(chunk.len() as u64);
        }

        match expected {
            Some(total) if total != staged.written => {
                return Err(format!(
                    "download truncated: received {} of {} bytes",
                    staged.written, total
                ));
            }
            _ if staged.written == 0 => return Err(format!("{} returned an empty body", url)),
            _ => {}
        }

        let written = staged.written;
        staged
            .commit(target)
            .map_err(|e| format!("failed to install {}: {}", target.display(), e))?;
        progress.finished();

        info!(path = %target.display(), bytes = written, "kubectl cached");
        Ok(Resolution::Downloaded(target.to_path_buf()))
    }
}

/// Temporary file inside the version directory
///
/// Dropped without `commit` (error or cancelled future), the file is deleted
/// and the version directory removed if nothing else is in it.
struct StagedBinary {
    file: Option<NamedTempFile>,
    dir: PathBuf,
    written: u64,
}

impl StagedBinary {
    fn create(dir: &Path) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(dir)?;

        Ok(Self {
            file: Some(file),
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "download already committed"))?;
        file.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn commit(mut self, target: &Path) -> io::Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "download already committed"))?;

        file.flush()?;
        file.as_file().sync_all()?;
        set_executable(file.path())?;
        file.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Drop for StagedBinary {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            remove_empty_dir(&self.dir);
        }
    }
}

fn remove_empty_dir(dir: &Path) {
    // fails harmlessly when the directory holds a binary or another download
    if fs::remove_dir(dir).is_ok() {
        debug!(path = %dir.display(), "Removed empty cache directory");
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

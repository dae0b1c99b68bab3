//! Host platform in kubectl release vocabulary

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running process
    pub fn host() -> Self {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust target names to the names used on dl.k8s.io
    pub fn from_target(os: &str, arch: &str) -> Self {
        Self::from_parts(os, arch, cfg!(target_endian = "little"))
    }

    fn from_parts(os: &str, arch: &str, little_endian: bool) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            // only little-endian ppc64 binaries are published
            "powerpc64" if little_endian => "ppc64le",
            other => other,
        };
        Self::new(os, arch)
    }

    /// File name of `binary` on this platform
    pub fn executable_name(&self, binary: &str) -> String {
        if self.os == "windows" {
            format!("{}.exe", binary)
        } else {
            binary.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_target() {
        assert_eq!(Platform::from_target("linux", "x86_64"), Platform::new("linux", "amd64"));
        assert_eq!(Platform::from_target("macos", "aarch64"), Platform::new("darwin", "arm64"));
        assert_eq!(Platform::from_target("linux", "s390x"), Platform::new("linux", "s390x"));
    }

    #[test]
    fn test_ppc64_depends_on_endianness() {
        assert_eq!(Platform::from_parts("linux", "powerpc64", true).arch, "ppc64le");
        assert_eq!(Platform::from_parts("linux", "powerpc64", false).arch, "powerpc64");
    }

    #[test]
    fn test_executable_name() {
        assert_eq!(Platform::new("linux", "amd64").executable_name("kubectl"), "kubectl");
        assert_eq!(Platform::new("windows", "amd64").executable_name("kubectl"), "kubectl.exe");
    }
}

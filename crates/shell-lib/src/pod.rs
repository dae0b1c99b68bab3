//! Debug pod naming

use rand::Rng;
use std::fmt;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 5;

/// `debug-<workload>-<suffix>` pod name
///
/// Generated fresh per invocation. Collisions are not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIdentity(String);

impl PodIdentity {
    /// Generate a name for `workload` using the supplied random source
    pub fn generate<R: Rng + ?Sized>(workload: &str, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
            .collect();
        Self(format!("debug-{}-{}", workload, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The random part of the name
    pub fn suffix(&self) -> &str {
        &self.0[self.0.len() - SUFFIX_LEN..]
    }
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

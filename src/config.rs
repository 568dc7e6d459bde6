//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Default number of levels a tag path may span (`A.B.C.D` is the deepest).
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Tunables for a [`TagRegistry`](crate::TagRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of segments in a full path. A root tag has one.
    pub max_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RegistryConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

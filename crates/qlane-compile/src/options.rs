//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Options controlling one compilation run.
///
/// Every field has a default, so a partial YAML or JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// 0 replaces every barrier by `Sync`/`Wait`; 1 runs timing analysis
    /// and pads deterministic blocks. Higher values behave as 1.
    pub optimization_level: u8,
    /// Emit a `Wait` for the entry trigger in place of the first barrier.
    pub initial_wait: bool,
    /// Run the verification passes after resolution.
    pub verify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimization_level: 1,
            initial_wait: true,
            verify: true,
        }
    }
}

impl CompileOptions {
    /// Set the optimization level, clamped to 0..=1.
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(1);
        self
    }

    #[must_use]
    pub fn with_initial_wait(mut self, initial_wait: bool) -> Self {
        self.initial_wait = initial_wait;
        self
    }

    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

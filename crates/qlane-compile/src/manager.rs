//! Pass manager for the post-lowering pipeline.

use tracing::{debug, info, instrument};

use qlane_ir::Schedule;

use crate::error::CompileResult;
use crate::options::CompileOptions;
use crate::pass::Pass;
use crate::passes::{BarrierFreeVerification, BarrierResolution, FullSynchronization, LabelVerification};
use crate::property::PropertySet;

/// Manages and executes a sequence of schedule passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the registered passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on the given schedule.
    #[instrument(skip(self, schedule, properties), fields(schedule = %schedule.name))]
    pub fn run(&self, schedule: &mut Schedule, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on schedule with {} lanes",
            self.passes.len(),
            schedule.num_lanes()
        );

        for pass in &self.passes {
            if pass.should_run(schedule, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(schedule, properties)?;
                debug!(
                    "Pass {} completed, instructions: {}",
                    pass.name(),
                    schedule.num_instructions()
                );
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, instructions: {}",
            schedule.num_instructions()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0 or 1).
    optimization_level: u8,
    verify: bool,
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 1,
            verify: true,
            properties: PropertySet::new(),
        }
    }

    /// Take level and verification from compile options.
    pub fn from_options(options: &CompileOptions) -> Self {
        Self::new()
            .with_optimization_level(options.optimization_level)
            .with_verification(options.verify)
    }

    /// Set the optimization level.
    ///
    /// - Level 0: every barrier becomes `Sync`/`Wait`
    /// - Level 1: barriers of deterministic blocks become padding (default)
    ///
    /// Higher levels are clamped to 1.
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(1);
        self
    }

    /// Enable or disable the verification passes.
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Set the initial properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();

        if self.optimization_level == 0 {
            pm.add_pass(FullSynchronization);
        } else {
            pm.add_pass(BarrierResolution);
        }

        if self.verify {
            pm.add_pass(BarrierFreeVerification);
            pm.add_pass(LabelVerification);
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlane_ir::{BarrierId, Instruction, LaneId, LaneSequence};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_builder_levels() {
        let (pm, _) = PassManagerBuilder::new().build();
        assert_eq!(
            pm.pass_names(),
            vec!["barrier_resolution", "barrier_free_verification", "label_verification"]
        );

        let (pm, _) = PassManagerBuilder::new()
            .with_optimization_level(0)
            .with_verification(false)
            .build();
        assert_eq!(pm.pass_names(), vec!["full_synchronization"]);
    }

    #[test]
    fn test_high_levels_resolve_like_level_one() {
        let builder = PassManagerBuilder::new().with_optimization_level(7);
        assert_eq!(builder.optimization_level, 1);
        let (pm, _) = builder.with_verification(false).build();
        assert_eq!(pm.pass_names(), vec!["barrier_resolution"]);
    }

    #[test]
    fn test_pass_manager_run() {
        let members = [LaneId(0), LaneId(1)];
        let lanes = vec![
            LaneSequence::with_instructions(
                LaneId(0),
                [Instruction::pulse("X", 10), Instruction::barrier(BarrierId(0), members)],
            ),
            LaneSequence::with_instructions(
                LaneId(1),
                [Instruction::barrier(BarrierId(0), members)],
            ),
        ];
        let mut schedule = Schedule::with_lanes("f", lanes).unwrap();
        let (pm, mut props) = PassManagerBuilder::new().build();
        pm.run(&mut schedule, &mut props).unwrap();

        assert!(schedule.is_barrier_free());
        assert_eq!(schedule.lanes[1].instructions, vec![Instruction::delay(10)]);
    }
}

//! Pass trait and types for schedule passes.

use qlane_ir::Schedule;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Checks the schedule without changing it.
    Analysis,
    /// Rewrites lane sequences.
    Transformation,
}

/// A pass over the lane sequences of one function.
///
/// Passes run after lowering and barrier insertion. They communicate through
/// the [`PropertySet`].
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given schedule.
    fn run(&self, schedule: &mut Schedule, properties: &mut PropertySet) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _schedule: &Schedule, _properties: &PropertySet) -> bool {
        true
    }
}

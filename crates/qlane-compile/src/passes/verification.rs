//! Verification passes for lowered schedules.
//!
//! These run last and catch lowering or resolution bugs before the schedule
//! reaches hardware compilation.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use qlane_ir::{Label, Schedule};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::passes::resolution::resolution_bailed_out;
use crate::property::PropertySet;

/// Checks that no `Barrier` survived resolution.
///
/// Skipped when resolution bailed out on mismatched barrier counts; those
/// lanes are passed through intentionally and reported as a warning.
pub struct BarrierFreeVerification;

impl Pass for BarrierFreeVerification {
    fn name(&self) -> &'static str {
        "barrier_free_verification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn should_run(&self, _schedule: &Schedule, properties: &PropertySet) -> bool {
        !resolution_bailed_out(properties)
    }

    fn run(&self, schedule: &mut Schedule, _properties: &mut PropertySet) -> CompileResult<()> {
        for lane in &schedule.lanes {
            let count = lane.barrier_count();
            if count > 0 {
                return Err(CompileError::BarrierRemaining {
                    lane: lane.lane,
                    count,
                });
            }
        }
        Ok(())
    }
}

/// Label statistics gathered by [`LabelVerification`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSummary {
    /// Labels defined across all lanes.
    pub defined: usize,
    /// Jump instructions checked.
    pub jumps: usize,
}

/// Checks that every jump target is defined exactly once in its lane.
pub struct LabelVerification;

impl Pass for LabelVerification {
    fn name(&self) -> &'static str {
        "label_verification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, schedule: &mut Schedule, properties: &mut PropertySet) -> CompileResult<()> {
        let mut summary = LabelSummary::default();

        for lane in &schedule.lanes {
            let mut defined: FxHashSet<&Label> = FxHashSet::default();
            for label in lane.iter().filter_map(|i| i.defined_label()) {
                if !defined.insert(label) {
                    return Err(CompileError::DuplicateLabel {
                        lane: lane.lane,
                        label: label.clone(),
                    });
                }
            }

            let mut uses: FxHashMap<&Label, usize> = FxHashMap::default();
            for target in lane.iter().filter_map(|i| i.target()) {
                *uses.entry(target).or_default() += 1;
                summary.jumps += 1;
            }
            if let Some(label) = uses.keys().find(|l| !defined.contains(*l)) {
                return Err(CompileError::UndefinedLabel {
                    lane: lane.lane,
                    label: (*label).clone(),
                });
            }
            summary.defined += defined.len();
        }

        debug!(
            "Label verification passed: {} labels, {} jumps",
            summary.defined, summary.jumps
        );
        properties.insert(summary);
        Ok(())
    }
}

//! Barrier resolution passes.

use tracing::debug;

use qlane_ir::Schedule;

use crate::error::CompileResult;
use crate::pass::{Pass, PassKind};
use crate::property::PropertySet;
use crate::resolve::{ResolutionReport, resolve_barriers, synchronize_all};

/// Replaces barriers by alignment padding where block timing is known, and
/// by `Sync`/`Wait` elsewhere.
///
/// Stores a [`ResolutionReport`] in the property set.
pub struct BarrierResolution;

impl Pass for BarrierResolution {
    fn name(&self) -> &'static str {
        "barrier_resolution"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, schedule: &mut Schedule, properties: &mut PropertySet) -> CompileResult<()> {
        let report = resolve_barriers(&mut schedule.lanes)?;
        debug!(
            "Resolved {} barrier ranks in '{}': {} elided, {} padded, {} synchronized",
            report.ranks, schedule.name, report.elided, report.padded, report.synchronized
        );
        properties.insert(report);
        Ok(())
    }
}

/// Replaces every barrier by `Sync`/`Wait` without timing analysis.
///
/// Used at optimization level 0.
pub struct FullSynchronization;

impl Pass for FullSynchronization {
    fn name(&self) -> &'static str {
        "full_synchronization"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, schedule: &mut Schedule, properties: &mut PropertySet) -> CompileResult<()> {
        let report = synchronize_all(&mut schedule.lanes);
        debug!("Synchronized {} barrier ranks in '{}'", report.synchronized, schedule.name);
        properties.insert(report);
        Ok(())
    }
}

/// Check whether a resolution pass already ran and bailed out.
pub(crate) fn resolution_bailed_out(properties: &PropertySet) -> bool {
    properties
        .get::<ResolutionReport>()
        .is_some_and(ResolutionReport::is_mismatch)
}

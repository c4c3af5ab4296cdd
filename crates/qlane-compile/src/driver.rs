//! Compilation driver.
//!
//! Runs the full pipeline over every function of a [`Program`]: lowering,
//! barrier insertion and the pass pipeline. Errors abandon the function they
//! occur in; the remaining functions are still compiled so that one run
//! reports as many problems as possible. Output is only released when no
//! error was recorded.

use serde::Serialize;
use tracing::{info, instrument, warn};

use qlane_ir::ast::{Function, Program};
use qlane_ir::Schedule;

use crate::diagnostics::{Diagnostic, codes};
use crate::error::{CompileError, CompileResult, FlattenError};
use crate::flatten::Flattener;
use crate::labels::LabelManager;
use crate::manager::PassManagerBuilder;
use crate::options::CompileOptions;
use crate::property::PropertySet;
use crate::resolve::ResolutionReport;
use crate::sync::SyncInserter;

/// One successfully compiled function.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledFunction {
    pub schedule: Schedule,
    pub report: Option<ResolutionReport>,
}

/// Result of compiling a program.
#[derive(Debug, Default)]
pub struct CompileOutput {
    /// Functions that compiled, in source order.
    pub functions: Vec<CompiledFunction>,
    /// Everything reported during the run, in the order it was found.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Check whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics below error level.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Release the compiled functions, or every diagnostic if any error was
    /// recorded.
    pub fn into_result(self) -> Result<Vec<CompiledFunction>, Vec<Diagnostic>> {
        if self.has_errors() {
            Err(self.diagnostics)
        } else {
            Ok(self.functions)
        }
    }
}

/// Compiles programs. Owns the label counter, so one compiler must not be
/// shared between concurrent runs.
pub struct Compiler {
    options: CompileOptions,
    labels: LabelManager,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            labels: LabelManager::new(),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile every function of `program`.
    #[instrument(skip(self, program), fields(functions = program.functions.len()))]
    pub fn compile(&mut self, program: &Program) -> CompileOutput {
        self.labels.reset();
        let mut output = CompileOutput::default();

        for function in &program.functions {
            match self.compile_function(function) {
                Ok(compiled) => {
                    if let Some(counts) = compiled.report.as_ref().and_then(|r| r.mismatch.as_ref()) {
                        output.diagnostics.push(mismatch_warning(function, counts));
                    }
                    output.functions.push(compiled);
                }
                Err(err) => {
                    warn!(function = %function.name, "abandoning function: {err}");
                    let abort = matches!(
                        err,
                        CompileError::Label(_) | CompileError::Flatten(FlattenError::Label(_))
                    );
                    output.diagnostics.push(
                        Diagnostic::from_error(&err)
                            .with_function(&function.name)
                            .or_location(function.location),
                    );
                    if abort {
                        break;
                    }
                }
            }
        }

        info!(
            "Compiled {} of {} functions, {} label groups, {} diagnostics",
            output.functions.len(),
            program.functions.len(),
            self.labels.allocated(),
            output.diagnostics.len()
        );
        output
    }

    /// Compile one function.
    ///
    /// Labels allocated here stay allocated, so calling this repeatedly on one
    /// compiler keeps labels unique across functions.
    #[instrument(skip(self, function), fields(function = %function.name))]
    pub fn compile_function(&mut self, function: &Function) -> CompileResult<CompiledFunction> {
        let mut flattened = Vec::with_capacity(function.lanes.len());
        for lane in &function.lanes {
            let flat = Flattener::new(&mut self.labels).flatten(&lane.body)?;
            flattened.push((lane.lane, flat));
        }

        let sequences = SyncInserter::new(self.options.initial_wait).insert(flattened);
        let mut schedule = Schedule::with_lanes(function.name.clone(), sequences)?;
        let report = self.resolve_schedule(&mut schedule)?;

        Ok(CompiledFunction { schedule, report })
    }

    /// Run the pass pipeline on an already lowered schedule.
    pub fn resolve_schedule(&self, schedule: &mut Schedule) -> CompileResult<Option<ResolutionReport>> {
        let (pm, mut properties) = PassManagerBuilder::from_options(&self.options)
            .with_properties(PropertySet::new().with_function(schedule.name.clone()))
            .build();
        pm.run(schedule, &mut properties)?;
        Ok(properties.remove::<ResolutionReport>())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

fn mismatch_warning(function: &Function, counts: &[usize]) -> Diagnostic {
    let detail = function
        .lanes
        .iter()
        .zip(counts)
        .map(|(lane, count)| format!("{}: {count}", lane.lane))
        .collect::<Vec<_>>()
        .join(", ");
    Diagnostic::warning(format!(
        "lanes have different barrier counts ({detail}); barriers left unresolved"
    ))
    .with_code(codes::MISMATCHED_BARRIERS)
    .with_function(&function.name)
    .with_location(function.location)
    .with_hint("every lane must take part in the same sequence of concurrent blocks")
}

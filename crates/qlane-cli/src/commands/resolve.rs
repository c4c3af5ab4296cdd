//! Resolve command implementation.

use anyhow::{Context, Result};
use std::fs;

use qlane_compile::diagnostics::codes;
use qlane_compile::{CompileOptions, Compiler, Diagnostic};
use qlane_ir::Schedule;

use super::common::{print_diagnostics, write_json};

/// Execute the resolve command.
pub fn execute(input: &str, output: Option<&str>, optimization_level: u8) -> Result<()> {
    let source = fs::read_to_string(input).with_context(|| format!("Failed to read file: {input}"))?;
    let mut schedule =
        Schedule::from_json(&source).with_context(|| format!("Failed to parse schedule: {input}"))?;

    let options = CompileOptions::default().with_optimization_level(optimization_level);
    let compiler = Compiler::new(options);

    match compiler.resolve_schedule(&mut schedule) {
        Ok(Some(report)) if report.is_mismatch() => {
            print_diagnostics(&[Diagnostic::warning(format!(
                "lanes have different barrier counts {:?}; barriers left unresolved",
                report.mismatch.unwrap_or_default()
            ))
            .with_code(codes::MISMATCHED_BARRIERS)
            .with_function(&schedule.name)]);
        }
        Ok(_) => {}
        Err(err) => {
            let diag = Diagnostic::from_error(&err).with_function(&schedule.name);
            print_diagnostics(&[diag]);
            anyhow::bail!("barrier resolution failed for '{}'", schedule.name);
        }
    }

    write_json(&schedule, output)
}

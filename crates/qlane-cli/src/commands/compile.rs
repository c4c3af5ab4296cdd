//! Compile command implementation.

use anyhow::Result;
use console::style;
use std::path::Path;

use qlane_compile::Compiler;

use super::common::{load_options, load_program, print_diagnostics, write_json};

/// Execute the compile command.
pub fn execute(
    input: &str,
    output: Option<&str>,
    config: Option<&str>,
    optimization_level: Option<u8>,
    no_initial_wait: bool,
) -> Result<()> {
    println!(
        "{} Compiling {}",
        style("→").cyan().bold(),
        style(input).green()
    );

    let mut options = load_options(config)?;
    if let Some(level) = optimization_level {
        options = options.with_optimization_level(level);
    }
    if no_initial_wait {
        options = options.with_initial_wait(false);
    }

    let program = load_program(input)?;
    println!(
        "  Loaded: {} functions (level {})",
        program.functions.len(),
        options.optimization_level
    );

    let output_data = Compiler::new(options).compile(&program);
    print_diagnostics(&output_data.diagnostics);

    let functions = match output_data.into_result() {
        Ok(functions) => functions,
        Err(diagnostics) => {
            let errors = diagnostics.iter().filter(|d| d.is_error()).count();
            anyhow::bail!("compilation failed with {errors} error(s); no output written");
        }
    };

    println!("{} Compilation complete", style("✓").green().bold());
    for function in &functions {
        let report = function.report.clone().unwrap_or_default();
        println!(
            "  {}: {} lanes, {} instructions, {} padded / {} synchronized",
            style(&function.schedule.name).yellow(),
            function.schedule.num_lanes(),
            function.schedule.num_instructions(),
            report.padded,
            report.synchronized
        );
    }

    let output_path = output.map_or_else(|| default_output(input), str::to_string);
    write_json(&functions, Some(&output_path))?;
    println!("  Output: {}", style(&output_path).green());

    Ok(())
}

fn default_output(input: &str) -> String {
    let p = Path::new(input);
    let stem = p.file_stem().unwrap_or_default().to_string_lossy();
    p.with_file_name(format!("{stem}_schedule.json"))
        .to_string_lossy()
        .into_owned()
}

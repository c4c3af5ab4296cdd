//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use qlane_compile::{CompileOptions, DiagLevel, Diagnostic};
use qlane_ir::ast::Program;

/// Read a file, failing with a readable message if it does not exist.
fn read_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a program from a JSON or YAML file.
pub fn load_program(path: &str) -> Result<Program> {
    let source = read_source(path)?;
    match extension(path).as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse program: {path}")),
        _ => serde_json::from_str(&source).with_context(|| format!("Failed to parse program: {path}")),
    }
}

/// Load compiler options. Without a path the defaults are used.
pub fn load_options(path: Option<&str>) -> Result<CompileOptions> {
    let Some(path) = path else {
        return Ok(CompileOptions::default());
    };
    let source = read_source(path)?;
    // YAML is a superset of JSON, so one parser covers both.
    serde_yaml_ng::from_str(&source).with_context(|| format!("Invalid configuration: {path}"))
}

/// Write a value as pretty JSON to `path`, or to stdout if `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))
        }
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// Print diagnostics to stderr, colored by severity.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let tag = match diag.level {
            DiagLevel::Warning => style("warning").yellow().bold(),
            DiagLevel::Error => style("error").red().bold(),
            DiagLevel::Fatal => style("fatal").red().bold(),
        };
        let code = diag.code.map(|c| format!("[{c}]")).unwrap_or_default();
        eprintln!("{tag}{code}: {}", diag.message);
        match (&diag.function, &diag.location) {
            (Some(function), Some(location)) => eprintln!("  --> in '{function}' at {location}"),
            (Some(function), None) => eprintln!("  --> in '{function}'"),
            (None, Some(location)) => eprintln!("  --> at {location}"),
            (None, None) => {}
        }
        if let Some(hint) = &diag.hint {
            eprintln!("  {} {hint}", style("hint:").cyan());
        }
    }
}

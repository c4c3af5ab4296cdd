//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - control-flow lowering and lane alignment",
        style("qlane").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qlane-ir       Lane instructions, schedules and statement tree");
    println!("  qlane-compile  Lowering, barrier insertion and resolution");
    println!("  qlane-cli      Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/qlane-dev/qlane").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}

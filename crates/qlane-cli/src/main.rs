//! qlane Command-Line Interface
//!
//! Lowers per-lane control programs and aligns their timing.
//!
//! ```text
//!   ch0  |--X90--|          |==MEAS==|--?--|
//!   ch1  |----Y90----|      |--Z--|.........
//!         ^ Wait      pad ^ ^ barrier    ^ Sync/Wait
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{compile, resolve, version};

/// qlane - control-flow lowering and lane alignment for pulse programs
#[derive(Parser)]
#[command(name = "qlane")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program (JSON or YAML) into aligned lane schedules
    Compile {
        /// Input program file
        #[arg(short, long)]
        input: String,

        /// Output file (defaults to <input>_schedule.json)
        #[arg(short, long)]
        output: Option<String>,

        /// Compiler configuration file (YAML or JSON)
        #[arg(short, long, env = "QLANE_CONFIG")]
        config: Option<String>,

        /// Optimization level (0 or 1), overrides the configuration file
        #[arg(long)]
        optimization_level: Option<u8>,

        /// Do not turn the first barrier into an entry-trigger Wait
        #[arg(long)]
        no_initial_wait: bool,
    },

    /// Resolve the barriers of an already lowered schedule (JSON)
    Resolve {
        /// Input schedule file
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Optimization level (0 or 1)
        #[arg(long, default_value = "1")]
        optimization_level: u8,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            config,
            optimization_level,
            no_initial_wait,
        } => compile::execute(
            &input,
            output.as_deref(),
            config.as_deref(),
            optimization_level,
            no_initial_wait,
        ),

        Commands::Resolve {
            input,
            output,
            optimization_level,
        } => resolve::execute(&input, output.as_deref(), optimization_level),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

//! qlane Lowering and Barrier Alignment
//!
//! This crate turns the structured per-lane statement lists produced by the
//! front end into flat, mutually aligned lane sequences for downstream
//! hardware compilation.
//!
//! # Overview
//!
//! Each function goes through three stages:
//! 1. **Flattening**: structured control flow (while, if, repeat, break,
//!    continue) becomes labels, jumps and subroutine calls
//! 2. **Synchronization**: every concurrent block gets symmetric barriers in
//!    every lane
//! 3. **Resolution**: barriers become padding delays where timing is known,
//!    and genuine `Sync`/`Wait` pairs where it is not
//!
//! # Architecture
//!
//! ```text
//! Program (per-lane statements)
//!       |
//!       v
//! Flattener  <-- LabelManager (one per compilation run)
//!       |
//!       v
//! SyncInserter
//!       |
//!       v
//! PassManager  <-- PropertySet (ResolutionReport, LabelSummary)
//!       |-- BarrierResolution / FullSynchronization
//!       |-- BarrierFreeVerification
//!       '-- LabelVerification
//!       |
//!       v
//! Schedule (one LaneSequence per lane)
//! ```
//!
//! # Example
//!
//! ```rust
//! use qlane_compile::{CompileOptions, Compiler};
//! use qlane_ir::ast::{Function, LaneBody, Program, Stmt};
//! use qlane_ir::{BlockId, Instruction, LaneId};
//!
//! let lanes = vec![LaneId(0), LaneId(1)];
//! let block = |name: &str, duration| {
//!     vec![Stmt::concurrent(BlockId(0), lanes.clone(), vec![Stmt::pulse(name, duration)])]
//! };
//! let program = Program {
//!     functions: vec![Function::new(
//!         "main",
//!         vec![
//!             LaneBody::new(LaneId(0), block("X90", 100)),
//!             LaneBody::new(LaneId(1), block("Y90", 60)),
//!         ],
//!     )],
//! };
//!
//! let mut compiler = Compiler::new(CompileOptions::default());
//! let functions = compiler.compile(&program).into_result().unwrap();
//!
//! // The shorter lane is padded up to the longer one.
//! let lane1 = &functions[0].schedule.lanes[1];
//! assert_eq!(lane1.instructions.last(), Some(&Instruction::delay(40)));
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Barrier handling |
//! |-------|------------------|
//! | 0 | Every barrier becomes `Sync`/`Wait` |
//! | 1 | Deterministic blocks are padded; the rest become `Sync`/`Wait` |

pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod flatten;
pub mod labels;
pub mod manager;
pub mod options;
pub mod pass;
pub mod passes;
pub mod property;
pub mod resolve;
pub mod sync;

pub use diagnostics::{DiagCode, DiagLevel, Diagnostic};
pub use driver::{CompileOutput, CompiledFunction, Compiler};
pub use error::{CompileError, CompileResult, FlattenError, LabelError, ResolveError};
pub use flatten::{Flat, Flattener};
pub use labels::LabelManager;
pub use manager::{PassManager, PassManagerBuilder};
pub use options::CompileOptions;
pub use pass::{Pass, PassKind};
pub use property::PropertySet;
pub use resolve::{BlockTiming, ResolutionReport, resolve_barriers};
pub use sync::SyncInserter;

//! qlane Lane Intermediate Representation
//!
//! This crate provides the data contracts shared by every stage of the qlane
//! compiler: the structured statement tree handed over by the front end, the
//! flat per-lane instruction stream produced by lowering, and the schedule
//! that downstream hardware compilation consumes.
//!
//! # Core Components
//!
//! - **Lanes**: [`LaneId`] names one independent execution stream (a physical
//!   or logical channel); [`LaneSequence`] is that lane's instruction list.
//! - **Instructions**: [`Instruction`] is a closed enum covering opaque
//!   pulses, labels, jumps, call/return, bounded-loop primitives, barriers and
//!   the genuine `Sync`/`Wait` rendezvous pair.
//! - **Schedule**: [`Schedule`] groups the lane sequences of one compiled
//!   function.
//! - **Statement tree**: the [`ast`] module describes the structured input to
//!   the flattener (while/if/repeat, break/continue, grouping wrappers).
//!
//! # Example: Building a Schedule
//!
//! ```rust
//! use qlane_ir::{BarrierId, Instruction, LaneId, LaneSequence, Schedule};
//!
//! let lanes = vec![LaneId(0), LaneId(1)];
//! let mut a = LaneSequence::new(LaneId(0));
//! a.push(Instruction::pulse("X90", 100));
//! a.push(Instruction::barrier(BarrierId(0), lanes.clone()));
//!
//! let mut b = LaneSequence::new(LaneId(1));
//! b.push(Instruction::pulse("Y90", 60));
//! b.push(Instruction::barrier(BarrierId(0), lanes));
//!
//! let schedule = Schedule::with_lanes("main", vec![a, b]).unwrap();
//! assert_eq!(schedule.barrier_counts(), vec![1, 1]);
//! ```
//!
//! # Instruction Set
//!
//! | Instruction | Duration | Description |
//! |-------------|----------|-------------|
//! | `Pulse` | declared | Opaque hardware action |
//! | `Delay` | declared | Padding no-op |
//! | `Store` | 0 | Runtime register assignment |
//! | `BlockLabel` | 0 | Jump target |
//! | `Goto`, `ConditionalGoto` | 0 | Unconditional / runtime-tested jump |
//! | `Call`, `Return` | 0 | Subroutine transfer |
//! | `LoadRepeat`, `Repeat` | 0 | Bounded loop |
//! | `Barrier` | 0 | Pending cross-lane rendezvous |
//! | `Sync`, `Wait` | 0 | Resolved runtime rendezvous |
//! | `Compare`, `LoadCmp` | 0 | Runtime-dependent test |

pub mod ast;
pub mod error;
pub mod instruction;
pub mod lane;
pub mod schedule;

pub use error::{IrError, IrResult};
pub use instruction::{CmpOp, Comparison, Instruction, Label, Pulse};
pub use lane::{BarrierId, BlockId, LaneId};
pub use schedule::{LaneSequence, Schedule};

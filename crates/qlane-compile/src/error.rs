//! Error types for the compilation crate.

use thiserror::Error;

use qlane_ir::ast::Location;
use qlane_ir::{Label, LaneId};

/// Errors raised by the label manager.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LabelError {
    /// The same prefix was requested twice in one allocation.
    #[error("Duplicate label prefix '{0}' in one allocation")]
    DuplicatePrefix(String),
}

/// Errors raised while lowering structured control flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlattenError {
    /// A runtime test that cannot be expressed as a single comparison.
    #[error(
        "Unsupported test '{test}' at {location}: expected a name, a call, `not name`, or a comparison of a name against a literal"
    )]
    UnsupportedTest { test: String, location: Location },

    /// `break` or `continue` with no enclosing loop.
    #[error("'{keyword}' outside of a loop at {location}")]
    NoEnclosingLoop {
        keyword: &'static str,
        location: Location,
    },

    /// A grouped wrapper with a child that is not a single-lane group.
    #[error("Grouped block at {location} contains a statement that is not a single-lane group")]
    InvalidGroup { location: Location },

    /// Label allocation failed.
    #[error(transparent)]
    Label(#[from] LabelError),
}

impl FlattenError {
    /// Source location of the offending statement, if known.
    pub fn location(&self) -> Option<Location> {
        match self {
            FlattenError::UnsupportedTest { location, .. }
            | FlattenError::NoEnclosingLoop { location, .. }
            | FlattenError::InvalidGroup { location } => Some(*location),
            FlattenError::Label(_) => None,
        }
    }
}

/// Internal-consistency errors raised while walking lane sequences.
///
/// These indicate that lowering produced something the resolver cannot
/// interpret, never a problem in the user program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// `Call` target label not found before the next barrier.
    #[error("Lane {lane}: call target '{target}' not found before the next barrier")]
    UnresolvedCallTarget { lane: LaneId, target: Label },

    /// `Goto` target label not found in the current block.
    #[error("Lane {lane}: goto target '{target}' not found in the current block")]
    UnresolvedGotoTarget { lane: LaneId, target: Label },

    /// `Repeat` target label not found behind the back edge.
    #[error("Lane {lane}: repeat target '{target}' not found")]
    UnresolvedRepeatTarget { lane: LaneId, target: Label },

    /// `Repeat` with no open `LoadRepeat`.
    #[error("Lane {lane}: Repeat at position {position} without a matching LoadRepeat")]
    RepeatWithoutLoad { lane: LaneId, position: usize },

    /// `Return` with an empty call stack.
    #[error("Lane {lane}: Return at position {position} without a matching Call")]
    ReturnWithoutCall { lane: LaneId, position: usize },

    /// The walk of a block did not end on the expected barrier.
    #[error(
        "Lane {lane}: walk for barrier rank {rank} ended at position {found:?}, expected {expected}"
    )]
    BarrierWalkDesync {
        lane: LaneId,
        rank: usize,
        expected: usize,
        found: Option<usize>,
    },
}

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qlane_ir::IrError),

    /// Label manager misuse.
    #[error("Label configuration error: {0}")]
    Label(#[from] LabelError),

    /// Lowering failed.
    #[error(transparent)]
    Flatten(#[from] FlattenError),

    /// Barrier resolution failed.
    #[error("Barrier resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A barrier survived the pipeline.
    #[error("Lane {lane} still contains {count} barrier(s) after resolution")]
    BarrierRemaining { lane: LaneId, count: usize },

    /// A jump names a label the lane never defines.
    #[error("Lane {lane}: label '{label}' is used but never defined")]
    UndefinedLabel { lane: LaneId, label: Label },

    /// A label is defined more than once in a lane.
    #[error("Lane {lane}: label '{label}' is defined more than once")]
    DuplicateLabel { lane: LaneId, label: Label },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for lowering.
pub type FlattenResult<T> = Result<T, FlattenError>;

/// Result type for barrier resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

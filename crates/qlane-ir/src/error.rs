//! Error types for the IR crate.

use crate::lane::LaneId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Lane not found in schedule.
    #[error("Lane {lane} not found in schedule{}", format_schedule_context(.schedule))]
    LaneNotFound {
        /// The lane that was not found.
        lane: LaneId,
        /// Optional schedule name for context.
        schedule: Option<String>,
    },

    /// The same lane appears twice in a schedule.
    #[error("Duplicate lane {lane} in schedule{}", format_schedule_context(.schedule))]
    DuplicateLane {
        /// The duplicated lane.
        lane: LaneId,
        /// Optional schedule name for context.
        schedule: Option<String>,
    },

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Helper function to format optional schedule context.
#[allow(clippy::ref_option)]
fn format_schedule_context(schedule: &Option<String>) -> String {
    match schedule {
        Some(name) => format!(" '{name}'"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

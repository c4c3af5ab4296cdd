//! Compiler diagnostics.
//!
//! Every problem found during a compilation run is recorded as a
//! [`Diagnostic`] carrying a stable code, a severity, the function it was
//! found in, and the source location when one is known. The driver refuses
//! to hand out output once any diagnostic of level [`DiagLevel::Error`] or
//! above was recorded.

use serde::Serialize;
use std::fmt;

use qlane_ir::ast::Location;

use crate::error::{CompileError, FlattenError};

/// A stable diagnostic code, e.g. `Q0101`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Diagnostic codes.
///
/// `Q00xx` are label and IR problems, `Q01xx` lowering errors in the user
/// program, `Q02xx` barrier alignment warnings, `Q03xx` internal resolver
/// errors and `Q04xx` verification failures.
pub mod codes {
    use super::DiagCode;

    pub const LABEL_PREFIX: DiagCode = DiagCode("Q0001");
    pub const IR: DiagCode = DiagCode("Q0002");

    pub const UNSUPPORTED_TEST: DiagCode = DiagCode("Q0101");
    pub const NO_ENCLOSING_LOOP: DiagCode = DiagCode("Q0102");
    pub const INVALID_GROUP: DiagCode = DiagCode("Q0103");

    pub const MISMATCHED_BARRIERS: DiagCode = DiagCode("Q0201");

    pub const RESOLVE: DiagCode = DiagCode("Q0301");

    pub const BARRIER_REMAINING: DiagCode = DiagCode("Q0401");
    pub const UNDEFINED_LABEL: DiagCode = DiagCode("Q0402");
    pub const DUPLICATE_LABEL: DiagCode = DiagCode("Q0403");
}

/// Severity of a diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagLevel {
    /// Output is still produced.
    Warning,
    /// The enclosing function was abandoned.
    Error,
    /// Internal failure; the enclosing function was abandoned.
    Fatal,
}

impl fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagLevel::Warning => "warning",
            DiagLevel::Error => "error",
            DiagLevel::Fatal => "fatal",
        })
    }
}

/// A diagnostic recorded during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    /// Function being compiled when the diagnostic was raised.
    pub function: Option<String>,
    pub location: Option<Location>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with no code, context, or hint.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            function: None,
            location: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message)
    }

    /// Attach a stable diagnostic code.
    #[must_use]
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the name of the function being compiled.
    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Attach a source location. Unknown locations are ignored.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        if location.is_known() {
            self.location = Some(location);
        }
        self
    }

    /// Attach a location only if none is set yet.
    #[must_use]
    pub fn or_location(self, location: Location) -> Self {
        if self.location.is_some() {
            self
        } else {
            self.with_location(location)
        }
    }

    /// Attach a remediation hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Check whether this diagnostic blocks output.
    pub fn is_error(&self) -> bool {
        self.level >= DiagLevel::Error
    }

    /// Build the diagnostic for a compilation error.
    pub fn from_error(err: &CompileError) -> Self {
        let (level, code) = match err {
            CompileError::Label(_) | CompileError::Flatten(FlattenError::Label(_)) => {
                (DiagLevel::Fatal, codes::LABEL_PREFIX)
            }
            CompileError::Flatten(FlattenError::UnsupportedTest { .. }) => {
                (DiagLevel::Error, codes::UNSUPPORTED_TEST)
            }
            CompileError::Flatten(FlattenError::NoEnclosingLoop { .. }) => {
                (DiagLevel::Error, codes::NO_ENCLOSING_LOOP)
            }
            CompileError::Flatten(FlattenError::InvalidGroup { .. }) => {
                (DiagLevel::Error, codes::INVALID_GROUP)
            }
            CompileError::Ir(_) => (DiagLevel::Error, codes::IR),
            CompileError::Resolve(_) => (DiagLevel::Fatal, codes::RESOLVE),
            CompileError::BarrierRemaining { .. } => (DiagLevel::Fatal, codes::BARRIER_REMAINING),
            CompileError::UndefinedLabel { .. } => (DiagLevel::Fatal, codes::UNDEFINED_LABEL),
            CompileError::DuplicateLabel { .. } => (DiagLevel::Fatal, codes::DUPLICATE_LABEL),
        };

        let mut diag = Diagnostic::new(level, err.to_string()).with_code(code);
        if let CompileError::Flatten(flatten) = err {
            if let Some(location) = flatten.location() {
                diag = diag.with_location(location);
            }
        }
        match err {
            CompileError::Flatten(FlattenError::UnsupportedTest { .. }) => diag.with_hint(
                "assign the value to a variable and test the variable, e.g. `m = MEAS(q); if m > 1:`",
            ),
            CompileError::Resolve(_) | CompileError::BarrierRemaining { .. } => {
                diag.with_hint("this is a compiler bug; please report it with the input program")
            }
            _ => diag,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.level, code, self.message)?,
            None => write!(f, "{}: {}", self.level, self.message)?,
        }
        match (&self.function, &self.location) {
            (Some(function), Some(location)) => write!(f, "\n  --> in '{function}' at {location}")?,
            (Some(function), None) => write!(f, "\n  --> in '{function}'")?,
            (None, Some(location)) => write!(f, "\n  --> at {location}")?,
            (None, None) => {}
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlane_ir::{Label, LaneId};

    #[test]
    fn test_display_full() {
        let diag = Diagnostic::error("'break' outside of a loop")
            .with_code(codes::NO_ENCLOSING_LOOP)
            .with_function("main")
            .with_location(Location::new(4, 9));
        assert_eq!(
            diag.to_string(),
            "error[Q0102]: 'break' outside of a loop\n  --> in 'main' at 4:9"
        );
    }

    #[test]
    fn test_display_minimal() {
        assert_eq!(Diagnostic::warning("hm").to_string(), "warning: hm");
    }

    #[test]
    fn test_unknown_location_ignored() {
        let diag = Diagnostic::warning("x").with_location(Location::default());
        assert_eq!(diag.location, None);
        let diag = diag.or_location(Location::new(1, 1)).or_location(Location::new(2, 2));
        assert_eq!(diag.location, Some(Location::new(1, 1)));
    }

    #[test]
    fn test_levels_ordered() {
        assert!(DiagLevel::Fatal > DiagLevel::Error);
        assert!(!Diagnostic::warning("w").is_error());
        assert!(Diagnostic::new(DiagLevel::Fatal, "f").is_error());
    }

    #[test]
    fn test_from_error() {
        let err = CompileError::Flatten(FlattenError::UnsupportedTest {
            test: "a + b".into(),
            location: Location::new(2, 4),
        });
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.code, Some(codes::UNSUPPORTED_TEST));
        assert_eq!(diag.level, DiagLevel::Error);
        assert_eq!(diag.location, Some(Location::new(2, 4)));
        assert!(diag.hint.is_some());

        let err = CompileError::BarrierRemaining {
            lane: LaneId(1),
            count: 2,
        };
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.level, DiagLevel::Fatal);
        assert_eq!(diag.code, Some(codes::BARRIER_REMAINING));
    }

    #[test]
    fn test_verification_codes() {
        let undefined = CompileError::UndefinedLabel {
            lane: LaneId(0),
            label: Label::new("while_3"),
        };
        let duplicate = CompileError::DuplicateLabel {
            lane: LaneId(0),
            label: Label::new("if_1"),
        };
        let mapped: Vec<_> = [undefined, duplicate]
            .iter()
            .map(Diagnostic::from_error)
            .map(|d| (d.level, d.code))
            .collect();
        assert_eq!(
            mapped,
            vec![
                (DiagLevel::Fatal, Some(codes::UNDEFINED_LABEL)),
                (DiagLevel::Fatal, Some(codes::DUPLICATE_LABEL)),
            ]
        );
    }
}

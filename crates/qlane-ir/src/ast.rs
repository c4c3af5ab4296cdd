//! Structured statement tree handed to the flattener.
//!
//! The front end (parsing, scope checking, inlining, partial evaluation and
//! channel grouping) is not part of qlane. Its output is one statement list
//! per lane and per function, expressed with the types in this module.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::instruction::CmpOp;
use crate::lane::{BlockId, LaneId};

/// A compilation unit: the functions produced by the front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    /// Functions in source order.
    pub functions: Vec<Function>,
}

/// One function, already partitioned into per-lane statement lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Location of the definition.
    #[serde(default)]
    pub location: Location,
    /// Statement list of each lane.
    pub lanes: Vec<LaneBody>,
}

impl Function {
    /// Create a function from its lane bodies.
    pub fn new(name: impl Into<String>, lanes: Vec<LaneBody>) -> Self {
        Self {
            name: name.into(),
            location: Location::default(),
            lanes,
        }
    }
}

/// The statements a single lane executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneBody {
    /// Lane the statements belong to.
    pub lane: LaneId,
    /// Statements in program order.
    pub body: Vec<Stmt>,
}

impl LaneBody {
    /// Create a lane body.
    pub fn new(lane: LaneId, body: Vec<Stmt>) -> Self {
        Self { lane, body }
    }
}

/// A position in the source program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line, 0 when unknown.
    pub line: u32,
    /// 1-based column, 0 when unknown.
    pub column: u32,
}

impl Location {
    /// Create a location.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Check if the location carries real position information.
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// How the front end classified a call or assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Ordinary pulse call or compile-time value.
    #[default]
    Plain,
    /// Creates a channel handle; fully consumed upstream.
    ChannelCreation,
    /// Schedules a measurement.
    Measurement,
    /// Computed at run time on the controller.
    Runtime,
}

/// A call expression. When used as a statement it schedules a pulse of the
/// declared duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// Callee name.
    pub name: String,
    /// Arguments.
    #[serde(default)]
    pub args: Vec<Expr>,
    /// Declared duration of the scheduled pulse.
    #[serde(default)]
    pub duration: u64,
}

impl CallExpr {
    /// Create a call without arguments.
    pub fn new(name: impl Into<String>, duration: u64) -> Self {
        Self {
            name: name.into(),
            args: vec![],
            duration,
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Arithmetic and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

impl BinOp {
    /// Source-level spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Variable reference.
    Name(String),
    /// Function call.
    Call(CallExpr),
    /// Logical negation.
    Not(Box<Expr>),
    /// Comparison.
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    /// Arithmetic or logical binary operation.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Create a variable reference.
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    /// Create a comparison.
    pub fn compare(left: Expr, op: CmpOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    /// Evaluate as a compile-time truth value, if the expression is constant.
    pub fn as_const_truth(&self) -> Option<bool> {
        match self {
            Expr::Bool(b) => Some(*b),
            Expr::Int(v) => Some(*v != 0),
            Expr::Not(inner) => inner.as_const_truth().map(|b| !b),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(true) => f.write_str("True"),
            Expr::Bool(false) => f.write_str("False"),
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Name(n) => f.write_str(n),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Not(inner) => write!(f, "not {inner}"),
            Expr::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::Binary { left, op, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// What the statement does.
    pub kind: StmtKind,
    /// Where it came from.
    #[serde(default)]
    pub location: Location,
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum StmtKind {
    /// Call used as a statement.
    Expr {
        call: CallExpr,
        #[serde(default)]
        class: Classification,
    },
    /// Assignment `target = value`.
    Assign {
        target: String,
        value: Expr,
        #[serde(default)]
        class: Classification,
    },
    /// `while test: body`
    While { test: Expr, body: Vec<Stmt> },
    /// `if test: body else: orelse`
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// Bounded loop: run `body` exactly `count` times.
    Repeat { count: u32, body: Vec<Stmt> },
    /// Transparent sequential grouping.
    Sequential { body: Vec<Stmt> },
    /// This lane's slice of a concurrent block.
    Concurrent {
        block: BlockId,
        lanes: Vec<LaneId>,
        body: Vec<Stmt>,
    },
    /// Wrapper whose children are all single-lane groups.
    Grouped { groups: Vec<Stmt> },
    /// Statements bound to a single lane.
    Group { lane: LaneId, body: Vec<Stmt> },
}

impl Stmt {
    /// Create a statement with no location.
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            location: Location::default(),
        }
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Location::new(line, column);
        self
    }

    /// A pulse call statement.
    pub fn pulse(name: impl Into<String>, duration: u64) -> Self {
        Self::new(StmtKind::Expr {
            call: CallExpr::new(name, duration),
            class: Classification::Plain,
        })
    }

    /// `target = MEAS(...)`-style measurement assignment.
    pub fn measure(target: impl Into<String>, call: CallExpr) -> Self {
        Self::new(StmtKind::Assign {
            target: target.into(),
            value: Expr::Call(call),
            class: Classification::Measurement,
        })
    }

    /// `while test: body`
    pub fn while_loop(test: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::While { test, body })
    }

    /// `if test: body else: orelse`
    pub fn if_else(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Self {
        Self::new(StmtKind::If { test, body, orelse })
    }

    /// `repeat(count): body`
    pub fn repeat(count: u32, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Repeat { count, body })
    }

    /// `break`
    pub fn break_loop() -> Self {
        Self::new(StmtKind::Break)
    }

    /// `continue`
    pub fn continue_loop() -> Self {
        Self::new(StmtKind::Continue)
    }

    /// A concurrent block slice.
    pub fn concurrent(block: BlockId, lanes: Vec<LaneId>, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Concurrent { block, lanes, body })
    }
}

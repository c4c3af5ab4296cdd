//! Lowering of structured control flow to labels and jumps.
//!
//! The flattener walks one lane's statement list and emits a flat stream of
//! [`Instruction`]s. Loops and conditionals become [`Instruction::BlockLabel`]s
//! with [`Instruction::Goto`] / [`Instruction::ConditionalGoto`], and bounded
//! `repeat(N)` loops become a `Call`/`Return` subroutine wrapped around the
//! hardware `LoadRepeat`/`Repeat` primitives. Concurrent and lane-tagged
//! blocks stay visible as [`Flat`] markers so the synchronization inserter can
//! place barriers around them.
//!
//! # Lowered Shapes
//!
//! ```text
//! while t: B                 if t: B else: E
//!   while_n:                   ConditionalGoto(t, if_n)
//!   ConditionalGoto(!t, ew_n)  E
//!   B                          Goto(endif_n)
//!   Goto(while_n)            if_n:
//! endwhile_n:                  B
//!                            endif_n:
//!
//! repeat(N): B
//!   Call(rstart_n)
//!   Goto(rend_n)
//! rstart_n:
//!   LoadRepeat(N)
//! rloop_n:
//!   B
//! rrepeat_n:
//!   Repeat(rloop_n)
//! rreturn_n:
//!   Return
//! rend_n:
//! ```
//!
//! Within a `repeat` body, `continue` jumps to the `Repeat` back edge and
//! `break` jumps to the `Return`.

use tracing::trace;

use qlane_ir::ast::{CallExpr, Classification, Expr, Location, Stmt, StmtKind};
use qlane_ir::{BlockId, CmpOp, Comparison, Instruction, Label, LaneId};

use crate::error::{FlattenError, FlattenResult};
use crate::labels::LabelManager;

/// One element of a flattened lane.
#[derive(Debug, Clone, PartialEq)]
pub enum Flat {
    /// A plain instruction.
    Op(Instruction),
    /// This lane's part of a concurrent block.
    Concurrent {
        block: BlockId,
        lanes: Vec<LaneId>,
        body: Vec<Flat>,
    },
    /// Instructions that belong to one specific lane.
    Lane { lane: LaneId, body: Vec<Flat> },
}

impl Flat {
    /// The instruction, if this is a plain [`Flat::Op`].
    pub fn as_op(&self) -> Option<&Instruction> {
        match self {
            Flat::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Labels that `continue` and `break` resolve to inside the innermost loop.
#[derive(Debug, Clone)]
struct LoopLabels {
    continue_to: Label,
    break_to: Label,
}

/// How a `while` loop leaves at the top of each iteration.
enum LoopExit {
    /// Constant-true test; only `break` leaves.
    Never,
    /// Constant-false test; the body is skipped.
    Always,
    /// Leave when the comparison holds.
    When(Comparison),
}

/// Lowers one lane's statements. Borrows the run-wide [`LabelManager`] so
/// labels stay unique across lanes and functions.
pub struct Flattener<'a> {
    labels: &'a mut LabelManager,
    loops: Vec<LoopLabels>,
}

impl<'a> Flattener<'a> {
    pub fn new(labels: &'a mut LabelManager) -> Self {
        Self {
            labels,
            loops: Vec::new(),
        }
    }

    /// Lower a statement list.
    pub fn flatten(&mut self, body: &[Stmt]) -> FlattenResult<Vec<Flat>> {
        let mut out = Vec::new();
        self.flatten_into(body, &mut out)?;
        Ok(out)
    }

    fn flatten_into(&mut self, body: &[Stmt], out: &mut Vec<Flat>) -> FlattenResult<()> {
        for stmt in body {
            self.flatten_stmt(stmt, out)?;
        }
        Ok(())
    }

    fn flatten_stmt(&mut self, stmt: &Stmt, out: &mut Vec<Flat>) -> FlattenResult<()> {
        let location = stmt.location;
        match &stmt.kind {
            StmtKind::Expr { call, class } => {
                if *class == Classification::ChannelCreation {
                    trace!(call = %call, "dropping channel creation");
                } else {
                    out.push(pulse_for(call));
                }
            }
            StmtKind::Assign {
                target,
                value,
                class,
            } => self.flatten_assign(target, value, *class, out),
            StmtKind::While { test, body } => self.flatten_while(test, body, location, out)?,
            StmtKind::If { test, body, orelse } => {
                self.flatten_if(test, body, orelse, location, out)?;
            }
            StmtKind::Break => {
                let target = self.innermost_loop("break", location)?.break_to.clone();
                out.push(Flat::Op(Instruction::goto(target)));
            }
            StmtKind::Continue => {
                let target = self.innermost_loop("continue", location)?.continue_to.clone();
                out.push(Flat::Op(Instruction::goto(target)));
            }
            StmtKind::Repeat { count, body } => self.flatten_repeat(*count, body, out)?,
            StmtKind::Sequential { body } => self.flatten_into(body, out)?,
            StmtKind::Concurrent { block, lanes, body } => {
                let mut inner = Vec::new();
                self.flatten_into(body, &mut inner)?;
                out.push(Flat::Concurrent {
                    block: *block,
                    lanes: lanes.clone(),
                    body: inner,
                });
            }
            StmtKind::Grouped { groups } => {
                for group in groups {
                    let StmtKind::Group { lane, body } = &group.kind else {
                        return Err(FlattenError::InvalidGroup {
                            location: group.location,
                        });
                    };
                    self.flatten_group(*lane, body, out)?;
                }
            }
            StmtKind::Group { lane, body } => self.flatten_group(*lane, body, out)?,
        }
        Ok(())
    }

    fn flatten_group(&mut self, lane: LaneId, body: &[Stmt], out: &mut Vec<Flat>) -> FlattenResult<()> {
        let mut inner = Vec::new();
        self.flatten_into(body, &mut inner)?;
        out.push(Flat::Lane { lane, body: inner });
        Ok(())
    }

    fn flatten_assign(&mut self, target: &str, value: &Expr, class: Classification, out: &mut Vec<Flat>) {
        match (class, value) {
            (Classification::ChannelCreation, _) => {
                trace!(target, "dropping channel creation");
            }
            (Classification::Measurement, Expr::Call(call)) => out.push(pulse_for(call)),
            (Classification::Measurement | Classification::Runtime, _) => {
                out.push(Flat::Op(Instruction::Store {
                    dest: target.to_string(),
                    source: value.to_string(),
                }));
            }
            // Compile-time values were folded by the front end.
            (Classification::Plain, _) => {
                trace!(target, "dropping compile-time assignment");
            }
        }
    }

    fn flatten_while(
        &mut self,
        test: &Expr,
        body: &[Stmt],
        location: Location,
        out: &mut Vec<Flat>,
    ) -> FlattenResult<()> {
        let exit = match test.as_const_truth() {
            Some(true) => LoopExit::Never,
            Some(false) => LoopExit::Always,
            None => LoopExit::When(derive_comparison(test, location)?.inverse()),
        };
        let [start, end] = self.labels.allocate_labels(["while", "endwhile"])?;
        out.push(Flat::Op(Instruction::label(start.clone())));
        match exit {
            LoopExit::Never => {}
            LoopExit::Always => out.push(Flat::Op(Instruction::goto(end.clone()))),
            LoopExit::When(cmp) => out.push(Flat::Op(Instruction::goto_if(cmp, end.clone()))),
        }
        self.in_loop(start.clone(), end.clone(), body, out)?;
        out.push(Flat::Op(Instruction::goto(start)));
        out.push(Flat::Op(Instruction::label(end)));
        Ok(())
    }

    fn flatten_if(
        &mut self,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        location: Location,
        out: &mut Vec<Flat>,
    ) -> FlattenResult<()> {
        let cmp = derive_comparison(test, location)?;
        let [taken, end] = self.labels.allocate_labels(["if", "endif"])?;
        out.push(Flat::Op(Instruction::goto_if(cmp, taken.clone())));
        self.flatten_into(orelse, out)?;
        out.push(Flat::Op(Instruction::goto(end.clone())));
        out.push(Flat::Op(Instruction::label(taken)));
        self.flatten_into(body, out)?;
        out.push(Flat::Op(Instruction::label(end)));
        Ok(())
    }

    fn flatten_repeat(&mut self, count: u32, body: &[Stmt], out: &mut Vec<Flat>) -> FlattenResult<()> {
        let [start, looped, back_edge, ret, end] = self
            .labels
            .allocate_labels(["rstart", "rloop", "rrepeat", "rreturn", "rend"])?;
        out.push(Flat::Op(Instruction::call(start.clone())));
        out.push(Flat::Op(Instruction::goto(end.clone())));
        out.push(Flat::Op(Instruction::label(start)));
        out.push(Flat::Op(Instruction::load_repeat(count)));
        out.push(Flat::Op(Instruction::label(looped.clone())));
        self.in_loop(back_edge.clone(), ret.clone(), body, out)?;
        out.push(Flat::Op(Instruction::label(back_edge)));
        out.push(Flat::Op(Instruction::repeat(looped)));
        out.push(Flat::Op(Instruction::label(ret)));
        out.push(Flat::Op(Instruction::Return));
        out.push(Flat::Op(Instruction::label(end)));
        Ok(())
    }

    fn in_loop(
        &mut self,
        continue_to: Label,
        break_to: Label,
        body: &[Stmt],
        out: &mut Vec<Flat>,
    ) -> FlattenResult<()> {
        self.loops.push(LoopLabels {
            continue_to,
            break_to,
        });
        let result = self.flatten_into(body, out);
        self.loops.pop();
        result
    }

    fn innermost_loop(&self, keyword: &'static str, location: Location) -> FlattenResult<&LoopLabels> {
        self.loops
            .last()
            .ok_or(FlattenError::NoEnclosingLoop { keyword, location })
    }
}

fn pulse_for(call: &CallExpr) -> Flat {
    Flat::Op(Instruction::pulse(call.name.clone(), call.duration))
}

/// Reduce a runtime test to a single comparison.
///
/// Accepted forms are a bare name or call (`!= 0`), `not name` (`== 0`), and
/// `name OP literal` with `OP` one of `==`, `!=`, `>`, `<`.
pub fn derive_comparison(test: &Expr, location: Location) -> FlattenResult<Comparison> {
    let unsupported = || FlattenError::UnsupportedTest {
        test: test.to_string(),
        location,
    };
    match test {
        Expr::Name(name) => Ok(Comparison::new(name.clone(), CmpOp::Ne, 0)),
        Expr::Call(call) => Ok(Comparison::new(call.to_string(), CmpOp::Ne, 0)),
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Name(name) => Ok(Comparison::new(name.clone(), CmpOp::Eq, 0)),
            _ => Err(unsupported()),
        },
        Expr::Compare { left, op, right } => {
            if !matches!(op, CmpOp::Eq | CmpOp::Ne | CmpOp::Gt | CmpOp::Lt) {
                return Err(unsupported());
            }
            match (left.as_ref(), right.as_ref()) {
                (Expr::Name(name), Expr::Int(value)) => Ok(Comparison::new(name.clone(), *op, *value)),
                (Expr::Name(name), Expr::Bool(value)) => {
                    Ok(Comparison::new(name.clone(), *op, i64::from(*value)))
                }
                _ => Err(unsupported()),
            }
        }
        Expr::Bool(_) | Expr::Int(_) | Expr::Binary { .. } => Err(unsupported()),
    }
}

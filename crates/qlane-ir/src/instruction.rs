//! Lane instructions: opaque pulses plus the control-flow primitives emitted
//! by lowering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lane::{BarrierId, LaneId};

/// A jump target name, unique within one compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Create a label from its full name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the label name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Comparison operator of a runtime test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    /// The operator that holds exactly when `self` does not.
    pub fn inverse(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Ge => CmpOp::Lt,
        }
    }

    /// Source-level spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A runtime test of a measured or computed value against a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    /// Name of the runtime value being tested.
    pub operand: String,
    /// Comparison operator.
    pub op: CmpOp,
    /// Literal compared against.
    pub value: i64,
}

impl Comparison {
    /// Create a comparison.
    pub fn new(operand: impl Into<String>, op: CmpOp, value: i64) -> Self {
        Self {
            operand: operand.into(),
            op,
            value,
        }
    }

    /// The negated test.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            operand: self.operand.clone(),
            op: self.op.inverse(),
            value: self.value,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.operand, self.op, self.value)
    }
}

/// An opaque hardware action with a declared duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    /// Name of the pulse primitive.
    pub name: String,
    /// Duration in device-specific units.
    pub duration: u64,
}

/// One instruction of a lane sequence.
///
/// The set is closed: every pass that interprets lane sequences matches on it
/// exhaustively, so adding a variant forces every consumer to be revisited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Opaque hardware action.
    Pulse(Pulse),
    /// Padding no-op of a given duration.
    Delay {
        /// Duration in device-specific units.
        duration: u64,
    },
    /// Runtime-computed assignment, kept as source text.
    Store {
        /// Destination name.
        dest: String,
        /// Source expression text.
        source: String,
    },
    /// Jump target.
    BlockLabel {
        /// Label name.
        name: Label,
    },
    /// Unconditional jump.
    Goto {
        /// Jump target.
        target: Label,
    },
    /// Jump taken when the runtime test holds.
    ConditionalGoto {
        /// Runtime test.
        comparison: Comparison,
        /// Jump target.
        target: Label,
    },
    /// Push a return address and jump.
    Call {
        /// Subroutine entry label.
        target: Label,
    },
    /// Pop a return address and jump back.
    Return,
    /// Record the iteration count of a bounded loop.
    LoadRepeat {
        /// Number of iterations.
        count: u32,
    },
    /// Close a bounded loop back to its body label.
    Repeat {
        /// Loop body label.
        target: Label,
    },
    /// Pending cross-lane rendezvous.
    Barrier {
        /// Stable barrier id.
        id: BarrierId,
        /// Declared participating lanes.
        lanes: Vec<LaneId>,
    },
    /// Announce readiness for a global rendezvous.
    Sync,
    /// Block until every lane has announced.
    Wait,
    /// Runtime comparison feeding a later branch.
    Compare {
        /// Runtime test.
        comparison: Comparison,
    },
    /// Load a measurement result into the comparison register.
    LoadCmp,
}

impl Instruction {
    /// Create a pulse instruction.
    pub fn pulse(name: impl Into<String>, duration: u64) -> Self {
        Instruction::Pulse(Pulse {
            name: name.into(),
            duration,
        })
    }

    /// Create a padding delay.
    pub fn delay(duration: u64) -> Self {
        Instruction::Delay { duration }
    }

    /// Create a label marker.
    pub fn label(name: impl Into<Label>) -> Self {
        Instruction::BlockLabel { name: name.into() }
    }

    /// Create an unconditional jump.
    pub fn goto(target: impl Into<Label>) -> Self {
        Instruction::Goto {
            target: target.into(),
        }
    }

    /// Create a conditional jump.
    pub fn goto_if(comparison: Comparison, target: impl Into<Label>) -> Self {
        Instruction::ConditionalGoto {
            comparison,
            target: target.into(),
        }
    }

    /// Create a call.
    pub fn call(target: impl Into<Label>) -> Self {
        Instruction::Call {
            target: target.into(),
        }
    }

    /// Create a bounded-loop count load.
    pub fn load_repeat(count: u32) -> Self {
        Instruction::LoadRepeat { count }
    }

    /// Create a bounded-loop back edge.
    pub fn repeat(target: impl Into<Label>) -> Self {
        Instruction::Repeat {
            target: target.into(),
        }
    }

    /// Create a barrier.
    pub fn barrier(id: BarrierId, lanes: impl IntoIterator<Item = LaneId>) -> Self {
        Instruction::Barrier {
            id,
            lanes: lanes.into_iter().collect(),
        }
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Instruction::Barrier { .. })
    }

    /// Get the label defined by this instruction, if it is a label marker.
    pub fn defined_label(&self) -> Option<&Label> {
        match self {
            Instruction::BlockLabel { name } => Some(name),
            _ => None,
        }
    }

    /// Get the label this instruction transfers control to, if any.
    pub fn target(&self) -> Option<&Label> {
        match self {
            Instruction::Goto { target }
            | Instruction::ConditionalGoto { target, .. }
            | Instruction::Call { target }
            | Instruction::Repeat { target } => Some(target),
            _ => None,
        }
    }

    /// Declared duration of this instruction.
    ///
    /// Control-flow primitives and rendezvous markers take no time of their
    /// own.
    pub fn duration(&self) -> u64 {
        match self {
            Instruction::Pulse(p) => p.duration,
            Instruction::Delay { duration } => *duration,
            _ => 0,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match self {
            Instruction::Pulse(p) => &p.name,
            Instruction::Delay { .. } => "delay",
            Instruction::Store { .. } => "store",
            Instruction::BlockLabel { .. } => "label",
            Instruction::Goto { .. } => "goto",
            Instruction::ConditionalGoto { .. } => "goto_if",
            Instruction::Call { .. } => "call",
            Instruction::Return => "return",
            Instruction::LoadRepeat { .. } => "load_repeat",
            Instruction::Repeat { .. } => "repeat",
            Instruction::Barrier { .. } => "barrier",
            Instruction::Sync => "sync",
            Instruction::Wait => "wait",
            Instruction::Compare { .. } => "compare",
            Instruction::LoadCmp => "load_cmp",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Pulse(p) => write!(f, "{}({})", p.name, p.duration),
            Instruction::Delay { duration } => write!(f, "Id({duration})"),
            Instruction::Store { dest, source } => write!(f, "Store({dest}, {source})"),
            Instruction::BlockLabel { name } => write!(f, "{name}:"),
            Instruction::Goto { target } => write!(f, "Goto({target})"),
            Instruction::ConditionalGoto { comparison, target } => {
                write!(f, "Goto({target}) if {comparison}")
            }
            Instruction::Call { target } => write!(f, "Call({target})"),
            Instruction::Return => f.write_str("Return()"),
            Instruction::LoadRepeat { count } => write!(f, "LoadRepeat({count})"),
            Instruction::Repeat { target } => write!(f, "Repeat({target})"),
            Instruction::Barrier { id, lanes } => {
                write!(f, "Barrier({id}")?;
                for lane in lanes {
                    write!(f, ", {lane}")?;
                }
                f.write_str(")")
            }
            Instruction::Sync => f.write_str("Sync()"),
            Instruction::Wait => f.write_str("Wait()"),
            Instruction::Compare { comparison } => write!(f, "Cmp({comparison})"),
            Instruction::LoadCmp => f.write_str("LoadCmp()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_instruction() {
        let inst = Instruction::pulse("X90", 40);
        assert_eq!(inst.duration(), 40);
        assert_eq!(inst.name(), "X90");
        assert!(inst.defined_label().is_none());
        assert!(inst.target().is_none());
    }

    #[test]
    fn test_control_flow_has_no_duration() {
        let insts = [
            Instruction::label("a_1"),
            Instruction::goto("a_1"),
            Instruction::call("a_1"),
            Instruction::Return,
            Instruction::load_repeat(4),
            Instruction::repeat("a_1"),
        ];
        for inst in &insts {
            assert_eq!(inst.duration(), 0, "{inst} should take no time");
        }
    }

    #[test]
    fn test_comparison_inverse() {
        let cmp = Comparison::new("m", CmpOp::Gt, 2);
        let inv = cmp.inverse();
        assert_eq!(inv.op, CmpOp::Le);
        assert_eq!(inv.inverse(), cmp);
        assert_eq!(inv.to_string(), "m <= 2");
    }

    #[test]
    fn test_targets() {
        assert_eq!(
            Instruction::repeat("loop_3").target(),
            Some(&Label::new("loop_3"))
        );
        assert_eq!(
            Instruction::label("loop_3").defined_label(),
            Some(&Label::new("loop_3"))
        );
        assert_eq!(Instruction::Return.target(), None);
    }

    #[test]
    fn test_json_shape() {
        let inst = Instruction::goto("end_2");
        let json = serde_json::to_string(&inst).unwrap();
        assert_eq!(json, r#"{"op":"goto","target":"end_2"}"#);

        let back: Instruction = serde_json::from_str(r#"{"op":"pulse","name":"Y90","duration":20}"#)
            .unwrap();
        assert_eq!(back, Instruction::pulse("Y90", 20));
    }

    #[test]
    fn test_display() {
        let barrier = Instruction::barrier(BarrierId(1), [LaneId(0), LaneId(2)]);
        assert_eq!(barrier.to_string(), "Barrier(b1, ch0, ch2)");
        assert_eq!(Instruction::delay(40).to_string(), "Id(40)");
    }
}

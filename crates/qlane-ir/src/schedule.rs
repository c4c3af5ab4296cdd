//! Per-lane instruction sequences and the schedule grouping them.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::lane::LaneId;

/// The ordered instruction list of one execution lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSequence {
    /// The lane these instructions run on.
    pub lane: LaneId,
    /// Instructions in program order.
    pub instructions: Vec<Instruction>,
}

impl LaneSequence {
    /// Create an empty sequence for a lane.
    pub fn new(lane: LaneId) -> Self {
        Self {
            lane,
            instructions: vec![],
        }
    }

    /// Create a sequence from existing instructions.
    pub fn with_instructions(
        lane: LaneId,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> Self {
        Self {
            lane,
            instructions: instructions.into_iter().collect(),
        }
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the sequence has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of `Barrier` instructions.
    pub fn barrier_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_barrier()).count()
    }

    /// Indices of every `Barrier` instruction, in order.
    pub fn barrier_positions(&self) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_barrier())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Sum of declared durations, ignoring control flow.
    ///
    /// Only meaningful for straight-line sequences.
    pub fn straight_line_duration(&self) -> u64 {
        self.instructions.iter().map(Instruction::duration).sum()
    }

    /// Iterate over the instructions.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.instructions.iter()
    }
}

/// The lane sequences of one compiled function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Name of the function this schedule was compiled from.
    pub name: String,
    /// One sequence per lane, in lane declaration order.
    pub lanes: Vec<LaneSequence>,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lanes: vec![],
        }
    }

    /// Create a schedule from lane sequences.
    ///
    /// Returns an error if a lane appears more than once.
    pub fn with_lanes(name: impl Into<String>, lanes: Vec<LaneSequence>) -> IrResult<Self> {
        let mut schedule = Self::new(name);
        for lane in lanes {
            schedule.add_lane(lane)?;
        }
        Ok(schedule)
    }

    /// Add a lane sequence.
    pub fn add_lane(&mut self, sequence: LaneSequence) -> IrResult<()> {
        if self.lanes.iter().any(|l| l.lane == sequence.lane) {
            return Err(IrError::DuplicateLane {
                lane: sequence.lane,
                schedule: Some(self.name.clone()),
            });
        }
        self.lanes.push(sequence);
        Ok(())
    }

    /// Get the sequence of a lane.
    pub fn lane(&self, lane: LaneId) -> IrResult<&LaneSequence> {
        self.lanes
            .iter()
            .find(|l| l.lane == lane)
            .ok_or_else(|| IrError::LaneNotFound {
                lane,
                schedule: Some(self.name.clone()),
            })
    }

    /// Number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Barrier count of every lane, in lane order.
    pub fn barrier_counts(&self) -> Vec<usize> {
        self.lanes.iter().map(LaneSequence::barrier_count).collect()
    }

    /// Check that no lane contains a `Barrier`.
    pub fn is_barrier_free(&self) -> bool {
        self.lanes.iter().all(|l| l.barrier_count() == 0)
    }

    /// Total instruction count across lanes.
    pub fn num_instructions(&self) -> usize {
        self.lanes.iter().map(LaneSequence::len).sum()
    }

    /// Decode a schedule from JSON.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the schedule as pretty-printed JSON.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

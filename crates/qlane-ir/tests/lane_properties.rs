//! Property tests for lane sequences and schedules.

use proptest::prelude::*;

use qlane_ir::{BarrierId, Instruction, LaneId, LaneSequence, Schedule};

/// Straight-line instructions: pulses, delays and barriers.
fn arb_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (0_u64..1000).prop_map(|d| Instruction::pulse("X", d)),
        (0_u64..1000).prop_map(Instruction::delay),
        (0_u32..8).prop_map(|k| Instruction::barrier(BarrierId(k), [LaneId(0), LaneId(1)])),
        Just(Instruction::Sync),
        Just(Instruction::Wait),
    ]
}

proptest! {
    #[test]
    fn prop_barrier_positions_match_count(insts in prop::collection::vec(arb_instruction(), 0..40)) {
        let lane = LaneSequence::with_instructions(LaneId(0), insts);
        let positions = lane.barrier_positions();
        prop_assert_eq!(positions.len(), lane.barrier_count());
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(positions.iter().all(|&p| lane.instructions[p].is_barrier()));
    }

    #[test]
    fn prop_duration_ignores_synchronization(insts in prop::collection::vec(arb_instruction(), 0..40)) {
        let lane = LaneSequence::with_instructions(LaneId(0), insts.clone());
        let expected: u64 = insts
            .iter()
            .map(|i| match i {
                Instruction::Pulse(pulse) => pulse.duration,
                Instruction::Delay { duration } => *duration,
                _ => 0,
            })
            .sum();
        prop_assert_eq!(lane.straight_line_duration(), expected);
    }

    #[test]
    fn prop_schedule_rejects_repeated_lane(ids in prop::collection::vec(0_u32..6, 1..10)) {
        let lanes: Vec<_> = ids.iter().map(|&id| LaneSequence::new(LaneId(id))).collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();

        let result = Schedule::with_lanes("f", lanes);
        prop_assert_eq!(result.is_ok(), unique.len() == ids.len());
    }
}

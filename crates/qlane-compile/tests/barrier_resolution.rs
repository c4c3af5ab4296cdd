//! Integration tests for barrier resolution.
//!
//! These check the alignment guarantees downstream hardware compilation
//! relies on: every lane reaches each rendezvous at the same time, runtime
//! dependence forces a real rendezvous in every lane, and inconsistent
//! input is passed through untouched.

use proptest::prelude::*;

use qlane_compile::ResolveError;
use qlane_compile::resolve::{BlockTiming, lane_timing, resolve_barriers};
use qlane_ir::{BarrierId, CmpOp, Comparison, Instruction, LaneId, LaneSequence};

/// Helper: build a lane from per-block pulse durations, closing every block
/// with a barrier.
fn lane_from_blocks(lane: u32, blocks: &[Vec<u64>], members: &[LaneId]) -> LaneSequence {
    let mut seq = LaneSequence::new(LaneId(lane));
    for (k, block) in blocks.iter().enumerate() {
        for (i, duration) in block.iter().enumerate() {
            seq.push(Instruction::pulse(format!("p{k}_{i}"), *duration));
        }
        seq.push(Instruction::barrier(BarrierId(k as u32), members.iter().copied()));
    }
    seq
}

fn members(n: usize) -> Vec<LaneId> {
    (0..n as u32).map(LaneId).collect()
}

/// Helper: the bounded-loop shape produced by lowering `repeat(count)`.
fn repeat_loop(count: u32, body: Vec<Instruction>) -> Vec<Instruction> {
    let mut insts = vec![
        Instruction::call("rstart_0"),
        Instruction::goto("rend_0"),
        Instruction::label("rstart_0"),
        Instruction::load_repeat(count),
        Instruction::label("rloop_0"),
    ];
    insts.extend(body);
    insts.extend([
        Instruction::label("rrepeat_0"),
        Instruction::repeat("rloop_0"),
        Instruction::label("rreturn_0"),
        Instruction::Return,
        Instruction::label("rend_0"),
    ]);
    insts
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_shorter_lane_padded() {
    let m = members(2);
    let mut lanes = vec![
        lane_from_blocks(0, &[vec![], vec![100]], &m),
        lane_from_blocks(1, &[vec![], vec![60]], &m),
    ];
    let report = resolve_barriers(&mut lanes).unwrap();

    assert_eq!(report.ranks, 2);
    assert_eq!(report.elided, 1);
    assert_eq!(report.padded, 1);
    assert_eq!(lanes[0].instructions, vec![Instruction::pulse("p1_0", 100)]);
    assert_eq!(
        lanes[1].instructions,
        vec![Instruction::pulse("p1_0", 60), Instruction::delay(40)]
    );
}

#[test]
fn test_equal_lanes_get_no_padding() {
    let m = members(3);
    let mut lanes: Vec<_> = (0..3).map(|l| lane_from_blocks(l, &[vec![25, 25]], &m)).collect();
    resolve_barriers(&mut lanes).unwrap();
    for lane in &lanes {
        assert!(lane.iter().all(|i| !matches!(i, Instruction::Delay { .. })));
    }
}

#[test]
fn test_mismatched_counts_pass_through() {
    let mut lanes = vec![
        lane_from_blocks(0, &[vec![10], vec![10]], &members(2)),
        lane_from_blocks(1, &[vec![10], vec![10], vec![10]], &members(2)),
    ];
    let before = lanes.clone();
    let report = resolve_barriers(&mut lanes).unwrap();

    assert_eq!(report.mismatch, Some(vec![2, 3]));
    assert_eq!(lanes, before);
}

#[test]
fn test_runtime_test_synchronizes_all_lanes() {
    let m = members(2);
    let mut a = LaneSequence::new(LaneId(0));
    a.push(Instruction::pulse("MEAS", 200));
    a.push(Instruction::goto_if(Comparison::new("m", CmpOp::Ne, 0), "if_0"));
    a.push(Instruction::goto("endif_0"));
    a.push(Instruction::label("if_0"));
    a.push(Instruction::pulse("X", 20));
    a.push(Instruction::label("endif_0"));
    a.push(Instruction::barrier(BarrierId(0), m.clone()));
    let b = lane_from_blocks(1, &[vec![60]], &m);

    let mut lanes = vec![a, b];
    let report = resolve_barriers(&mut lanes).unwrap();

    assert_eq!(report.synchronized, 1);
    assert_eq!(
        lanes[1].instructions,
        vec![Instruction::pulse("p0_0", 60), Instruction::Sync, Instruction::Wait]
    );
    assert!(lanes[0].instructions.ends_with(&[Instruction::Sync, Instruction::Wait]));
}

#[test]
fn test_dynamic_rank_does_not_leak_into_next() {
    let m = members(2);
    let mut a = LaneSequence::new(LaneId(0));
    a.push(Instruction::LoadCmp);
    a.push(Instruction::barrier(BarrierId(0), m.clone()));
    a.push(Instruction::pulse("X", 30));
    a.push(Instruction::barrier(BarrierId(1), m.clone()));
    let b = lane_from_blocks(1, &[vec![5], vec![10]], &m);

    let mut lanes = vec![a, b];
    let report = resolve_barriers(&mut lanes).unwrap();
    assert_eq!(report.synchronized, 1);
    assert_eq!(report.padded, 1);
    assert_eq!(lanes[1].instructions.last(), Some(&Instruction::delay(20)));
}

#[test]
fn test_repeat_multiplies_body() {
    let lane = LaneSequence::with_instructions(
        LaneId(0),
        repeat_loop(3, vec![Instruction::pulse("X", 10)]),
    );
    assert_eq!(lane_timing(&lane).unwrap(), BlockTiming::Fixed(30));
}

#[test]
fn test_repeat_aligned_against_straight_lane() {
    let m = members(2);
    let mut a = LaneSequence::with_instructions(LaneId(0), repeat_loop(4, vec![Instruction::pulse("X", 25)]));
    a.push(Instruction::barrier(BarrierId(0), m.clone()));
    let b = lane_from_blocks(1, &[vec![40]], &m);

    let mut lanes = vec![a, b];
    resolve_barriers(&mut lanes).unwrap();
    assert_eq!(lanes[1].instructions.last(), Some(&Instruction::delay(60)));
}

#[test]
fn test_repeat_back_edge_outside_body_is_fatal() {
    let m = members(2);
    let mut a = LaneSequence::with_instructions(
        LaneId(0),
        [
            Instruction::label("head"),
            Instruction::load_repeat(2),
            Instruction::pulse("X", 10),
            Instruction::repeat("head"),
        ],
    );
    a.push(Instruction::barrier(BarrierId(0), m.clone()));
    let b = lane_from_blocks(1, &[vec![40]], &m);

    let mut lanes = vec![a, b];
    let err = resolve_barriers(&mut lanes).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::UnresolvedRepeatTarget { lane: LaneId(0), .. }
    ));
}

#[test]
fn test_resolution_is_idempotent() {
    let m = members(2);
    let mut lanes = vec![
        lane_from_blocks(0, &[vec![1], vec![100]], &m),
        lane_from_blocks(1, &[vec![3], vec![60]], &m),
    ];
    resolve_barriers(&mut lanes).unwrap();
    let once = lanes.clone();
    let report = resolve_barriers(&mut lanes).unwrap();
    assert_eq!(report.ranks, 0);
    assert_eq!(lanes, once);
}

// ============================================================================
// Properties
// ============================================================================

/// Lanes with the same number of straight-line blocks.
fn arb_straight_lanes() -> impl Strategy<Value = Vec<Vec<Vec<u64>>>> {
    (1_usize..=4, 1_usize..=4).prop_flat_map(|(num_lanes, num_blocks)| {
        prop::collection::vec(
            prop::collection::vec(prop::collection::vec(0_u64..500, 0..=4), num_blocks),
            num_lanes,
        )
    })
}

proptest! {
    #[test]
    fn prop_deterministic_lanes_end_aligned(blocks in arb_straight_lanes()) {
        let m = members(blocks.len());
        let mut lanes: Vec<_> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| lane_from_blocks(i as u32, b, &m))
            .collect();
        let report = resolve_barriers(&mut lanes).unwrap();

        prop_assert_eq!(report.synchronized, 0);
        prop_assert_eq!(report.elided + report.padded, report.ranks);
        prop_assert!(lanes.iter().all(|l| l.barrier_count() == 0));

        let totals: Vec<u64> = lanes.iter().map(LaneSequence::straight_line_duration).collect();
        prop_assert!(totals.windows(2).all(|w| w[0] == w[1]), "totals differ: {:?}", totals);

        // The slowest lane's schedule is exactly its own work.
        let slowest: u64 = blocks
            .iter()
            .map(|lane| lane.iter().map(|b| b.iter().sum::<u64>()).collect::<Vec<_>>())
            .fold(Vec::new(), |acc: Vec<u64>, lane| {
                if acc.is_empty() {
                    lane
                } else {
                    acc.iter().zip(&lane).map(|(a, b)| *a.max(b)).collect()
                }
            })
            .iter()
            .sum();
        prop_assert_eq!(totals[0], slowest);
    }

    #[test]
    fn prop_resolution_idempotent(blocks in arb_straight_lanes()) {
        let m = members(blocks.len());
        let mut lanes: Vec<_> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| lane_from_blocks(i as u32, b, &m))
            .collect();
        resolve_barriers(&mut lanes).unwrap();
        let once = lanes.clone();
        resolve_barriers(&mut lanes).unwrap();
        prop_assert_eq!(lanes, once);
    }

    #[test]
    fn prop_mismatch_leaves_lanes_unchanged(
        a in prop::collection::vec(prop::collection::vec(0_u64..100, 0..3), 0..4),
        extra in 1_usize..3,
    ) {
        let m = members(2);
        let mut longer = a.clone();
        longer.extend(std::iter::repeat_n(vec![1], extra));
        let mut lanes = vec![lane_from_blocks(0, &a, &m), lane_from_blocks(1, &longer, &m)];
        let before = lanes.clone();
        let report = resolve_barriers(&mut lanes).unwrap();
        prop_assert!(report.is_mismatch());
        prop_assert_eq!(lanes, before);
    }

    #[test]
    fn prop_repeat_length(count in 1_u32..50, body in prop::collection::vec(0_u64..100, 0..5)) {
        let insts = body.iter().map(|d| Instruction::pulse("X", *d)).collect();
        let lane = LaneSequence::with_instructions(LaneId(0), repeat_loop(count, insts));
        let expected = u64::from(count) * body.iter().sum::<u64>();
        prop_assert_eq!(lane_timing(&lane).unwrap(), BlockTiming::Fixed(expected));
    }
}

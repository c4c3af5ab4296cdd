//! Barrier resolution.
//!
//! Barriers are compile-time rendezvous markers. For every barrier rank the
//! resolver walks each lane from the previous barrier to this one,
//! simulating control flow to compute the elapsed time. If every lane's
//! time is known, the barrier is replaced by a `Delay` that pads the lane up
//! to the slowest lane. If any lane depends on a runtime value, every lane
//! gets a genuine `Sync`/`Wait` pair instead.
//!
//! # Walk Rules
//!
//! | Instruction | Effect |
//! |-------------|--------|
//! | `Pulse`, `Delay` | add duration |
//! | `LoadRepeat(n)` | open a repeat frame |
//! | `Repeat(l)` | multiply the body length, or rebase on a back edge |
//! | `Call(l)` | push return address, jump forward to `l` |
//! | `Return` | pop return address |
//! | `Goto(l)` | jump forward to `l`; a backward target is runtime-dependent |
//! | `ConditionalGoto`, `Compare`, `LoadCmp` | runtime-dependent |
//! | `Wait` | restart the clock; runtime-dependent inside a repeat |
//! | `Barrier` | end of the block |
//!
//! Leading barriers that every lane reaches without executing anything are
//! dropped outright. Lanes with differing barrier counts are reported and
//! left untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use qlane_ir::{Instruction, Label, LaneSequence};

use crate::error::{ResolveError, ResolveResult};

/// Summary of one resolution run, stored in the pass property set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Barrier ranks seen (per lane).
    pub ranks: usize,
    /// Leading ranks dropped without replacement.
    pub elided: usize,
    /// Ranks replaced by padding.
    pub padded: usize,
    /// Ranks replaced by `Sync`/`Wait`.
    pub synchronized: usize,
    /// Per-lane barrier counts when they disagreed and nothing was changed.
    pub mismatch: Option<Vec<usize>>,
}

impl ResolutionReport {
    fn mismatched(counts: Vec<usize>) -> Self {
        Self {
            mismatch: Some(counts),
            ..Self::default()
        }
    }

    /// Check whether resolution bailed out on mismatched barrier counts.
    pub fn is_mismatch(&self) -> bool {
        self.mismatch.is_some()
    }
}

/// Elapsed time of one lane between two barriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTiming {
    /// Known at compile time.
    Fixed(u64),
    /// Depends on a runtime value.
    Dynamic,
}

/// Replacement chosen for one barrier rank.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RankResolution {
    Elide,
    /// Delay per lane, in lane order.
    Pad(Vec<u64>),
    Synchronize,
}

#[derive(Debug)]
struct RepeatFrame {
    remaining: u32,
    /// Position of the `LoadRepeat` that opened the frame.
    load: usize,
    /// Position just after the `LoadRepeat`, or the last back-edge target.
    loop_start: usize,
    length_at_start: u64,
}

/// Replace every barrier in `lanes` by padding or a runtime rendezvous.
///
/// Returns a report instead of failing when barrier counts differ; in that
/// case the lanes are left exactly as they were.
///
/// # Errors
///
/// Returns a [`ResolveError`] when the walk meets malformed control flow.
/// Those indicate a lowering bug and abort the whole function.
#[instrument(skip(lanes), fields(lanes = lanes.len()))]
pub fn resolve_barriers(lanes: &mut [LaneSequence]) -> ResolveResult<ResolutionReport> {
    let Some(ranks) = symmetric_barrier_count(lanes) else {
        let counts = lanes.iter().map(LaneSequence::barrier_count).collect();
        return Ok(ResolutionReport::mismatched(counts));
    };
    if ranks == 0 {
        return Ok(ResolutionReport::default());
    }

    let positions: Vec<Vec<usize>> = lanes.iter().map(LaneSequence::barrier_positions).collect();
    let mut resolutions = Vec::with_capacity(ranks);

    while resolutions.len() < ranks {
        let rank = resolutions.len();
        let all_at_start = positions
            .iter()
            .all(|p| p[rank] == block_start(p, rank));
        if !all_at_start {
            break;
        }
        debug!(rank, "eliding leading barrier");
        resolutions.push(RankResolution::Elide);
    }

    for rank in resolutions.len()..ranks {
        let mut lengths = Vec::with_capacity(lanes.len());
        let mut deterministic = true;
        // Every lane is walked even once the rank is known to be dynamic, so
        // malformed control flow is still reported.
        for (lane, p) in lanes.iter().zip(&positions) {
            match walk_block(lane, block_start(p, rank), p[rank], rank)? {
                BlockTiming::Fixed(length) => lengths.push(length),
                BlockTiming::Dynamic => deterministic = false,
            }
        }
        if deterministic {
            let max = lengths.iter().copied().max().unwrap_or(0);
            debug!(rank, max, "aligning lanes");
            resolutions.push(RankResolution::Pad(lengths.iter().map(|l| max - l).collect()));
        } else {
            debug!(rank, "runtime-dependent block, synchronizing");
            resolutions.push(RankResolution::Synchronize);
        }
    }

    let mut report = ResolutionReport {
        ranks,
        ..ResolutionReport::default()
    };
    for resolution in &resolutions {
        match resolution {
            RankResolution::Elide => report.elided += 1,
            RankResolution::Pad(_) => report.padded += 1,
            RankResolution::Synchronize => report.synchronized += 1,
        }
    }

    for (index, lane) in lanes.iter_mut().enumerate() {
        let old = std::mem::take(&mut lane.instructions);
        let mut rank = 0;
        for inst in old {
            if !inst.is_barrier() {
                lane.instructions.push(inst);
                continue;
            }
            match &resolutions[rank] {
                RankResolution::Elide => {}
                RankResolution::Pad(padding) => {
                    if padding[index] > 0 {
                        lane.instructions.push(Instruction::delay(padding[index]));
                    }
                }
                RankResolution::Synchronize => {
                    lane.instructions.push(Instruction::Sync);
                    lane.instructions.push(Instruction::Wait);
                }
            }
            rank += 1;
        }
    }

    Ok(report)
}

/// Replace every barrier by a `Sync`/`Wait` pair without timing analysis.
///
/// Lanes with differing barrier counts are left untouched, as in
/// [`resolve_barriers`].
pub fn synchronize_all(lanes: &mut [LaneSequence]) -> ResolutionReport {
    let Some(ranks) = symmetric_barrier_count(lanes) else {
        let counts = lanes.iter().map(LaneSequence::barrier_count).collect();
        return ResolutionReport::mismatched(counts);
    };
    for lane in lanes.iter_mut() {
        lane.instructions = std::mem::take(&mut lane.instructions)
            .into_iter()
            .flat_map(|inst| {
                if inst.is_barrier() {
                    vec![Instruction::Sync, Instruction::Wait]
                } else {
                    vec![inst]
                }
            })
            .collect();
    }
    ResolutionReport {
        ranks,
        synchronized: ranks,
        ..ResolutionReport::default()
    }
}

/// Common barrier count of all lanes, or `None` (with a warning) if they differ.
fn symmetric_barrier_count(lanes: &[LaneSequence]) -> Option<usize> {
    let counts: Vec<usize> = lanes.iter().map(LaneSequence::barrier_count).collect();
    let Some(&first) = counts.first() else {
        return Some(0);
    };
    if counts.iter().any(|&c| c != first) {
        let detail = lanes
            .iter()
            .zip(&counts)
            .map(|(lane, count)| format!("{}={count}", lane.lane))
            .collect::<Vec<_>>()
            .join(", ");
        warn!(counts = %detail, "mismatched barrier counts, leaving lanes unchanged");
        return None;
    }
    Some(first)
}

fn block_start(positions: &[usize], rank: usize) -> usize {
    if rank == 0 { 0 } else { positions[rank - 1] + 1 }
}

/// Walk `lane` from `start` until a barrier and return the elapsed time.
///
/// `end` is the position of the barrier of rank `rank`, or the lane length
/// for the trailing block. Reaching any other barrier, or running off the
/// lane early, is a desync.
pub fn walk_block(
    lane: &LaneSequence,
    start: usize,
    end: usize,
    rank: usize,
) -> ResolveResult<BlockTiming> {
    let insts = &lane.instructions;
    let id = lane.lane;
    let mut length: u64 = 0;
    let mut cursor = start;
    let mut returns: Vec<usize> = Vec::new();
    let mut repeats: Vec<RepeatFrame> = Vec::new();

    loop {
        let Some(inst) = insts.get(cursor) else {
            if cursor == end {
                return Ok(BlockTiming::Fixed(length));
            }
            return Err(ResolveError::BarrierWalkDesync {
                lane: id,
                rank,
                expected: end,
                found: None,
            });
        };
        match inst {
            Instruction::Barrier { .. } => {
                if cursor != end {
                    return Err(ResolveError::BarrierWalkDesync {
                        lane: id,
                        rank,
                        expected: end,
                        found: Some(cursor),
                    });
                }
                return Ok(BlockTiming::Fixed(length));
            }
            Instruction::Pulse(_)
            | Instruction::Delay { .. }
            | Instruction::Store { .. }
            | Instruction::BlockLabel { .. }
            | Instruction::Sync => {
                length = length.saturating_add(inst.duration());
                cursor += 1;
            }
            Instruction::Wait => {
                if !repeats.is_empty() {
                    return Ok(BlockTiming::Dynamic);
                }
                length = 0;
                cursor += 1;
            }
            Instruction::ConditionalGoto { .. } | Instruction::Compare { .. } | Instruction::LoadCmp => {
                return Ok(BlockTiming::Dynamic);
            }
            Instruction::LoadRepeat { count } => {
                repeats.push(RepeatFrame {
                    remaining: *count,
                    load: cursor,
                    loop_start: cursor + 1,
                    length_at_start: length,
                });
                cursor += 1;
            }
            Instruction::Repeat { target } => {
                let frame = repeats
                    .last_mut()
                    .ok_or(ResolveError::RepeatWithoutLoad {
                        lane: id,
                        position: cursor,
                    })?;
                let remaining = frame.remaining.saturating_sub(1);
                if remaining == 0 {
                    repeats.pop();
                    cursor += 1;
                } else if defines(insts, frame.loop_start, target) {
                    let body = length - frame.length_at_start;
                    length = length.saturating_add(body.saturating_mul(u64::from(remaining)));
                    trace!(%target, body, remaining, "repeat fast path");
                    repeats.pop();
                    cursor += 1;
                } else {
                    // The body was entered through a different label; restart
                    // the count from the real loop head. The head must lie
                    // inside the body, after the frame's `LoadRepeat`.
                    let body_start = frame.load + 1;
                    let head = insts
                        .get(body_start..cursor)
                        .and_then(|body| body.iter().rposition(|i| i.defined_label() == Some(target)))
                        .map(|offset| body_start + offset)
                        .ok_or_else(|| ResolveError::UnresolvedRepeatTarget {
                            lane: id,
                            target: target.clone(),
                        })?;
                    trace!(%target, from = cursor, to = head, "repeat rebase");
                    frame.remaining = remaining;
                    frame.loop_start = head;
                    frame.length_at_start = length;
                    cursor = head;
                }
            }
            Instruction::Call { target } => {
                let dest = find_forward(insts, cursor + 1, end, target).ok_or_else(|| {
                    ResolveError::UnresolvedCallTarget {
                        lane: id,
                        target: target.clone(),
                    }
                })?;
                trace!(%target, from = cursor, to = dest, "call");
                returns.push(cursor + 1);
                cursor = dest;
            }
            Instruction::Return => {
                cursor = returns.pop().ok_or(ResolveError::ReturnWithoutCall {
                    lane: id,
                    position: cursor,
                })?;
            }
            Instruction::Goto { target } => match find_forward(insts, cursor + 1, end, target) {
                Some(dest) => {
                    trace!(%target, from = cursor, to = dest, "goto");
                    cursor = dest;
                }
                None if find_forward(insts, start, cursor + 1, target).is_some() => {
                    return Ok(BlockTiming::Dynamic);
                }
                None => {
                    return Err(ResolveError::UnresolvedGotoTarget {
                        lane: id,
                        target: target.clone(),
                    });
                }
            },
        }
    }
}

fn defines(insts: &[Instruction], pos: usize, target: &Label) -> bool {
    insts.get(pos).and_then(Instruction::defined_label) == Some(target)
}

/// Position of the label `target` in `insts[from..to]`.
fn find_forward(insts: &[Instruction], from: usize, to: usize, target: &Label) -> Option<usize> {
    let to = to.min(insts.len());
    if from >= to {
        return None;
    }
    insts[from..to]
        .iter()
        .position(|i| i.defined_label() == Some(target))
        .map(|offset| from + offset)
}

/// Time of a lane up to its first barrier, or to its end if it has none.
pub fn lane_timing(lane: &LaneSequence) -> ResolveResult<BlockTiming> {
    let end = lane
        .barrier_positions()
        .first()
        .copied()
        .unwrap_or(lane.len());
    walk_block(lane, 0, end, 0)
}

//! Barrier insertion around concurrent blocks.
//!
//! Every concurrent block gets a start and an end synchronization point in
//! every lane of the function, including lanes that do not take part in it.
//! Idle lanes receive the two points back to back, so every lane ends up
//! with the same number of barriers in the same order. The first point of
//! the first block becomes a genuine [`Instruction::Wait`] when
//! `initial_wait` is set; that is the entry trigger every lane waits for.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use qlane_ir::{BarrierId, BlockId, Instruction, LaneId, LaneSequence};

use crate::flatten::Flat;

/// Inserts symmetric barriers into flattened lanes.
#[derive(Debug, Clone, Copy)]
pub struct SyncInserter {
    initial_wait: bool,
}

impl Default for SyncInserter {
    fn default() -> Self {
        Self { initial_wait: true }
    }
}

impl SyncInserter {
    pub fn new(initial_wait: bool) -> Self {
        Self { initial_wait }
    }

    /// Turn flattened lanes into lane sequences with barriers.
    ///
    /// Blocks are ordered by [`BlockId`]. A lane-tagged group is spliced into
    /// its own lane and dropped from every other lane.
    pub fn insert(&self, lanes: Vec<(LaneId, Vec<Flat>)>) -> Vec<LaneSequence> {
        let mut blocks: BTreeMap<BlockId, Vec<LaneId>> = BTreeMap::new();
        for (_, flats) in &lanes {
            collect_blocks(flats, &mut blocks);
        }
        for members in blocks.values_mut() {
            members.sort_unstable();
            members.dedup();
        }
        let order: Vec<(BlockId, Vec<LaneId>)> = blocks.into_iter().collect();
        debug!(blocks = order.len(), lanes = lanes.len(), "inserting synchronization");

        lanes
            .into_iter()
            .map(|(lane, flats)| {
                let mut emitter = LaneEmitter {
                    lane,
                    order: &order,
                    next: 0,
                    initial_wait: self.initial_wait,
                    out: Vec::new(),
                };
                emitter.emit(flats);
                emitter.idle_until(order.len());
                LaneSequence::with_instructions(lane, emitter.out)
            })
            .collect()
    }
}

fn collect_blocks(flats: &[Flat], blocks: &mut BTreeMap<BlockId, Vec<LaneId>>) {
    for flat in flats {
        match flat {
            Flat::Op(_) => {}
            Flat::Concurrent { block, lanes, body } => {
                blocks.entry(*block).or_default().extend(lanes.iter().copied());
                collect_blocks(body, blocks);
            }
            Flat::Lane { body, .. } => collect_blocks(body, blocks),
        }
    }
}

struct LaneEmitter<'a> {
    lane: LaneId,
    order: &'a [(BlockId, Vec<LaneId>)],
    /// Position in `order` of the next block not yet synchronized.
    next: usize,
    initial_wait: bool,
    out: Vec<Instruction>,
}

impl LaneEmitter<'_> {
    fn emit(&mut self, flats: Vec<Flat>) {
        for flat in flats {
            match flat {
                Flat::Op(inst) => self.out.push(inst),
                Flat::Lane { lane, body } => {
                    if lane == self.lane {
                        self.emit(body);
                    } else {
                        debug!(lane = %self.lane, group = %lane, "dropping group bound to another lane");
                    }
                }
                Flat::Concurrent { block, body, .. } => {
                    let Some(pos) = self.order.iter().position(|(id, _)| *id == block) else {
                        continue;
                    };
                    if pos < self.next {
                        warn!(lane = %self.lane, %block, "concurrent block out of order");
                    } else {
                        self.idle_until(pos);
                    }
                    self.next = self.next.max(pos + 1);
                    let start = self.sync_point(pos, true);
                    self.out.push(start);
                    self.emit(body);
                    let end = self.sync_point(pos, false);
                    self.out.push(end);
                }
            }
        }
    }

    /// Emit back-to-back points for every block this lane sits out.
    fn idle_until(&mut self, end: usize) {
        while self.next < end {
            let pair = [self.sync_point(self.next, true), self.sync_point(self.next, false)];
            self.out.extend(pair);
            self.next += 1;
        }
    }

    fn sync_point(&self, pos: usize, start: bool) -> Instruction {
        if self.initial_wait && pos == 0 && start {
            return Instruction::Wait;
        }
        let (_, lanes) = &self.order[pos];
        // Blocks are numbered in order, so 2k and 2k+1 are unique per function.
        let id = BarrierId(2 * pos as u32 + u32::from(!start));
        Instruction::barrier(id, lanes.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u32, lanes: &[u32], body: Vec<Flat>) -> Flat {
        Flat::Concurrent {
            block: BlockId(id),
            lanes: lanes.iter().map(|l| LaneId(*l)).collect(),
            body,
        }
    }

    fn op(name: &str, d: u64) -> Flat {
        Flat::Op(Instruction::pulse(name, d))
    }

    #[test]
    fn test_symmetric_barriers() {
        let lanes = vec![
            (LaneId(0), vec![block(0, &[0, 1], vec![op("X", 100)])]),
            (LaneId(1), vec![block(0, &[0, 1], vec![op("Y", 60)])]),
        ];
        let seqs = SyncInserter::new(false).insert(lanes);
        let members = [LaneId(0), LaneId(1)];
        assert_eq!(
            seqs[0].instructions,
            vec![
                Instruction::barrier(BarrierId(0), members),
                Instruction::pulse("X", 100),
                Instruction::barrier(BarrierId(1), members),
            ]
        );
        assert_eq!(seqs[1].barrier_count(), 2);
    }

    #[test]
    fn test_idle_lane_gets_back_to_back_pair() {
        let lanes = vec![
            (LaneId(0), vec![block(0, &[0], vec![op("X", 10)]), block(1, &[0], vec![op("Z", 5)])]),
            (LaneId(1), vec![op("Y", 20)]),
        ];
        let seqs = SyncInserter::default().insert(lanes);
        assert_eq!(
            seqs[1].instructions,
            vec![
                Instruction::pulse("Y", 20),
                Instruction::Wait,
                Instruction::barrier(BarrierId(1), [LaneId(0)]),
                Instruction::barrier(BarrierId(2), [LaneId(0)]),
                Instruction::barrier(BarrierId(3), [LaneId(0)]),
            ]
        );
        assert_eq!(seqs[0].instructions[0], Instruction::Wait);
        assert_eq!(seqs[0].barrier_count(), seqs[1].barrier_count());
    }

    #[test]
    fn test_lane_groups_are_spliced() {
        let flats = vec![
            Flat::Lane {
                lane: LaneId(0),
                body: vec![op("A", 1)],
            },
            Flat::Lane {
                lane: LaneId(1),
                body: vec![op("B", 2)],
            },
        ];
        let seqs = SyncInserter::new(false).insert(vec![(LaneId(0), flats.clone()), (LaneId(1), flats)]);
        assert_eq!(seqs[0].instructions, vec![Instruction::pulse("A", 1)]);
        assert_eq!(seqs[1].instructions, vec![Instruction::pulse("B", 2)]);
    }

    #[test]
    fn test_no_blocks_no_barriers() {
        let seqs = SyncInserter::default().insert(vec![(LaneId(3), vec![op("X", 1)])]);
        assert_eq!(seqs[0].lane, LaneId(3));
        assert_eq!(seqs[0].instructions, vec![Instruction::pulse("X", 1)]);
    }
}

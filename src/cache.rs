use std::{
    io::{self, Write},
    iter,
    ops::Range,
};

use crate::{
    replace::{Replace, Victim},
    stats::Stats,
};

/// A 64-byte-aligned unit of memory: `byte_address >> log2(block_size)`.
pub type BlockId = u64;
/// Logical time, incremented once per `access`.
pub type Time = u64;

/// Geometry of one cache level: `n_sets * n_ways` lines.
#[derive(Debug, Clone, Copy)]
pub struct Level {
    pub n_sets: usize,
    pub n_ways: usize,
}

impl Level {
    pub fn new(size_bytes: usize, block_size: usize, n_ways: usize) -> Self {
        Level {
            n_sets: size_bytes / block_size / n_ways,
            n_ways,
        }
    }

    fn set_range(&self, block: BlockId) -> Range<usize> {
        let set = (block % self.n_sets as u64) as usize;
        set * self.n_ways..(set + 1) * self.n_ways
    }
}

/// An L1 slot. L1 is managed by recency order regardless of the L2 policy,
/// so a timestamp is all the state it needs.
#[derive(Debug, Default, Clone, Copy)]
pub struct L1Line {
    pub valid: bool,
    pub tag: BlockId,
    pub stamp: Time,
}

/// An L2 slot, carrying the replacement policy's per-line state.
///
/// `in_l1` tracks inclusion: set whenever the block is (re)filled into or hit
/// in L1, cleared when the block's L1 copy is evicted. A valid L1 line whose
/// block is missing from L2 is a fatal invariant violation.
#[derive(Debug, Default, Clone, Copy)]
pub struct L2Line<S> {
    pub valid: bool,
    pub in_l1: bool,
    pub hits: u64,
    pub tag: BlockId,
    pub state: S,
}

fn inclusion_violation(policy: &str, block: BlockId) -> ! {
    panic!("{policy}: L2 inclusion violation for block {block:#x}");
}

/// An inclusive two-level hierarchy running one L2 replacement policy.
///
/// Lines are born invalid, become valid on first fill, and are overwritten in
/// place on eviction; the arrays never resize.
#[derive(Debug)]
pub struct Cache<P: Replace> {
    l1_geom: Level,
    l2_geom: Level,
    l1: Vec<L1Line>,
    l2: Vec<L2Line<P::State>>,
    repl: P,
    time: Time,
    stats: Stats,
}

impl<P: Replace> Cache<P> {
    pub fn new(l1_geom: Level, l2_geom: Level, repl: P) -> Self {
        Cache {
            l1: iter::repeat_with(L1Line::default)
                .take(l1_geom.n_sets * l1_geom.n_ways)
                .collect(),
            l2: iter::repeat_with(L2Line::default)
                .take(l2_geom.n_sets * l2_geom.n_ways)
                .collect(),
            l1_geom,
            l2_geom,
            repl,
            time: 0,
            stats: Stats::default(),
        }
    }

    /// Replay one block reference through the hierarchy.
    pub fn access(&mut self, block: BlockId) {
        self.time += 1;

        if self.l1_lookup(block) {
            return;
        }

        // L1 miss
        if self.l2_lookup(block) {
            // L2 hit
            self.fill_l1(block);
            return;
        }

        // L2 miss
        self.fill_l2(block);
        self.fill_l1(block);
    }

    fn l1_lookup(&mut self, block: BlockId) -> bool {
        self.stats.l1_accesses += 1;
        let now = self.time;
        let range = self.l1_geom.set_range(block);
        if let Some(line) = self.l1[range].iter_mut().find(|l| l.valid && l.tag == block) {
            line.stamp = now;
            // The access counts for L2 too: refresh the block's L2 line.
            let l2_range = self.l2_geom.set_range(block);
            match self.l2[l2_range].iter_mut().find(|l| l.valid && l.tag == block) {
                Some(l2_line) => {
                    self.repl.touch_from_l1(&mut l2_line.state, now);
                    l2_line.in_l1 = true;
                }
                None => inclusion_violation(P::NAME, block),
            }
            return true;
        }
        self.stats.l1_misses += 1;
        false
    }

    fn l2_lookup(&mut self, block: BlockId) -> bool {
        self.stats.l2_accesses += 1;
        let now = self.time;
        let range = self.l2_geom.set_range(block);
        if let Some(line) = self.l2[range].iter_mut().find(|l| l.valid && l.tag == block) {
            line.hits += 1;
            line.in_l1 = true;
            self.repl.touch(&mut line.state, now);
            return true;
        }
        self.stats.l2_misses += 1;
        false
    }

    fn fill_l1(&mut self, block: BlockId) {
        let now = self.time;
        let range = self.l1_geom.set_range(block);
        let base = range.start;
        let way = {
            let set = &self.l1[range];
            match set.iter().position(|l| !l.valid) {
                Some(way) => way,
                None => set
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, l)| l.stamp)
                    .map(|(way, _)| way)
                    .unwrap(),
            }
        };
        let victim = self.l1[base + way];
        if victim.valid {
            // Eviction from L1 releases the pin on the block's L2 line.
            let evicted = victim.tag;
            let l2_range = self.l2_geom.set_range(evicted);
            match self.l2[l2_range].iter_mut().find(|l| l.valid && l.tag == evicted) {
                Some(l2_line) => l2_line.in_l1 = false,
                None => inclusion_violation(P::NAME, evicted),
            }
        }
        let line = &mut self.l1[base + way];
        line.valid = true;
        line.tag = block;
        line.stamp = now;
    }

    fn fill_l2(&mut self, block: BlockId) {
        self.stats.l2_block_fills += 1;
        let now = self.time;
        let range = self.l2_geom.set_range(block);
        let base = range.start;
        let Victim { way, forced } = self.repl.victim(&mut self.l2[range], block);
        if forced {
            self.stats.forced_evictions += 1;
        }
        let line = &mut self.l2[base + way];
        if line.valid {
            match line.hits {
                0 => self.stats.l2_evicts_at_0_hit += 1,
                1 => self.stats.l2_evicts_at_1_hit += 1,
                _ => self.stats.l2_evicts_at_2_or_more_hits += 1,
            }
        }
        line.valid = true;
        line.in_l1 = true;
        line.hits = 0;
        line.tag = block;
        line.state = self.repl.fill_state(now);
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// True when every valid L1 line's block is also valid in L2.
    pub fn inclusion_holds(&self) -> bool {
        self.l1.iter().filter(|l| l.valid).all(|l| {
            let range = self.l2_geom.set_range(l.tag);
            self.l2[range].iter().any(|l2| l2.valid && l2.tag == l.tag)
        })
    }

    /// Number of L2 lines that have ever been filled.
    pub fn l2_valid_lines(&self) -> usize {
        self.l2.iter().filter(|l| l.valid).count()
    }
}

/// Object-safe view of a hierarchy, so the driver can run a mixed list of
/// policies over one stream.
pub trait PolicySim {
    fn name(&self) -> &'static str;
    fn access(&mut self, block: BlockId);
    fn stats(&self) -> &Stats;
    fn dump(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl<P: Replace> PolicySim for Cache<P> {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn access(&mut self, block: BlockId) {
        Cache::access(self, block);
    }

    fn stats(&self) -> &Stats {
        Cache::stats(self)
    }

    fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} Cache Statistics", P::NAME)?;
        self.stats.dump(out)
    }
}

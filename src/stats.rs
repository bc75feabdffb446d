use std::io::{self, Write};

use serde::Serialize;

fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Running counters for one policy's two-level hierarchy. All counters are
/// monotonic; the eviction buckets only count fills that displaced a
/// previously valid line, classified by how many L2 hits that line had
/// accumulated.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub l1_accesses: u64,
    pub l1_misses: u64,
    pub l2_accesses: u64,
    pub l2_misses: u64,
    pub l2_block_fills: u64,
    pub l2_evicts_at_0_hit: u64,
    pub l2_evicts_at_1_hit: u64,
    pub l2_evicts_at_2_or_more_hits: u64,
    /// Victim selections that had to bypass the policy's normal candidate
    /// order to avoid evicting an L1-resident line. Nonzero means the set
    /// was improperly pinned.
    pub forced_evictions: u64,
}

impl Stats {
    pub fn l1_miss_rate(&self) -> f64 {
        ratio(self.l1_misses, self.l1_accesses)
    }

    pub fn l2_miss_rate(&self) -> f64 {
        ratio(self.l2_misses, self.l2_accesses)
    }

    /// Fraction of L2 evictions with at least two hits among evictions with
    /// at least one hit.
    pub fn frac_evicts_at_least_2_hits(&self) -> f64 {
        let at_least_1 = self.l2_evicts_at_1_hit + self.l2_evicts_at_2_or_more_hits;
        ratio(self.l2_evicts_at_2_or_more_hits, at_least_1)
    }

    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "L1 Accesses:              {:>10}", self.l1_accesses)?;
        writeln!(
            out,
            "L1 Misses:                {:>10} {}",
            self.l1_misses,
            self.l1_miss_rate()
        )?;
        writeln!(out, "L2 Accesses:              {:>10}", self.l2_accesses)?;
        writeln!(
            out,
            "L2 Misses:                {:>10} {}",
            self.l2_misses,
            self.l2_miss_rate()
        )?;
        writeln!(out, "L2 Block Fills:           {:>10}", self.l2_block_fills)?;
        writeln!(
            out,
            "L2 Evicts at 0 Hit:       {:>10} {}",
            self.l2_evicts_at_0_hit,
            ratio(self.l2_evicts_at_0_hit, self.l2_block_fills)
        )?;
        writeln!(
            out,
            "L2 Evicts atleast 2 Hits: {:>10} {}",
            self.l2_evicts_at_2_or_more_hits,
            self.frac_evicts_at_least_2_hits()
        )?;
        if self.forced_evictions > 0 {
            writeln!(out, "Forced Evictions:         {:>10}", self.forced_evictions)?;
        }
        Ok(())
    }
}

/// Stats tagged with the owning policy's name, for JSON output.
#[derive(Serialize)]
pub struct NamedStats<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub stats: &'a Stats,
}

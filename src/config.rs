use serde::Deserialize;
use thiserror::Error;

use crate::{
    cache::{Cache, Level, PolicySim},
    replace::{lru::Lru, nru::Nru, srrip::Srrip},
};

const KB: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a power of two, got {value}")]
    NotPowerOfTwo { name: &'static str, value: usize },
    #[error("{level} has no sets ({size_kb} KB / {block_size} B blocks / {ways} ways)")]
    NoSets {
        level: &'static str,
        size_kb: usize,
        block_size: usize,
        ways: usize,
    },
    #[error("L2 set count ({l2}) must be a multiple of L1 set count ({l1})")]
    SetCountMismatch { l1: usize, l2: usize },
    #[error("L2 ways ({l2}) must exceed L1 ways ({l1}) or inclusion can pin a whole L2 set")]
    TooFewL2Ways { l1: usize, l2: usize },
    #[error("Unrecognized replacement policy: {0}")]
    UnknownPolicy(String),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LevelConfig {
    pub size_kb: usize,
    pub ways: usize,
}

/// Simulation parameters. The defaults are the classic inclusive-hierarchy
/// setup this tool was written to study: 64-byte blocks, a 64 KB 8-way L1
/// over a 1 MB 16-way L2, all three policies side by side.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub block_size: usize,
    pub l1: LevelConfig,
    pub l2: LevelConfig,
    pub policies: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            block_size: 64,
            l1: LevelConfig {
                size_kb: 64,
                ways: 8,
            },
            l2: LevelConfig {
                size_kb: 1024,
                ways: 16,
            },
            policies: vec!["lru".into(), "srrip".into(), "nru".into()],
        }
    }
}

fn power_of_two(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::NotPowerOfTwo { name, value })
    }
}

impl Config {
    pub fn block_shift(&self) -> u32 {
        self.block_size.ilog2()
    }

    fn level(&self, name: &'static str, lc: LevelConfig) -> Result<Level, ConfigError> {
        power_of_two(name, lc.ways)?;
        let level = Level::new(lc.size_kb * KB, self.block_size, lc.ways);
        if level.n_sets == 0 {
            return Err(ConfigError::NoSets {
                level: name,
                size_kb: lc.size_kb,
                block_size: self.block_size,
                ways: lc.ways,
            });
        }
        power_of_two(name, level.n_sets)?;
        Ok(level)
    }

    /// Validate the geometry and build one hierarchy per requested policy.
    pub fn to_caches(&self) -> Result<Vec<Box<dyn PolicySim>>, ConfigError> {
        power_of_two("block_size", self.block_size)?;
        let l1 = self.level("L1", self.l1)?;
        let l2 = self.level("L2", self.l2)?;
        // Inclusion constraints: every block of an L2 set must map to one L1
        // set, and that L1 set must not be able to pin the whole L2 set.
        if l2.n_sets % l1.n_sets != 0 {
            return Err(ConfigError::SetCountMismatch {
                l1: l1.n_sets,
                l2: l2.n_sets,
            });
        }
        if l2.n_ways <= l1.n_ways {
            return Err(ConfigError::TooFewL2Ways {
                l1: l1.n_ways,
                l2: l2.n_ways,
            });
        }

        self.policies
            .iter()
            .map(|policy| match policy.as_str() {
                "lru" => Ok(Box::new(Cache::new(l1, l2, Lru::new())) as Box<dyn PolicySim>),
                "srrip" => Ok(Box::new(Cache::new(l1, l2, Srrip::new())) as Box<dyn PolicySim>),
                "nru" => Ok(Box::new(Cache::new(l1, l2, Nru::new())) as Box<dyn PolicySim>),
                other => Err(ConfigError::UnknownPolicy(other.to_string())),
            })
            .collect()
    }
}

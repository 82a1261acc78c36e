use std::{fs::File, path::Path};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cache::{AccessResult, MissKind};

/// the counters of one unified-cache run
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub instruction_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub cold_fill_count: usize,
    pub eviction_count: usize,
    pub load_count: usize,
    pub store_count: usize,
    pub ignored_count: usize,
    pub malformed_count: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// record the outcome of one instruction fetch
    pub fn update_access(&mut self, result: &AccessResult) {
        self.instruction_count += 1;
        match result {
            AccessResult::Hit(_) => {
                self.hit_count += 1;
            }
            AccessResult::Miss(_, kind) => {
                self.miss_count += 1;
                match kind {
                    MissKind::ColdFill => self.cold_fill_count += 1,
                    MissKind::Eviction { .. } => self.eviction_count += 1,
                }
            }
        }
    }

    /// hits per instruction, 0.0 when no instruction was seen
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hit_count, self.instruction_count)
    }

    /// misses per instruction, 0.0 when no instruction was seen
    pub fn miss_rate(&self) -> f64 {
        ratio(self.miss_count, self.instruction_count)
    }

    pub fn report(&self) -> String {
        format!(
            "Total number of references to the cache: {}. \n\
             Number Hits   : {}\n\
             Number Misses : {}\n\
             Hit  rate: {:.2} \n\
             Miss rate: {:.2} \n",
            self.instruction_count,
            self.hit_count,
            self.miss_count,
            self.hit_rate(),
            self.miss_rate()
        )
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// what gets written by `--stat-output`
#[derive(Debug, Serialize)]
pub struct StatReport<'a, C: Serialize> {
    pub config: &'a C,
    pub statistics: &'a Statistics,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

impl<'a, C: Serialize> StatReport<'a, C> {
    pub fn new(config: &'a C, statistics: &'a Statistics) -> Self {
        Self {
            config,
            statistics,
            hit_rate: statistics.hit_rate(),
            miss_rate: statistics.miss_rate(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .wrap_err_with(|| format!("cannot create stat file {}", path.display()))?;
        serde_json::to_writer_pretty(file, self).wrap_err("cannot serialize statistics")?;
        Ok(())
    }
}

use std::io::BufRead;

use crate::sim::{SimComponent, SimRunner};

use super::{
    cache::{AgingCache, CacheGeometry, TagMatch},
    statistics::Statistics,
    trace::{RefKind, Reference, TraceEntry, TraceReader},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Running,
    Done,
}

/// Replays a trace against a unified cache.
///
/// Only instruction fetches reach the cache; loads and stores are read and counted
/// but not simulated.
pub struct Simulator<R> {
    cache: AgingCache,
    trace: TraceReader<R>,
    state: SimState,
}

impl<R: BufRead> Simulator<R> {
    pub fn new(geometry: CacheGeometry, tag_match: TagMatch, trace: R) -> Self {
        Self {
            cache: AgingCache::new(geometry, tag_match),
            trace: TraceReader::new(trace),
            state: SimState::Running,
        }
    }

    /// run the whole trace and return the final counters
    pub fn run(self) -> eyre::Result<Statistics> {
        let mut sim_runner = SimRunner::new(self, Statistics::new());
        sim_runner.run()?;
        let (_, statistics, consumed) = sim_runner.into_inner();
        tracing::info!(
            consumed,
            instructions = statistics.instruction_count,
            malformed = statistics.malformed_count,
            "trace finished"
        );
        Ok(statistics)
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn cache(&self) -> &AgingCache {
        &self.cache
    }

    fn process(&mut self, reference: Reference, statistics: &mut Statistics) {
        match reference.kind {
            RefKind::Instruction => {
                let result = self.cache.access(reference.addr);
                statistics.update_access(&result);
            }
            // the data side is not modeled
            RefKind::Load => statistics.load_count += 1,
            RefKind::Store => statistics.store_count += 1,
            RefKind::Other(_) => statistics.ignored_count += 1,
        }
    }
}

impl<R: BufRead> SimComponent for Simulator<R> {
    type SharedStatus = Statistics;

    /// consume one trace entry
    fn update(
        &mut self,
        statistics: &mut Self::SharedStatus,
        _current_cycle: usize,
    ) -> eyre::Result<(bool, bool)> {
        if self.state == SimState::Done {
            return Ok((false, false));
        }
        match self.trace.next_entry()? {
            Some(TraceEntry::Ref(reference)) => self.process(reference, statistics),
            Some(TraceEntry::Malformed) => statistics.malformed_count += 1,
            None => {
                self.state = SimState::Done;
                return Ok((false, false));
            }
        }
        Ok((true, true))
    }
}

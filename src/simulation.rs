use crate::contact_index::ContactIndex;
use crate::engine::{DailyStats, EpidemicEngine, StepOutcome, TerminalState};
use crate::error::{SimResult, SimulationError};
use crate::generator::NetworkGenerator;
use crate::graph::Graph;
use crate::history::{HistoryStore, Snapshot};
use crate::params::SimulationParams;
use crate::Day;
use rand::Rng;

/// One generated network plus its running epidemic and full day-by-day
/// history. The external surface of the crate: collaborators (a renderer, a
/// stats view) read the graph and snapshots handed out here and feed nothing
/// back.
pub struct Simulation {
    engine: EpidemicEngine,
    history: HistoryStore,
}

impl Simulation {
    /// Validates the parameters, generates a fresh network, and records the
    /// day-1 snapshot. Deterministic for a given RNG stream.
    pub fn generate(params: SimulationParams, rng: &mut impl Rng) -> SimResult<Self> {
        params.validate()?;
        let graph = NetworkGenerator::new(&params)?.run(rng)?;
        let index = ContactIndex::build(&graph);
        let engine = EpidemicEngine::new(graph, index, params, 1);
        let history = HistoryStore::new(engine.snapshot());
        Ok(Self { engine, history })
    }

    /// Advances one day from wherever the cursor stands. Stepping while the
    /// cursor is behind the head discards the recorded future first.
    pub fn step(&mut self, rng: &mut impl Rng) -> SimResult<StepOutcome> {
        let outcome = self.engine.step(rng)?;
        if outcome.stats.day > self.history.current().day {
            self.history.push(self.engine.snapshot());
        }
        Ok(outcome)
    }

    /// Moves one recorded day back and restores the engine from the snapshot.
    pub fn step_back(&mut self) -> SimResult<&Snapshot> {
        if self.history.step_back().is_none() {
            return Err(SimulationError::AtHistoryStart);
        }
        self.engine.restore(self.history.current());
        Ok(self.history.current())
    }

    /// Replays the next recorded day if one exists, otherwise simulates a new
    /// one. Replay restores state as recorded; nothing is recomputed.
    pub fn step_forward(&mut self, rng: &mut impl Rng) -> SimResult<&Snapshot> {
        if self.history.step_forward().is_some() {
            self.engine.restore(self.history.current());
            return Ok(self.history.current());
        }
        self.step(rng)?;
        Ok(self.history.current())
    }

    pub fn graph(&self) -> &Graph {
        self.engine.graph()
    }

    pub fn params(&self) -> &SimulationParams {
        self.engine.params()
    }

    pub fn day(&self) -> Day {
        self.engine.day()
    }

    pub fn terminal(&self) -> TerminalState {
        self.engine.terminal()
    }

    pub fn current_stats(&self) -> DailyStats {
        self.history.current().stats
    }

    pub fn population_mortality_rate(&self) -> f64 {
        self.engine.population_mortality_rate()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

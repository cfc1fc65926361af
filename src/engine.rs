use crate::contact_index::ContactIndex;
use crate::error::{SimResult, SimulationError};
use crate::graph::{Graph, Status};
use crate::history::Snapshot;
use crate::params::SimulationParams;
use crate::{Day, NodeId};
use fxhash::FxHashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Last simulated day; a step entered at or past it ends the run.
pub const YEAR_LIMIT: Day = 365;

/// Vaccinated contacts transmit at one fifth of the base probability.
const VACCINE_TRANSMISSION_FACTOR: f64 = 0.2;
/// How strongly full vaccination coverage suppresses population mortality.
const VACCINE_MORTALITY_FACTOR: f64 = 0.8;
/// Daily probability that recovered immunity wanes back to susceptible.
const WANING_PROBABILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalState {
    None,
    NaturalExtinction,
    YearLimit,
}

/// Per-status population counts for one day. Always sums to the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: Day,
    pub susceptible: usize,
    pub exposed: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub deceased: usize,
}

impl DailyStats {
    pub fn collect(day: Day, graph: &Graph) -> Self {
        let mut stats = Self {
            day,
            susceptible: 0,
            exposed: 0,
            infectious: 0,
            recovered: 0,
            deceased: 0,
        };
        for node in &graph.nodes {
            match node.status {
                Status::Susceptible => stats.susceptible += 1,
                Status::Exposed => stats.exposed += 1,
                Status::Infectious => stats.infectious += 1,
                Status::Recovered => stats.recovered += 1,
                Status::Deceased => stats.deceased += 1,
            }
        }
        stats
    }

    pub fn population(&self) -> usize {
        self.susceptible + self.exposed + self.infectious + self.recovered + self.deceased
    }

    /// The epidemic is still burning while anyone incubates or transmits.
    pub fn epidemic_active(&self) -> bool {
        self.exposed > 0 || self.infectious > 0
    }

    /// Extinct once nothing can transmit anymore but the disease left a mark.
    pub fn extinct(&self) -> bool {
        !self.epidemic_active() && (self.recovered > 0 || self.deceased > 0)
    }
}

pub struct StepOutcome {
    pub stats: DailyStats,
    pub terminal: TerminalState,
}

/// Discrete-time SEIRD state machine over a contact network.
///
/// Owns the graph and its index exclusively; one `step` advances exactly one
/// day. Every transition decided during a tick reads only the previous day's
/// statuses — staged results are committed in one batch at the end, so
/// nothing cascades within a tick. All draws happen in a fixed order
/// (distancing cohort, transmission per edge, outcomes, incubation, waning),
/// which makes a run reproducible for a seeded RNG.
pub struct EpidemicEngine {
    graph: Graph,
    index: ContactIndex,
    params: SimulationParams,
    day: Day,
    terminal: TerminalState,
}

impl EpidemicEngine {
    pub fn new(graph: Graph, index: ContactIndex, params: SimulationParams, day: Day) -> Self {
        let terminal = terminal_for(&DailyStats::collect(day, &graph), day);
        Self {
            graph,
            index,
            params,
            day,
            terminal,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn terminal(&self) -> TerminalState {
        self.terminal
    }

    pub fn stats(&self) -> DailyStats {
        DailyStats::collect(self.day, &self.graph)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.day, &self.graph)
    }

    /// Rewinds or replays the engine onto a recorded day. Restoration only
    /// copies state back; nothing is recomputed. The terminal flag is derived
    /// from the restored day so backtracking into a live day resumes stepping.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        snapshot.apply(&mut self.graph);
        self.day = snapshot.day;
        self.terminal = terminal_for(&snapshot.stats, snapshot.day);
    }

    /// Population mortality rate derived from the current parameters:
    /// the unchecked-spread fraction `1 - 1/(r0·(1-distancing))`, scaled by
    /// the infectious mortality rate and damped by vaccination coverage.
    /// Clamped into [0, 1].
    pub fn population_mortality_rate(&self) -> f64 {
        let r0_factor = self.params.r0 * (1.0 - self.params.social_distancing);
        let base = if r0_factor > 0.0 {
            1.0 - 1.0 / r0_factor
        } else {
            0.0
        };
        let vaccination_effect = 1.0 - self.params.vaccination_rate * VACCINE_MORTALITY_FACTOR;
        clamp01(base * self.params.infectious_mortality_rate * vaccination_effect)
    }

    /// Advances the simulation by one day.
    ///
    /// Returns the committed day's statistics together with the terminal
    /// state reached, if any. Once a terminal state is reported every further
    /// call fails with `SimulationEnded` until a new network is generated.
    pub fn step(&mut self, rng: &mut impl Rng) -> SimResult<StepOutcome> {
        if self.terminal != TerminalState::None {
            return Err(SimulationError::SimulationEnded {
                terminal: self.terminal,
            });
        }
        if self.day >= YEAR_LIMIT {
            self.terminal = TerminalState::YearLimit;
            return Ok(StepOutcome {
                stats: self.stats(),
                terminal: self.terminal,
            });
        }

        let today = self.day + 1;
        let population = self.graph.population();

        // 1. Fresh distancing cohort; membership is independent each day.
        let cohort = self.draw_cohort(rng);

        // Next-day statuses staged against the previous day's state.
        let mut staged: Vec<Option<Status>> = vec![None; population];

        // 2. Transmission along active edges of infectious nodes.
        let base_probability =
            self.params.r0 / (self.params.infectious_period as f64 * 5.0);
        for source in 0..population {
            if self.graph.nodes[source].status != Status::Infectious {
                continue;
            }
            for &neighbor in self.index.neighbors(source) {
                let edge_id = match self.index.edge_id(source, neighbor) {
                    Some(edge_id) => edge_id,
                    None => continue,
                };
                if !self.graph.edges[edge_id].active {
                    continue;
                }
                if self.graph.nodes[neighbor].status != Status::Susceptible {
                    continue;
                }

                let mut probability = base_probability;
                if cohort.contains(&source) || cohort.contains(&neighbor) {
                    probability *= 1.0 - self.params.social_distancing;
                }
                if rng.gen_bool(self.params.vaccination_rate) {
                    probability *= VACCINE_TRANSMISSION_FACTOR;
                }
                if rng.gen_bool(clamp01(probability)) {
                    staged[neighbor] = Some(Status::Exposed);
                    self.graph.edges[edge_id].last_transmission_day = Some(today);
                }
            }
        }

        // 3. Death first, else recovery, for every infectious node.
        let pmr = self.population_mortality_rate().min(1.0 - f64::EPSILON);
        let death_probability = clamp01(pmr * self.params.recovery_rate / (1.0 - pmr));
        let mut deceased: Vec<NodeId> = Vec::new();
        for node in 0..population {
            if self.graph.nodes[node].status != Status::Infectious {
                continue;
            }
            if rng.gen_bool(death_probability) {
                staged[node] = Some(Status::Deceased);
                deceased.push(node);
            } else if rng.gen_bool(self.params.recovery_rate) {
                staged[node] = Some(Status::Recovered);
            }
        }

        // 4. Incubation ends for exposed nodes.
        let incubation_probability = 1.0 / self.params.incubation_period as f64;
        for node in 0..population {
            if self.graph.nodes[node].status != Status::Exposed {
                continue;
            }
            if rng.gen_bool(incubation_probability) {
                staged[node] = Some(Status::Infectious);
            }
        }

        // 5. Waning immunity returns recovered nodes to the susceptible pool.
        for node in 0..population {
            if self.graph.nodes[node].status != Status::Recovered {
                continue;
            }
            if rng.gen_bool(WANING_PROBABILITY) {
                staged[node] = Some(Status::Susceptible);
            }
        }

        // 6. Commit the day atomically.
        self.day = today;
        for (node, status) in staged.into_iter().enumerate() {
            if let Some(status) = status {
                self.graph.nodes[node].status = status;
                self.graph.nodes[node].day = today;
            }
        }
        for &node in &deceased {
            for &neighbor in self.index.neighbors(node) {
                if let Some(edge_id) = self.index.edge_id(node, neighbor) {
                    self.graph.edges[edge_id].active = false;
                }
            }
        }

        let stats = DailyStats::collect(today, &self.graph);
        if stats.extinct() {
            self.terminal = TerminalState::NaturalExtinction;
        }

        Ok(StepOutcome {
            stats,
            terminal: self.terminal,
        })
    }

    fn draw_cohort(&self, rng: &mut impl Rng) -> FxHashSet<NodeId> {
        let mut cohort = FxHashSet::default();
        if self.params.social_distancing <= 0.0 {
            return cohort;
        }
        let population = self.graph.population();
        let size = (population as f64 * self.params.social_distancing).floor() as usize;
        while cohort.len() < size {
            cohort.insert(rng.gen_range(0..population));
        }
        cohort
    }
}

fn terminal_for(stats: &DailyStats, day: Day) -> TerminalState {
    if stats.extinct() {
        TerminalState::NaturalExtinction
    } else if day >= YEAR_LIMIT {
        TerminalState::YearLimit
    } else {
        TerminalState::None
    }
}

fn clamp01(probability: f64) -> f64 {
    probability.clamp(0.0, 1.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generator::NetworkGenerator;
    use assert_float_eq::*;
    use pcg_rand::Pcg64;
    use rand::SeedableRng;

    fn engine_for(params: SimulationParams, seed: u64) -> (EpidemicEngine, Pcg64) {
        let mut rng = Pcg64::seed_from_u64(seed);
        let graph = NetworkGenerator::new(&params)
            .unwrap()
            .run(&mut rng)
            .unwrap();
        let index = ContactIndex::build(&graph);
        (EpidemicEngine::new(graph, index, params, 1), rng)
    }

    #[test]
    fn day_one_counts_match_seeding() {
        let params = SimulationParams {
            population_size: 200,
            initial_infected: 10,
            r0: 2.5,
            incubation_period: 5,
            infectious_period: 10,
            recovery_rate: 0.05,
            social_distancing: 0.0,
            vaccination_rate: 0.0,
            mask_usage: 0.0,
            infectious_mortality_rate: 0.005,
        };
        let (engine, _) = engine_for(params, 17);
        let stats = engine.stats();
        assert_eq!(stats.day, 1);
        assert_eq!(stats.susceptible, 190);
        assert_eq!(stats.exposed, 0);
        assert_eq!(stats.infectious, 10);
        assert_eq!(stats.recovered, 0);
        assert_eq!(stats.deceased, 0);
    }

    #[test]
    fn population_is_conserved_every_tick() {
        let (mut engine, mut rng) = engine_for(SimulationParams::default(), 5);
        for _ in 0..60 {
            if engine.terminal() != TerminalState::None {
                break;
            }
            let outcome = engine.step(&mut rng).unwrap();
            assert_eq!(outcome.stats.population(), 200);
        }
    }

    #[test]
    fn deceased_is_absorbing() {
        let params = SimulationParams {
            population_size: 150,
            initial_infected: 30,
            r0: 10.0,
            infectious_period: 30,
            infectious_mortality_rate: 0.1,
            recovery_rate: 0.5,
            ..Default::default()
        };
        let (mut engine, mut rng) = engine_for(params, 23);

        let mut dead: Vec<NodeId> = Vec::new();
        for _ in 0..120 {
            if engine.terminal() != TerminalState::None {
                break;
            }
            engine.step(&mut rng).unwrap();
            for &node in &dead {
                assert_eq!(engine.graph().nodes[node].status, Status::Deceased);
            }
            dead = engine
                .graph()
                .nodes
                .iter()
                .filter(|n| n.status == Status::Deceased)
                .map(|n| n.id)
                .collect();
        }
        assert!(!dead.is_empty(), "mortality this high should kill someone");
    }

    #[test]
    fn death_deactivates_every_incident_edge() {
        let params = SimulationParams {
            population_size: 150,
            initial_infected: 30,
            r0: 10.0,
            infectious_period: 30,
            infectious_mortality_rate: 0.1,
            recovery_rate: 0.5,
            ..Default::default()
        };
        let (mut engine, mut rng) = engine_for(params, 29);
        for _ in 0..120 {
            if engine.terminal() != TerminalState::None {
                break;
            }
            engine.step(&mut rng).unwrap();
        }

        let graph = engine.graph();
        let dead: Vec<NodeId> = graph
            .nodes
            .iter()
            .filter(|n| n.status == Status::Deceased)
            .map(|n| n.id)
            .collect();
        assert!(!dead.is_empty());
        assert_eq!(graph.edges.len(), 3 + (150 - 3) * 2, "edges are never removed");
        for edge in &graph.edges {
            if dead.iter().any(|&node| edge.touches(node)) {
                assert!(!edge.active);
            }
        }
    }

    #[test]
    fn zero_mortality_never_kills() {
        // Out of the documented range on purpose: the engine must still hold
        // the deceased count at zero.
        let params = SimulationParams {
            population_size: 150,
            initial_infected: 20,
            infectious_mortality_rate: 0.0,
            ..Default::default()
        };
        let (mut engine, mut rng) = engine_for(params, 31);
        for _ in 0..200 {
            if engine.terminal() != TerminalState::None {
                break;
            }
            let outcome = engine.step(&mut rng).unwrap();
            assert_eq!(outcome.stats.deceased, 0);
        }
    }

    #[test]
    fn mortality_rate_formula() {
        let params = SimulationParams {
            r0: 2.5,
            social_distancing: 0.2,
            vaccination_rate: 0.5,
            infectious_mortality_rate: 0.01,
            ..Default::default()
        };
        let (engine, _) = engine_for(params, 1);
        // (1 - 1/(2.5 * 0.8)) * 0.01 * (1 - 0.5 * 0.8)
        assert_float_relative_eq!(engine.population_mortality_rate(), 0.003, 1e-9);
    }

    #[test]
    fn mortality_rate_clamps_negative_base() {
        // r0 under 1 makes the unchecked-spread fraction negative.
        let params = SimulationParams {
            r0: 0.5,
            ..Default::default()
        };
        let (engine, _) = engine_for(params, 1);
        assert_eq!(engine.population_mortality_rate(), 0.0);
    }

    #[test]
    fn extinction_is_terminal_and_rejects_stepping() {
        // No incoming infections: recovery empties the infectious pool fast.
        let params = SimulationParams {
            population_size: 100,
            initial_infected: 1,
            r0: 0.1,
            infectious_period: 30,
            recovery_rate: 0.5,
            ..Default::default()
        };
        let (mut engine, mut rng) = engine_for(params, 7);

        let mut terminal = TerminalState::None;
        for _ in 0..365 {
            let outcome = engine.step(&mut rng).unwrap();
            if outcome.terminal != TerminalState::None {
                terminal = outcome.terminal;
                break;
            }
        }
        assert_eq!(terminal, TerminalState::NaturalExtinction);
        assert!(matches!(
            engine.step(&mut rng),
            Err(SimulationError::SimulationEnded {
                terminal: TerminalState::NaturalExtinction,
            })
        ));
    }

    #[test]
    fn full_distancing_cohort_is_everyone() {
        let params = SimulationParams {
            social_distancing: 1.0,
            ..Default::default()
        };
        let (engine, mut rng) = engine_for(params, 13);
        let cohort = engine.draw_cohort(&mut rng);
        assert_eq!(cohort.len(), 200);
    }

    #[test]
    fn transmission_stamps_the_edge() {
        let params = SimulationParams {
            population_size: 200,
            initial_infected: 40,
            r0: 10.0,
            infectious_period: 2,
            recovery_rate: 0.01,
            ..Default::default()
        };
        let (mut engine, mut rng) = engine_for(params, 37);
        let outcome = engine.step(&mut rng).unwrap();
        assert!(outcome.stats.exposed > 0, "r0 of 10 must expose someone");

        let stamped = engine
            .graph()
            .edges
            .iter()
            .filter(|e| e.last_transmission_day == Some(2))
            .count();
        assert!(stamped > 0);
        for node in &engine.graph().nodes {
            if node.status == Status::Exposed {
                assert_eq!(node.day, 2);
            }
        }
    }
}

use crate::error::{SimResult, SimulationError};
use crate::graph::{EdgeRecord, Graph, NodeState, Status};
use crate::params::SimulationParams;
use crate::sampler::WeightedSampler;
use crate::{Day, NodeId};
use rand::Rng;

/// Size of the fully connected seed clique (m0).
pub const SEED_CLIQUE: usize = 3;
/// Edges attached per incoming node (m).
pub const ATTACH_EDGES: usize = 2;
/// Draw budget per incoming node before attachment is declared degenerate.
const MAX_ATTACH_ATTEMPTS: usize = 10_000;

const GENESIS_DAY: Day = 1;

/// Grows a Barabási–Albert contact network: a seed clique, then one node at a
/// time, each wired to `ATTACH_EDGES` distinct existing nodes drawn with
/// probability proportional to current degree.
///
/// Degrees and sampler weights move in lock-step, so the sampler is the only
/// degree bookkeeping the growth loop needs. Deterministic for a given RNG
/// stream.
pub struct NetworkGenerator {
    population: usize,
    initial_infected: usize,
    sampler: WeightedSampler,
    nodes: Vec<NodeState>,
    edges: Vec<EdgeRecord>,
}

impl NetworkGenerator {
    pub fn new(params: &SimulationParams) -> SimResult<Self> {
        if params.population_size < SEED_CLIQUE {
            return Err(SimulationError::PopulationBelowSeedClique {
                population: params.population_size,
                clique: SEED_CLIQUE,
            });
        }
        if params.initial_infected >= params.population_size {
            return Err(SimulationError::InitialInfectedExceedsPopulation {
                requested: params.initial_infected,
                maximum: params.population_size / 2,
            });
        }

        Ok(Self {
            population: params.population_size,
            initial_infected: params.initial_infected,
            sampler: WeightedSampler::new(params.population_size),
            nodes: Vec::with_capacity(params.population_size),
            edges: Vec::with_capacity(
                SEED_CLIQUE * (SEED_CLIQUE - 1) / 2
                    + (params.population_size - SEED_CLIQUE) * ATTACH_EDGES,
            ),
        })
    }

    pub fn run(mut self, rng: &mut impl Rng) -> SimResult<Graph> {
        self.seed_clique();

        for node in SEED_CLIQUE..self.population {
            self.push_node(node);
            let targets = self.draw_targets(node, rng)?;
            for &target in &targets {
                self.attach(node, target);
            }
        }

        Ok(Graph {
            nodes: self.nodes,
            edges: self.edges,
        })
    }

    fn seed_clique(&mut self) {
        for node in 0..SEED_CLIQUE {
            self.push_node(node);
            self.sampler.update(node, (SEED_CLIQUE - 1) as u64);
            for other in 0..node {
                self.edges.push(new_edge(node, other));
            }
        }
    }

    fn push_node(&mut self, id: NodeId) {
        // Lowest ids seed the outbreak. A reproducibility convention, not an
        // epidemiological statement.
        let status = if id < self.initial_infected {
            Status::Infectious
        } else {
            Status::Susceptible
        };
        self.nodes.push(NodeState {
            id,
            status,
            day: GENESIS_DAY,
        });
    }

    /// Draws `ATTACH_EDGES` distinct degree-weighted targets for `node`,
    /// rejecting the node itself and repeats. The new node carries no weight
    /// yet, so the total stays fixed across its draws.
    fn draw_targets(&self, node: NodeId, rng: &mut impl Rng) -> SimResult<Vec<NodeId>> {
        let total = self.sampler.total();
        let mut targets = Vec::with_capacity(ATTACH_EDGES);
        let mut attempts = 0;

        while targets.len() < ATTACH_EDGES {
            if attempts == MAX_ATTACH_ATTEMPTS {
                return Err(SimulationError::DegenerateSampling { node, attempts });
            }
            attempts += 1;

            let candidate = self.sampler.sample(rng.gen_range(0..total));
            if candidate == node || targets.contains(&candidate) {
                continue;
            }
            targets.push(candidate);
        }

        Ok(targets)
    }

    fn attach(&mut self, node: NodeId, target: NodeId) {
        self.edges.push(new_edge(node, target));
        self.sampler.update(node, 1);
        self.sampler.update(target, 1);
    }
}

fn new_edge(source: NodeId, target: NodeId) -> EdgeRecord {
    EdgeRecord {
        source,
        target,
        created_day: GENESIS_DAY,
        active: true,
        last_transmission_day: None,
    }
}

use crate::engine::TerminalState;
use crate::NodeId;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimulationError>;

/// Everything that can go wrong while configuring or driving a simulation.
///
/// Failed probabilistic rolls (a contact that does not transmit, a day without
/// recovery) are ordinary outcomes and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("parameter `{name}` is {value} but must lie in [{min}, {max}]")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{requested} initially infected exceeds the limit of {maximum} for this population")]
    InitialInfectedExceedsPopulation { requested: usize, maximum: usize },

    #[error("population of {population} is smaller than the seed clique of {clique}")]
    PopulationBelowSeedClique { population: usize, clique: usize },

    #[error("could not find distinct attachment targets for node {node} within {attempts} draws")]
    DegenerateSampling { node: NodeId, attempts: usize },

    #[error("simulation already ended ({terminal:?}); generate a new network to continue")]
    SimulationEnded { terminal: TerminalState },

    #[error("already at the first recorded day")]
    AtHistoryStart,
}

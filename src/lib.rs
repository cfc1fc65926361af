pub mod contact_index;
pub mod engine;
pub mod error;
pub mod generator;
pub mod graph;
pub mod history;
pub mod params;
pub mod sampler;
pub mod simulation;

pub type NodeId = usize;
pub type Day = u32;

pub mod prelude {
    use super::*;

    pub use super::{Day, NodeId};
    pub use contact_index::ContactIndex;
    pub use engine::{DailyStats, EpidemicEngine, StepOutcome, TerminalState};
    pub use error::{SimResult, SimulationError};
    pub use generator::NetworkGenerator;
    pub use graph::{EdgeRecord, Graph, NodeState, Status};
    pub use history::{HistoryStore, Snapshot};
    pub use params::SimulationParams;
    pub use sampler::WeightedSampler;
    pub use simulation::Simulation;
}

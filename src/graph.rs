use crate::{Day, NodeId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Compartment of a single individual. `Deceased` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub id: NodeId,
    pub status: Status,
    /// Tick of the last status change.
    pub day: Day,
}

/// One persistent contact relationship. Deactivated when an endpoint dies,
/// never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub created_day: Day,
    pub active: bool,
    pub last_transmission_day: Option<Day>,
}

impl EdgeRecord {
    /// Canonical (min, max) identity of the unordered pair.
    pub fn key(&self) -> (NodeId, NodeId) {
        (
            self.source.min(self.target),
            self.source.max(self.target),
        )
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<NodeState>,
    pub edges: Vec<EdgeRecord>,
}

impl Graph {
    pub fn population(&self) -> usize {
        self.nodes.len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for edge in &self.edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }
        degrees
    }
}

pub fn degree_distribution(degrees: impl Iterator<Item = usize>) -> Vec<(usize, usize)> {
    let mut counts = degrees.counts().into_iter().collect_vec();
    counts.sort_unstable();
    counts
}

pub fn report_distribution(
    degree_distr: &[(usize, usize)],
    writer: &mut impl Write,
) -> std::io::Result<()> {
    writer.write_all(
        degree_distr
            .iter()
            .map(|&(d, n)| format!("#DD {:>10}, {:>10}\n", d, n))
            .join("")
            .as_bytes(),
    )?;
    Ok(())
}

use crate::engine::DailyStats;
use crate::graph::{Graph, Status};
use crate::{Day, NodeId};
use serde::{Deserialize, Serialize};

/// Deep copy of everything a day of simulation can change: node statuses,
/// edge activity and transmission stamps, and the day's statistics.
/// Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub day: Day,
    pub stats: DailyStats,
    nodes: Vec<(Status, Day)>,
    edges: Vec<(bool, Option<Day>)>,
}

impl Snapshot {
    pub fn capture(day: Day, graph: &Graph) -> Self {
        Self {
            day,
            stats: DailyStats::collect(day, graph),
            nodes: graph.nodes.iter().map(|n| (n.status, n.day)).collect(),
            edges: graph
                .edges
                .iter()
                .map(|e| (e.active, e.last_transmission_day))
                .collect(),
        }
    }

    /// Writes the recorded state back onto a graph of the same shape.
    pub fn apply(&self, graph: &mut Graph) {
        assert_eq!(graph.nodes.len(), self.nodes.len());
        assert_eq!(graph.edges.len(), self.edges.len());
        for (node, &(status, day)) in graph.nodes.iter_mut().zip(&self.nodes) {
            node.status = status;
            node.day = day;
        }
        for (edge, &(active, last_transmission_day)) in graph.edges.iter_mut().zip(&self.edges) {
            edge.active = active;
            edge.last_transmission_day = last_transmission_day;
        }
    }

    pub fn status_of(&self, node: NodeId) -> Status {
        self.nodes[node].0
    }
}

/// Append-only log of per-day snapshots with a movable cursor.
///
/// The cursor marks the day the engine currently shows. Appending while the
/// cursor sits behind the head first discards everything after it — stepping
/// from the past rewrites the future, there are no branches.
#[derive(Debug)]
pub struct HistoryStore {
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl HistoryStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at_head(&self) -> bool {
        self.cursor + 1 == self.snapshots.len()
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor]
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        debug_assert!(snapshot.day > self.current().day, "days must increase");
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Moves the cursor one day back; `None` at the first snapshot.
    pub fn step_back(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Moves the cursor one recorded day forward; `None` at the head.
    pub fn step_forward(&mut self) -> Option<&Snapshot> {
        if self.at_head() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{EdgeRecord, NodeState, Status};

    fn tiny_graph() -> Graph {
        Graph {
            nodes: vec![
                NodeState {
                    id: 0,
                    status: Status::Infectious,
                    day: 1,
                },
                NodeState {
                    id: 1,
                    status: Status::Susceptible,
                    day: 1,
                },
            ],
            edges: vec![EdgeRecord {
                source: 1,
                target: 0,
                created_day: 1,
                active: true,
                last_transmission_day: None,
            }],
        }
    }

    fn snapshot_for_day(day: Day) -> Snapshot {
        Snapshot::capture(day, &tiny_graph())
    }

    #[test]
    fn capture_and_apply_round_trip() {
        let mut graph = tiny_graph();
        let recorded = Snapshot::capture(1, &graph);

        graph.nodes[1].status = Status::Exposed;
        graph.nodes[1].day = 2;
        graph.edges[0].active = false;
        graph.edges[0].last_transmission_day = Some(2);

        recorded.apply(&mut graph);
        assert_eq!(recorded.status_of(1), Status::Susceptible);
        assert_eq!(graph.nodes[1].status, Status::Susceptible);
        assert_eq!(graph.nodes[1].day, 1);
        assert!(graph.edges[0].active);
        assert_eq!(graph.edges[0].last_transmission_day, None);
        assert_eq!(Snapshot::capture(1, &graph), recorded);
    }

    #[test]
    fn cursor_walks_both_directions() {
        let mut history = HistoryStore::new(snapshot_for_day(1));
        history.push(snapshot_for_day(2));
        history.push(snapshot_for_day(3));

        assert!(history.at_head());
        assert_eq!(history.step_back().unwrap().day, 2);
        assert_eq!(history.step_back().unwrap().day, 1);
        assert!(history.step_back().is_none());
        assert_eq!(history.step_forward().unwrap().day, 2);
        assert_eq!(history.step_forward().unwrap().day, 3);
        assert!(history.step_forward().is_none());
    }

    #[test]
    fn pushing_from_the_past_discards_the_old_future() {
        let mut history = HistoryStore::new(snapshot_for_day(1));
        history.push(snapshot_for_day(2));
        history.push(snapshot_for_day(3));
        history.step_back();
        history.step_back();

        history.push(snapshot_for_day(2));
        assert_eq!(history.len(), 2);
        assert!(history.at_head());
        assert_eq!(history.current().day, 2);
    }

    #[test]
    fn days_stay_strictly_increasing() {
        let mut history = HistoryStore::new(snapshot_for_day(1));
        for day in 2..20 {
            history.push(snapshot_for_day(day));
        }
        let days: Vec<Day> = history.snapshots().iter().map(|s| s.day).collect();
        assert!(days.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(history.cursor(), days.len() - 1);
    }
}

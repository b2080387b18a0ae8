//! Ant agents and pheromone-biased transition selection.

use crate::model::{Edge, Graph};
use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// Outcome of a single [`AntAgent::advance`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Hop {
    /// The ant moved along an outgoing edge.
    Moved,
    /// The current node has no outgoing edges; the ant stays put.
    DeadEnd,
}

/// Walker of the journey graph.
///
/// The path starts with the initial node and grows by one node per move.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AntAgent {
    id: String,
    current_node: String,
    path: Vec<String>,
    speed: f64,
}

impl AntAgent {
    /// Create an ant positioned at `start`.
    pub fn new(id: impl Into<String>, start: impl Into<String>, speed: f64) -> Self {
        let start = start.into();
        Self {
            id: id.into(),
            path: vec![start.clone()],
            current_node: start,
            speed,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current_node(&self) -> &str {
        &self.current_node
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Configured speed. Movement does not depend on it.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Move to a neighbor chosen with probability proportional to edge strength.
    pub fn advance<R: Rng + ?Sized>(&mut self, graph: &Graph, rng: &mut R) -> Hop {
        let candidates: Vec<_> = graph.outgoing_edges(&self.current_node).collect();
        let Some(chosen) = select_edge(&candidates, rng) else {
            return Hop::DeadEnd;
        };

        let next = chosen.target.clone();
        self.path.push(next.clone());
        self.current_node = next;
        Hop::Moved
    }
}

/// Roulette-wheel selection over `candidates`.
///
/// Returns `None` only if `candidates` is empty. If the total strength is not
/// a positive finite number the first candidate is returned.
pub fn select_edge<'a, R: Rng + ?Sized>(candidates: &[&'a Edge], rng: &mut R) -> Option<&'a Edge> {
    let (&first, _) = candidates.split_first()?;

    let total: f64 = candidates.iter().map(|edge| edge.pheromone_strength).sum();
    let Ok(dist) = Uniform::new(0.0, total) else {
        return Some(first);
    };

    let mut r = dist.sample(rng);
    for &edge in candidates {
        r -= edge.pheromone_strength;
        if r <= 0.0 {
            return Some(edge);
        }
    }

    // Rounding can leave a tiny positive remainder.
    candidates.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PheromoneParams;
    use crate::model::tests::journey_graph;
    use crate::model::{GraphData, Node};
    use rand_chacha::ChaCha12Rng;

    fn fork_graph(a_to_b: f64, a_to_c: f64) -> Graph {
        let data = GraphData {
            nodes: vec![Node::new("a", "A"), Node::new("b", "B"), Node::new("c", "C")],
            edges: vec![Edge::new("a", "b", a_to_b), Edge::new("a", "c", a_to_c)],
        };
        Graph::build(data, &PheromoneParams::default()).expect("valid graph")
    }

    #[test]
    fn selection_follows_strength() {
        let graph = fork_graph(0.9, 0.1);
        let mut rng = ChaCha12Rng::seed_from_u64(0);

        let n_trials = 100_000;
        let mut n_b = 0;
        for _ in 0..n_trials {
            let mut ant = AntAgent::new("ant-0", "a", 2.0);
            assert_eq!(ant.advance(&graph, &mut rng), Hop::Moved);
            if ant.current_node() == "b" {
                n_b += 1;
            }
        }

        let freq_b = n_b as f64 / n_trials as f64;
        assert!((freq_b - 0.9).abs() < 0.01, "frequency of b is {freq_b}");
    }

    #[test]
    fn dead_end_leaves_ant_unchanged() {
        let graph = journey_graph();
        let mut rng = ChaCha12Rng::seed_from_u64(1);

        let mut ant = AntAgent::new("ant-0", "checkout", 2.0);
        let before = ant.clone();
        assert_eq!(ant.advance(&graph, &mut rng), Hop::DeadEnd);
        assert_eq!(ant, before);
    }

    #[test]
    fn path_grows_one_node_per_move() {
        let graph = journey_graph();
        let mut rng = ChaCha12Rng::seed_from_u64(2);

        let mut ant = AntAgent::new("ant-0", "home", 2.0);
        for _ in 0..10 {
            let before = ant.path().to_vec();
            let hop = ant.advance(&graph, &mut rng);
            let path = ant.path();
            match hop {
                Hop::Moved => {
                    assert_eq!(path.len(), before.len() + 1);
                    assert_eq!(&path[..before.len()], &before[..]);
                    assert_eq!(path.last().map(String::as_str), Some(ant.current_node()));
                    let prev = &before[before.len() - 1];
                    assert!(graph.find_edge(prev, ant.current_node()).is_some());
                }
                Hop::DeadEnd => assert_eq!(path, &before[..]),
            }
        }
        assert_eq!(ant.current_node(), "checkout");
        assert_eq!(ant.path()[0], "home");
    }

    #[test]
    fn zero_total_picks_first_candidate() {
        let edges = [Edge::new("a", "b", 0.0), Edge::new("a", "c", 0.0)];
        let candidates: Vec<_> = edges.iter().collect();
        let mut rng = ChaCha12Rng::seed_from_u64(3);

        for _ in 0..10 {
            let chosen = select_edge(&candidates, &mut rng).expect("candidates are not empty");
            assert_eq!(chosen.target, "b");
        }
    }

    /// Generator stuck at its largest output, so uniform samples sit just below the upper bound.
    struct MaxRng;

    impl RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(u8::MAX);
        }
    }

    #[test]
    fn rounding_remainder_picks_last_candidate() {
        for strengths in [[0.1, 0.1, 0.1], [0.3, 0.3, 0.3], [0.1, 0.2, 0.3]] {
            let edges = [
                Edge::new("a", "b", strengths[0]),
                Edge::new("a", "c", strengths[1]),
                Edge::new("a", "d", strengths[2]),
            ];
            let candidates: Vec<_> = edges.iter().collect();

            let chosen = select_edge(&candidates, &mut MaxRng).expect("candidates are not empty");
            assert_eq!(chosen.target, "d", "strengths {strengths:?}");
        }
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        assert!(select_edge(&[], &mut rng).is_none());
    }

    #[test]
    fn speed_is_kept() {
        let ant = AntAgent::new("ant-3", "home", 2.0);
        assert_eq!(ant.id(), "ant-3");
        assert_eq!(ant.speed(), 2.0);
        assert_eq!(ant.path(), ["home"]);
    }
}

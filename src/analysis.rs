use crate::config::Config;
use crate::model::{Graph, Snapshot};
use crate::stats::Accumulator;
use anyhow::{Context, Result, bail};
use rmp_serde::decode;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Fraction of the colony located at each node.
pub struct NodeOccupancy {
    acc_vec: Vec<(String, Accumulator)>,
}

impl NodeOccupancy {
    pub fn new(graph: &Graph) -> Self {
        let acc_vec = graph
            .nodes()
            .iter()
            .map(|node| (node.id.clone(), Accumulator::new()))
            .collect();
        Self { acc_vec }
    }
}

impl Obs for NodeOccupancy {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        let n_ants = snapshot.ants.len();
        if n_ants == 0 {
            return Ok(());
        }
        for (id, acc) in &mut self.acc_vec {
            let n_here = snapshot
                .ants
                .iter()
                .filter(|ant| ant.current_node() == id.as_str())
                .count();
            acc.add(n_here as f64 / n_ants as f64);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self
            .acc_vec
            .iter()
            .map(|(id, acc)| serde_json::json!({ "node": id, "occupancy": acc.report() }))
            .collect();
        serde_json::json!({ "node_occupancy": reports })
    }
}

/// Strength of each edge over time.
pub struct EdgeStrength {
    acc_vec: Vec<((String, String), Accumulator)>,
}

impl EdgeStrength {
    pub fn new(graph: &Graph) -> Self {
        let acc_vec = graph
            .edges()
            .iter()
            .map(|edge| ((edge.source.clone(), edge.target.clone()), Accumulator::new()))
            .collect();
        Self { acc_vec }
    }
}

impl Obs for EdgeStrength {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        let edges = &snapshot.graph.edges;
        if edges.len() != self.acc_vec.len() {
            bail!(
                "snapshot has {} edges, but {} were expected",
                edges.len(),
                self.acc_vec.len()
            );
        }
        for (((source, target), acc), edge) in self.acc_vec.iter_mut().zip(edges) {
            if edge.source != *source || edge.target != *target {
                bail!("snapshot edge {} -> {} is out of order", edge.source, edge.target);
            }
            acc.add(edge.pheromone_strength);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self
            .acc_vec
            .iter()
            .map(|((source, target), acc)| {
                serde_json::json!({ "source": source, "target": target, "strength": acc.report() })
            })
            .collect();
        serde_json::json!({ "edge_strength": reports })
    }
}

/// Fraction of the colony stuck at nodes without outgoing edges.
#[derive(Default)]
pub struct DeadEndFraction {
    acc: Accumulator,
}

impl DeadEndFraction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Obs for DeadEndFraction {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        let n_ants = snapshot.ants.len();
        if n_ants == 0 {
            return Ok(());
        }
        let sources: HashSet<_> = snapshot
            .graph
            .edges
            .iter()
            .map(|edge| edge.source.as_str())
            .collect();
        let n_stuck = snapshot
            .ants
            .iter()
            .filter(|ant| !sources.contains(ant.current_node()))
            .count();
        self.acc.add(n_stuck as f64 / n_ants as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "dead_end_fraction": self.acc.report() })
    }
}

pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config, graph: &Graph) -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(NodeOccupancy::new(graph)),
            Box::new(EdgeStrength::new(graph)),
            Box::new(DeadEndFraction::new()),
        ];
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        for obs in &mut self.obs_ptr_vec {
            obs.update(snapshot).context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.saves_per_file {
            let snapshot: Snapshot =
                decode::from_read(&mut reader).context("failed to read snapshot")?;
            self.add_snapshot(&snapshot)?;
        }
        Ok(())
    }

    pub fn reports(&self) -> Vec<serde_json::Value> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &self.reports()).context("failed to write results")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::model::tests::journey_data;

    fn engine() -> Engine {
        let mut cfg = Config::default();
        cfg.colony.seed = Some(21);
        cfg.colony.n_ants = 4;
        Engine::new(cfg, journey_data()).expect("failed to create engine")
    }

    #[test]
    fn occupancy_sums_to_one() {
        let mut engine = engine();
        let mut obs = NodeOccupancy::new(engine.graph());

        obs.update(&engine.snapshot()).expect("failed to update");
        engine.step();
        obs.update(&engine.snapshot()).expect("failed to update");

        let home = obs.acc_vec[0].1.report();
        assert_eq!(home.n_vals, 2);
        assert!((home.mean - 0.5).abs() < 1e-12);

        let total: f64 = obs.acc_vec.iter().map(|(_, acc)| acc.report().mean).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dead_end_fraction_counts_stuck_ants() {
        let mut engine = engine();
        let mut obs = DeadEndFraction::new();

        obs.update(&engine.snapshot()).expect("failed to update");
        for _ in 0..3 {
            engine.step();
        }
        obs.update(&engine.snapshot()).expect("failed to update");

        let report = obs.acc.report();
        assert!((report.mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn dead_end_fraction_starts_empty() {
        let obs = DeadEndFraction::default();
        let report = obs.acc.report();
        assert_eq!(report.n_vals, 0);
        assert!(report.mean.is_nan());
    }

    #[test]
    fn edge_strength_tracks_reinforcement() {
        let mut engine = engine();
        let mut obs = EdgeStrength::new(engine.graph());

        obs.update(&engine.snapshot()).expect("failed to update");
        engine.reinforce("cart").expect("cart is a node");
        obs.update(&engine.snapshot()).expect("failed to update");

        let home_cart = &obs.acc_vec[3];
        assert_eq!(home_cart.0, ("home".to_string(), "cart".to_string()));
        assert!((home_cart.1.report().mean - 0.8).abs() < 1e-12);
    }

    #[test]
    fn edge_strength_rejects_foreign_snapshot() {
        let engine = engine();
        let mut obs = EdgeStrength::new(engine.graph());

        let mut snapshot = engine.snapshot();
        snapshot.graph.edges.pop();
        assert!(obs.update(&snapshot).is_err());
    }

    #[test]
    fn analyzer_reports_every_observable() {
        let engine = engine();
        let mut analyzer = Analyzer::new(engine.cfg().clone(), engine.graph());
        analyzer
            .add_snapshot(&engine.snapshot())
            .expect("failed to add snapshot");

        let reports = analyzer.reports();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].get("node_occupancy").is_some());
        assert!(reports[1].get("edge_strength").is_some());
        assert!(reports[2].get("dead_end_fraction").is_some());
    }
}

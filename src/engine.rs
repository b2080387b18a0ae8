use crate::ant::{AntAgent, Hop};
use crate::config::Config;
use crate::error::NavigationError;
use crate::model::{Graph, GraphData, Snapshot};
use crate::pheromone;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Advance every ant by at most one hop.
///
/// Ants move independently of each other and the graph is not modified.
/// Returns the number of ants that moved.
pub fn tick<R: Rng + ?Sized>(graph: &Graph, ants: &mut [AntAgent], rng: &mut R) -> usize {
    ants.iter_mut()
        .map(|ant| ant.advance(graph, rng))
        .filter(|&hop| hop == Hop::Moved)
        .count()
}

/// Simulation engine.
///
/// Exclusively owns the configuration, the graph, the colony and the random
/// number generator, and provides methods to step, reinforce, save, and load
/// simulations. Readers only ever get a [`Snapshot`] or shared references.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    graph: Graph,
    ants: Vec<AntAgent>,
    step: usize,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with every ant at the start node.
    ///
    /// # Errors
    /// Fails if the configuration is invalid, `data` is not a valid graph,
    /// or there is no start node.
    pub fn new(cfg: Config, data: GraphData) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let graph = Graph::build(data, &cfg.pheromone).context("failed to build graph")?;

        let start = match &cfg.colony.start_node {
            Some(id) => {
                if !graph.contains_node(id) {
                    bail!("start node {id} is not a node of the graph");
                }
                id.clone()
            }
            None => graph
                .nodes()
                .first()
                .context("graph must have at least one node")?
                .id
                .clone(),
        };

        let rng = match cfg.colony.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let ants = (0..cfg.colony.n_ants)
            .map(|i_ant| AntAgent::new(format!("ant-{i_ant}"), start.as_str(), cfg.colony.ant_speed))
            .collect();

        log::info!(
            "created engine with {} nodes, {} edges and {} ants at {start}",
            graph.nodes().len(),
            graph.edges().len(),
            cfg.colony.n_ants
        );

        Ok(Self {
            cfg,
            graph,
            ants,
            step: 0,
            rng,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn ants(&self) -> &[AntAgent] {
        &self.ants
    }

    /// Number of ticks performed so far.
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Perform one tick. Returns the number of ants that moved.
    pub fn step(&mut self) -> usize {
        self.step += 1;
        tick(&self.graph, &mut self.ants, &mut self.rng)
    }

    /// Apply a navigation event towards `target`.
    pub fn reinforce(&mut self, target: &str) -> Result<(), NavigationError> {
        pheromone::reinforce(&mut self.graph, target)
    }

    /// Evaporate every edge once, without reinforcing any.
    pub fn evaporate(&mut self) {
        pheromone::evaporate(&mut self.graph);
    }

    /// Copy of the current graph and colony.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            graph: self.graph.to_data(),
            ants: self.ants.clone(),
        }
    }

    /// Perform the simulation and save the resulting snapshots to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let steps_per_save = self.cfg.output.steps_per_save;
        let saves_per_file = self.cfg.output.saves_per_file;

        for i_save in 0..saves_per_file {
            let mut n_moves = 0;
            for _ in 0..steps_per_save {
                n_moves += self.step();
            }

            encode::write(&mut writer, &self.snapshot()).context("failed to serialize snapshot")?;

            log::debug!("step {}: {n_moves} moves since last save", self.step);
            let progress = 100.0 * (i_save + 1) as f64 / saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    ///
    /// The decoded graph and colony are checked with the same rules as a new engine.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let mut engine: Engine =
            decode::from_read(&mut reader).context("failed to deserialize engine")?;
        engine.revalidate().context("invalid checkpoint")?;
        Ok(engine)
    }

    fn revalidate(&mut self) -> Result<()> {
        self.cfg.validate().context("failed to validate config")?;

        if self.graph.params() != &self.cfg.pheromone {
            bail!("graph parameters differ from the config");
        }
        self.graph =
            Graph::build(self.graph.to_data(), &self.cfg.pheromone).context("failed to build graph")?;

        for ant in &self.ants {
            if let Some(id) = ant.path().iter().find(|id| !self.graph.contains_node(id)) {
                bail!("{} visited unknown node {id}", ant.id());
            }
            if ant.path().last().map(String::as_str) != Some(ant.current_node()) {
                bail!("{} is not at the end of its path", ant.id());
            }
        }

        Ok(())
    }
}

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use crate::journey::load_journey;
use crate::model::Edge;
use anyhow::{Context, Result, bail};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Layout of a simulation directory.
///
/// The directory holds `config.toml` and `journey.csv`, plus one `run-NNNN`
/// directory per run with its checkpoint, trajectory files and results.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let journey_file = self.journey_file();
        let data = load_journey(&journey_file)
            .with_context(|| format!("failed to load {journey_file:?}"))?;
        let engine = Engine::new(self.cfg.clone(), data).context("failed to construct engine")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        self.simulate(run_idx, 0, engine)
    }

    pub fn resume_run(&self, run_idx: usize) -> Result<()> {
        let file_idx = self
            .count_trajectory_files(run_idx)
            .context("failed to count trajectory files")?;

        let engine = self.load_engine(run_idx)?;

        self.simulate(run_idx, file_idx, engine)
    }

    /// Apply one navigation event to the latest state of a run.
    pub fn navigate(&self, run_idx: usize, target: &str) -> Result<()> {
        let mut engine = self.load_engine(run_idx)?;

        engine
            .reinforce(target)
            .with_context(|| format!("failed to reinforce {target}"))?;
        log::info!("reinforced edges ending at {target}");

        let checkpoint_file = self.checkpoint_file(run_idx);
        engine
            .save_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to save {checkpoint_file:?}"))?;

        Ok(())
    }

    /// Navigation options of a run, strongest first.
    pub fn rank(&self, run_idx: usize, from: Option<&str>) -> Result<Vec<Edge>> {
        let engine = self.load_engine(run_idx)?;
        let graph = engine.graph();

        if let Some(from) = from {
            if !graph.contains_node(from) {
                bail!("node {from} is not a node of the graph");
            }
        }

        Ok(graph.ranked_edges(from).into_iter().cloned().collect())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let engine = self.load_engine(run_idx)?;
            let mut analyzer = Analyzer::new(self.cfg.clone(), engine.graph());

            let n_files = self
                .count_trajectory_files(run_idx)
                .context("failed to count trajectory files")?;
            for file_idx in 0..n_files {
                analyzer
                    .add_file(self.trajectory_file(run_idx, file_idx))
                    .context("failed to add file")?;
            }

            let results_file = self.results_file(run_idx);
            analyzer
                .save_results(&results_file)
                .context("failed to save results")?;
            log::info!("saved {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir).with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn simulate(&self, run_idx: usize, file_idx: usize, mut engine: Engine) -> Result<()> {
        engine
            .perform_simulation(self.trajectory_file(run_idx, file_idx))
            .context("failed to perform simulation")?;

        engine
            .save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    fn load_engine(&self, run_idx: usize) -> Result<Engine> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let engine = Engine::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if engine.cfg() != &self.cfg {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");
        Ok(engine)
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn count_trajectory_files(&self, run_idx: usize) -> Result<usize> {
        let pattern = self.run_dir(run_idx).join("trajectory-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob trajectory files")?
            .filter_map(Result::ok)
            .count();
        Ok(count)
    }

    fn journey_file(&self) -> PathBuf {
        self.sim_dir.join("journey.csv")
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn trajectory_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("trajectory-{file_idx:04}.msgpack"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
[colony]
n_ants = 3
seed = 17

[output]
steps_per_save = 2
saves_per_file = 3
";

    const JOURNEY: &str = "\
source,target,weight,label
home,products,0.9,
products,cart,0.8,
cart,checkout,0.85,
home,cart,0.6,
products,checkout,0.4,
";

    fn sim_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("config.toml"), CONFIG).expect("failed to write config");
        fs::write(dir.path().join("journey.csv"), JOURNEY).expect("failed to write journey");
        dir
    }

    #[test]
    fn create_resume_and_analyze() {
        let dir = sim_dir();
        let mgr = Manager::new(dir.path()).expect("failed to construct mgr");

        mgr.create_run().expect("failed to create run");
        mgr.resume_run(0).expect("failed to resume run");
        assert_eq!(mgr.count_run_dirs().expect("failed to count"), 1);
        assert_eq!(mgr.count_trajectory_files(0).expect("failed to count"), 2);

        mgr.analyze_sim().expect("failed to analyze");
        let results = fs::read_to_string(mgr.results_file(0)).expect("failed to read results");
        let results: serde_json::Value = serde_json::from_str(&results).expect("invalid json");
        assert_eq!(results.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn navigate_changes_ranking() {
        let dir = sim_dir();
        let mgr = Manager::new(dir.path()).expect("failed to construct mgr");
        mgr.create_run().expect("failed to create run");

        let ranked = mgr.rank(0, Some("home")).expect("failed to rank");
        assert_eq!(ranked[0].target, "products");

        mgr.navigate(0, "cart").expect("failed to navigate");
        let ranked = mgr.rank(0, Some("home")).expect("failed to rank");
        assert_eq!(ranked[0].target, "cart");
        assert_eq!(ranked[0].pheromone_strength, 1.0);

        assert!(mgr.navigate(0, "account").is_err());
        assert!(mgr.rank(0, Some("account")).is_err());
    }

    #[test]
    fn clean_removes_runs() {
        let dir = sim_dir();
        let mgr = Manager::new(dir.path()).expect("failed to construct mgr");
        mgr.create_run().expect("failed to create run");
        mgr.create_run().expect("failed to create run");
        assert_eq!(mgr.count_run_dirs().expect("failed to count"), 2);

        mgr.clean_sim().expect("failed to clean");
        assert_eq!(mgr.count_run_dirs().expect("failed to count"), 0);
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn missing_config_fails() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        assert!(Manager::new(dir.path()).is_err());
    }
}

use crate::utils::{check_finite, check_num};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Pheromone dynamics parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PheromoneParams {
    /// Fraction of strength lost by every edge not reinforced in a pass.
    pub evaporation_rate: f64,
    /// Strength added to every edge ending at the reinforced node.
    pub deposit: f64,
    /// Lower bound of edge strength.
    pub min: f64,
    /// Upper bound of edge strength.
    pub max: f64,
}

impl Default for PheromoneParams {
    fn default() -> Self {
        Self {
            evaporation_rate: 0.1,
            deposit: 0.5,
            min: 0.1,
            max: 1.0,
        }
    }
}

impl PheromoneParams {
    /// Clamp a strength into `[min, max]`. NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.evaporation_rate, 0.0..1.0).context("invalid evaporation rate")?;
        check_num(self.deposit, 0.0..).context("invalid deposit")?;
        check_finite(self.deposit).context("invalid deposit")?;
        check_finite(self.min).context("invalid minimum strength")?;
        check_finite(self.max).context("invalid maximum strength")?;
        if self.min <= 0.0 {
            bail!("minimum strength must be positive, but is {}", self.min);
        }
        check_num(self.max, self.min..).context("invalid maximum strength")?;
        Ok(())
    }
}

/// Ant colony parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColonyParams {
    /// Number of ants.
    pub n_ants: usize,
    /// Speed assigned to every ant. Reserved: one tick is always one hop.
    pub ant_speed: f64,
    /// Node every ant starts at (first node of the graph if absent).
    pub start_node: Option<String>,
    /// Seed of the random number generator (OS entropy if absent).
    pub seed: Option<u64>,
}

impl Default for ColonyParams {
    fn default() -> Self {
        Self {
            n_ants: 5,
            ant_speed: 2.0,
            start_node: None,
            seed: None,
        }
    }
}

impl ColonyParams {
    fn validate(&self) -> Result<()> {
        check_num(self.n_ants, 1..100_000).context("invalid number of ants")?;
        check_num(self.ant_speed, 0.0..).context("invalid ant speed")?;
        check_finite(self.ant_speed).context("invalid ant speed")?;
        Ok(())
    }
}

/// Trajectory output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputParams {
    /// Number of ticks between snapshot saves.
    pub steps_per_save: usize,
    /// Number of snapshots written per trajectory file.
    pub saves_per_file: usize,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            steps_per_save: 16,
            saves_per_file: 64,
        }
    }
}

impl OutputParams {
    fn validate(&self) -> Result<()> {
        check_num(self.steps_per_save, 1..10_000).context("invalid number of steps per save")?;
        check_num(self.saves_per_file, 1..10_000).context("invalid number of saves per file")?;
        Ok(())
    }
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pheromone: PheromoneParams,
    pub colony: ColonyParams,
    pub output: OutputParams,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded; omitted sections and keys take their
    /// default values. Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pheromone
            .validate()
            .context("invalid pheromone parameters")?;
        self.colony.validate().context("invalid colony parameters")?;
        self.output.validate().context("invalid output parameters")?;
        Ok(())
    }
}

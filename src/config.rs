//! Serializable description of a dispersal simulation.
//!
//! Rasters are not part of the document. They are loaded by the caller and
//! attached when the models are built.

use crate::model::{DEFAULT_JUMP_PROB, DEFAULT_SPOTRANGE};
use crate::{
    Decay, DispersalModel, DispersalNeighborhood, HumanDispersal, HumanImpactAt,
    InwardsLocalDispersal, JumpDispersal, Layers, OutwardsLocalDispersal, Overflow, Result,
    SquareGrid, State,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_radius() -> usize {
    3
}

fn default_local_prob() -> f64 {
    1.0
}

fn default_jump_prob() -> f64 {
    DEFAULT_JUMP_PROB
}

fn default_spotrange() -> usize {
    DEFAULT_SPOTRANGE
}

fn default_timesteps() -> usize {
    1
}

/// Kernel shape and edge policy of a local model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub decay: Decay,
    #[serde(default = "default_radius")]
    pub radius: usize,
    #[serde(default)]
    pub overflow: Overflow,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            decay: Decay::default(),
            radius: default_radius(),
            overflow: Overflow::default(),
        }
    }
}

impl KernelConfig {
    pub fn build(&self) -> Result<DispersalNeighborhood> {
        let decay = self.decay;
        DispersalNeighborhood::from_decay(move |d| decay.eval(d), self.radius, self.overflow)
    }
}

/// One model, tagged by `"model"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelConfig {
    InwardsLocal {
        #[serde(default)]
        kernel: KernelConfig,
        #[serde(default = "default_local_prob")]
        prob: f64,
        #[serde(default)]
        suitability_threshold: f64,
    },
    OutwardsLocal {
        #[serde(default)]
        kernel: KernelConfig,
        #[serde(default = "default_local_prob")]
        prob: f64,
        #[serde(default)]
        suitability_threshold: f64,
    },
    Jump {
        #[serde(default = "default_jump_prob")]
        prob: f64,
        #[serde(default = "default_spotrange")]
        spotrange: usize,
        #[serde(default)]
        suitability_threshold: f64,
    },
    Human {
        #[serde(default = "default_jump_prob")]
        prob: f64,
        #[serde(default = "default_spotrange")]
        spotrange: usize,
        #[serde(default)]
        suitability_threshold: f64,
        #[serde(default)]
        human_impact_at: HumanImpactAt,
    },
}

impl ModelConfig {
    /// Build the model, attaching `layers`.
    pub fn build(&self, layers: Layers) -> Result<DispersalModel> {
        let model = match *self {
            ModelConfig::InwardsLocal {
                ref kernel,
                prob,
                suitability_threshold,
            } => InwardsLocalDispersal::new(kernel.build()?)
                .with_layers(layers)
                .with_prob(prob)?
                .with_suitability_threshold(suitability_threshold)
                .into(),
            ModelConfig::OutwardsLocal {
                ref kernel,
                prob,
                suitability_threshold,
            } => OutwardsLocalDispersal::new(kernel.build()?)
                .with_layers(layers)
                .with_prob(prob)?
                .with_suitability_threshold(suitability_threshold)
                .into(),
            ModelConfig::Jump {
                prob,
                spotrange,
                suitability_threshold,
            } => JumpDispersal::default()
                .with_layers(layers)
                .with_prob(prob)?
                .with_spotrange(spotrange)
                .with_suitability_threshold(suitability_threshold)
                .into(),
            ModelConfig::Human {
                prob,
                spotrange,
                suitability_threshold,
                human_impact_at,
            } => HumanDispersal::default()
                .with_layers(layers)
                .with_prob(prob)?
                .with_spotrange(spotrange)
                .with_suitability_threshold(suitability_threshold)
                .with_impact_at(human_impact_at)
                .into(),
        };
        Ok(model)
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_timesteps")]
    pub timesteps: usize,
    #[serde(default)]
    pub start_time: f64,
    pub models: Vec<ModelConfig>,
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        debug!(
            models = config.models.len(),
            timesteps = config.timesteps,
            "parsed dispersal config"
        );
        Ok(config)
    }

    /// Build every model, all sharing the same `layers`.
    pub fn build_models(&self, layers: Layers) -> Result<Vec<DispersalModel>> {
        self.models
            .iter()
            .map(|model| model.build(layers.clone()))
            .collect()
    }

    /// Build a grid over `cells`, ready to run for `timesteps`.
    pub fn build_grid<C: State>(&self, cells: Array2<C>, layers: Layers) -> Result<SquareGrid<C>> {
        SquareGrid::new(self.build_models(layers)?, cells, self.seed)?
            .with_start_time(self.start_time)
    }

    /// Build a grid over `cells` and run it for `timesteps`, returning every
    /// frame.
    pub fn simulate<C: State>(&self, cells: Array2<C>, layers: Layers) -> Result<Vec<Array2<C>>> {
        let mut grid = self.build_grid(cells, layers)?;
        Ok(grid.run_recorded(self.timesteps))
    }
}

//! Immutable configuration records for the dispersal models.

use crate::error::check_probability;
use crate::{DispersalNeighborhood, Layer, Layers, Result};
use serde::{Deserialize, Serialize};

/// Default jump window, in cells.
pub const DEFAULT_SPOTRANGE: usize = 30;
/// Default base probability for long-range models.
pub const DEFAULT_JUMP_PROB: f64 = 0.1;

/// Local dispersal computed from the point of view of the receiving cell.
///
/// Every unoccupied cell gathers pressure from its occupied neighbours and is
/// invaded with probability `pressure * suitability * prob`.
#[derive(Clone, Debug, PartialEq)]
pub struct InwardsLocalDispersal {
    pub(crate) neighborhood: DispersalNeighborhood,
    pub(crate) layers: Layers,
    pub(crate) prob: f64,
    pub(crate) suitability_threshold: f64,
}

/// Local dispersal computed from the point of view of the source cell.
///
/// Only occupied cells are visited. Each one tries every neighbour in its
/// kernel independently. This is cheaper than [`InwardsLocalDispersal`] while
/// few cells are occupied.
#[derive(Clone, Debug, PartialEq)]
pub struct OutwardsLocalDispersal {
    pub(crate) neighborhood: DispersalNeighborhood,
    pub(crate) layers: Layers,
    pub(crate) prob: f64,
    pub(crate) suitability_threshold: f64,
}

/// Long range dispersal to one random cell within `spotrange`.
#[derive(Clone, Debug, PartialEq)]
pub struct JumpDispersal {
    pub(crate) layers: Layers,
    pub(crate) prob: f64,
    pub(crate) spotrange: usize,
    pub(crate) suitability_threshold: f64,
}

/// Where human impact is read for [`HumanDispersal`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanImpactAt {
    Source,
    Target,
}

impl Default for HumanImpactAt {
    fn default() -> Self {
        HumanImpactAt::Source
    }
}

/// Jump dispersal weighted by human presence.
#[derive(Clone, Debug, PartialEq)]
pub struct HumanDispersal {
    pub(crate) layers: Layers,
    pub(crate) prob: f64,
    pub(crate) spotrange: usize,
    pub(crate) suitability_threshold: f64,
    pub(crate) impact_at: HumanImpactAt,
}

fn no_layers() -> Layers {
    Vec::<Layer>::new().into()
}

macro_rules! common_builders {
    ($t:ty) => {
        impl $t {
            /// Set the base probability. Must be within `[0, 1]`.
            pub fn with_prob(mut self, prob: f64) -> Result<Self> {
                self.prob = check_probability(prob)?;
                Ok(self)
            }

            /// Cells must be strictly more suitable than this to be invaded.
            pub fn with_suitability_threshold(mut self, threshold: f64) -> Self {
                self.suitability_threshold = threshold;
                self
            }

            pub fn with_layers(mut self, layers: impl Into<Layers>) -> Self {
                self.layers = layers.into();
                self
            }

            #[inline]
            pub fn layers(&self) -> &[Layer] {
                &self.layers
            }

            #[inline]
            pub fn prob(&self) -> f64 {
                self.prob
            }

            #[inline]
            pub fn suitability_threshold(&self) -> f64 {
                self.suitability_threshold
            }
        }
    };
}

common_builders!(InwardsLocalDispersal);
common_builders!(OutwardsLocalDispersal);
common_builders!(JumpDispersal);
common_builders!(HumanDispersal);

impl InwardsLocalDispersal {
    pub fn new(neighborhood: DispersalNeighborhood) -> Self {
        Self {
            neighborhood,
            layers: no_layers(),
            prob: 1.0,
            suitability_threshold: 0.0,
        }
    }

    #[inline]
    pub fn neighborhood(&self) -> &DispersalNeighborhood {
        &self.neighborhood
    }
}

impl OutwardsLocalDispersal {
    pub fn new(neighborhood: DispersalNeighborhood) -> Self {
        Self {
            neighborhood,
            layers: no_layers(),
            prob: 1.0,
            suitability_threshold: 0.0,
        }
    }

    #[inline]
    pub fn neighborhood(&self) -> &DispersalNeighborhood {
        &self.neighborhood
    }
}

impl Default for JumpDispersal {
    fn default() -> Self {
        Self {
            layers: no_layers(),
            prob: DEFAULT_JUMP_PROB,
            spotrange: DEFAULT_SPOTRANGE,
            suitability_threshold: 0.0,
        }
    }
}

impl JumpDispersal {
    pub fn with_spotrange(mut self, spotrange: usize) -> Self {
        self.spotrange = spotrange;
        self
    }

    #[inline]
    pub fn spotrange(&self) -> usize {
        self.spotrange
    }
}

impl Default for HumanDispersal {
    fn default() -> Self {
        Self {
            layers: no_layers(),
            prob: DEFAULT_JUMP_PROB,
            spotrange: DEFAULT_SPOTRANGE,
            suitability_threshold: 0.0,
            impact_at: HumanImpactAt::Source,
        }
    }
}

impl HumanDispersal {
    pub fn with_spotrange(mut self, spotrange: usize) -> Self {
        self.spotrange = spotrange;
        self
    }

    pub fn with_impact_at(mut self, impact_at: HumanImpactAt) -> Self {
        self.impact_at = impact_at;
        self
    }

    #[inline]
    pub fn spotrange(&self) -> usize {
        self.spotrange
    }

    #[inline]
    pub fn impact_at(&self) -> HumanImpactAt {
        self.impact_at
    }
}

/// One of the dispersal models, dispatched by [`crate::rule`].
#[derive(Clone, Debug, PartialEq)]
pub enum DispersalModel {
    InwardsLocal(InwardsLocalDispersal),
    OutwardsLocal(OutwardsLocalDispersal),
    Jump(JumpDispersal),
    Human(HumanDispersal),
}

impl DispersalModel {
    /// Partial models only visit occupied cells and write into other cells.
    #[inline]
    pub fn is_partial(&self) -> bool {
        !matches!(self, DispersalModel::InwardsLocal(_))
    }

    pub fn layers(&self) -> &[Layer] {
        match self {
            DispersalModel::InwardsLocal(m) => m.layers(),
            DispersalModel::OutwardsLocal(m) => m.layers(),
            DispersalModel::Jump(m) => m.layers(),
            DispersalModel::Human(m) => m.layers(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispersalModel::InwardsLocal(_) => "inwards_local",
            DispersalModel::OutwardsLocal(_) => "outwards_local",
            DispersalModel::Jump(_) => "jump",
            DispersalModel::Human(_) => "human",
        }
    }

    /// Check every layer against a grid of shape `dims`.
    pub fn validate(&self, dims: (usize, usize)) -> Result<()> {
        self.layers()
            .iter()
            .try_for_each(|layer| layer.validate(dims))
    }
}

impl From<InwardsLocalDispersal> for DispersalModel {
    fn from(m: InwardsLocalDispersal) -> Self {
        DispersalModel::InwardsLocal(m)
    }
}

impl From<OutwardsLocalDispersal> for DispersalModel {
    fn from(m: OutwardsLocalDispersal) -> Self {
        DispersalModel::OutwardsLocal(m)
    }
}

impl From<JumpDispersal> for DispersalModel {
    fn from(m: JumpDispersal) -> Self {
        DispersalModel::Jump(m)
    }
}

impl From<HumanDispersal> for DispersalModel {
    fn from(m: HumanDispersal) -> Self {
        DispersalModel::Human(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispersalError;
    use ndarray::Array2;

    #[test]
    fn probability_is_validated() {
        assert!(JumpDispersal::default().with_prob(0.5).is_ok());
        assert!(matches!(
            JumpDispersal::default().with_prob(1.5),
            Err(DispersalError::InvalidProbability(_))
        ));
        assert!(matches!(
            HumanDispersal::default().with_prob(f64::NAN),
            Err(DispersalError::InvalidProbability(_))
        ));
    }

    #[test]
    fn defaults() {
        let jump = JumpDispersal::default();
        assert_eq!(jump.prob(), DEFAULT_JUMP_PROB);
        assert_eq!(jump.spotrange(), DEFAULT_SPOTRANGE);
        assert!(jump.layers().is_empty());
        assert_eq!(HumanDispersal::default().impact_at(), HumanImpactAt::Source);
        let local = InwardsLocalDispersal::new(DispersalNeighborhood::default());
        assert_eq!(local.prob(), 1.0);
        assert_eq!(local.neighborhood().radius(), 3);
    }

    #[test]
    fn partial_models() {
        let hood = DispersalNeighborhood::default();
        assert!(!DispersalModel::from(InwardsLocalDispersal::new(hood.clone())).is_partial());
        assert!(DispersalModel::from(OutwardsLocalDispersal::new(hood)).is_partial());
        assert!(DispersalModel::from(JumpDispersal::default()).is_partial());
        assert!(DispersalModel::from(HumanDispersal::default()).is_partial());
    }

    #[test]
    fn validate_layers_against_grid() {
        let model = DispersalModel::from(
            JumpDispersal::default().with_layers(vec![Layer::suitability(Array2::zeros((4, 5)))]),
        );
        assert!(model.validate((4, 5)).is_ok());
        assert!(model.validate((5, 4)).is_err());
    }
}

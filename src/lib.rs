//! Gridsim-dispersal runs organism dispersal simulations on square grids.
//!
//! A population spreads over a landscape in discrete steps. Each step applies
//! a list of dispersal models: local spread through a distance-weighted kernel
//! (inwards or outwards), long range jumps, and jumps assisted by human
//! presence. Raster [`Layer`]s for habitat suitability and human impact gate
//! and weight every invasion, and may vary through time as a cyclic
//! [`LayerSequence`].
//!
//! ```
//! use gridsim_dispersal::*;
//! use ndarray::Array2;
//!
//! let hood = DispersalNeighborhood::from_decay(|d| (-d).exp(), 2, Overflow::Skip)?;
//! let layers: Layers = vec![Layer::suitability(Array2::from_elem((7, 7), 1.0))].into();
//! let local = InwardsLocalDispersal::new(hood).with_layers(layers.clone());
//! let jump = JumpDispersal::default().with_layers(layers);
//!
//! let sims: Vec<DispersalModel> = vec![local.into(), jump.into()];
//! let mut grid = SquareGrid::<bool>::new_occupied(sims, (7, 7), vec![(4, 2)], 0)?;
//! grid.run(3);
//! assert!(grid.occupied_count() >= 1);
//! # Ok::<(), DispersalError>(())
//! ```

mod config;
mod error;
mod grid;
mod kernel;
mod layer;
mod model;
mod neighborhood;
mod rng;
mod rule;
mod state;

pub use config::*;
pub use error::*;
pub use grid::*;
pub use kernel::*;
pub use layer::*;
pub use model::*;
pub use neighborhood::*;
pub use rng::*;
pub use rule::*;
pub use state::*;

use ndarray::ArrayView2;
use rand::Rng;

/// Defines a simulation that a [`SquareGrid`] can step.
///
/// All new cells are only produced from the old frame. This prevents the
/// update order from breaking the simulation.
pub trait Sim<C: State>: Sync {
    /// Partial sims are only visited at occupied cells and push state into
    /// other cells through [`Sim::egress`]. Full sims are visited at every
    /// cell through [`Sim::compute`].
    fn is_partial(&self) -> bool;

    /// New state of `index`, computed from the frozen frame.
    fn compute<R: Rng + ?Sized>(&self, cells: ArrayView2<'_, C>, index: Index, t: f64, rng: &mut R) -> C;

    /// Every cell that receives a flow out of `index`.
    fn egress<R: Rng + ?Sized>(
        &self,
        cells: ArrayView2<'_, C>,
        index: Index,
        t: f64,
        rng: &mut R,
        flows: &mut Vec<Index>,
    );

    /// Receive one flow into a cell of the next frame.
    #[inline]
    fn ingress(&self, cell: &mut C) {
        *cell = cell.merge(C::occupied());
    }

    /// Check the sim against a grid of shape `dims` before running.
    fn validate(&self, _dims: Index) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "sim"
    }
}

impl<C: State> Sim<C> for DispersalModel {
    #[inline]
    fn is_partial(&self) -> bool {
        DispersalModel::is_partial(self)
    }

    #[inline]
    fn compute<R: Rng + ?Sized>(&self, cells: ArrayView2<'_, C>, index: Index, t: f64, rng: &mut R) -> C {
        rule(self, cells, index, t, rng, &mut Vec::new())
    }

    #[inline]
    fn egress<R: Rng + ?Sized>(
        &self,
        cells: ArrayView2<'_, C>,
        index: Index,
        t: f64,
        rng: &mut R,
        flows: &mut Vec<Index>,
    ) {
        rule(self, cells, index, t, rng, flows);
    }

    fn validate(&self, dims: Index) -> Result<()> {
        DispersalModel::validate(self, dims)
    }

    fn name(&self) -> &str {
        DispersalModel::name(self)
    }
}

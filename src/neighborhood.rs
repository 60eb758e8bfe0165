use crate::{build_kernel, DispersalKernel, Result, State};
use enum_iterator::IntoEnumIterator;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// What happens when a kernel window hangs over the edge of the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, IntoEnumIterator)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// Cells past the edge do not exist.
    Skip,
    /// The grid is a torus.
    Wrap,
}

impl Default for Overflow {
    fn default() -> Self {
        Overflow::Skip
    }
}

impl Overflow {
    /// Offset `coord` by `delta` along an axis of length `extent`.
    #[inline]
    pub fn resolve(self, coord: usize, delta: isize, extent: usize) -> Option<usize> {
        let moved = coord as isize + delta;
        match self {
            Overflow::Skip => (0..extent as isize)
                .contains(&moved)
                .then(|| moved as usize),
            Overflow::Wrap => Some(moved.rem_euclid(extent as isize) as usize),
        }
    }
}

/// A dispersal kernel together with its edge policy.
///
/// Under [`Overflow::Wrap`] a kernel wider than the grid visits some cells
/// more than once, and may land back on the focal cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispersalNeighborhood {
    kernel: DispersalKernel,
    overflow: Overflow,
}

impl DispersalNeighborhood {
    pub fn new(kernel: DispersalKernel, overflow: Overflow) -> Self {
        Self { kernel, overflow }
    }

    /// Build the kernel from a decay function and wrap it.
    pub fn from_decay<F>(f: F, radius: usize, overflow: Overflow) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        Ok(Self::new(build_kernel(f, radius)?, overflow))
    }

    #[inline]
    pub fn kernel(&self) -> &DispersalKernel {
        &self.kernel
    }

    #[inline]
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.kernel.radius()
    }

    /// Every neighbour of `(row, col)` that exists under the overflow policy,
    /// with the kernel weight connecting them.
    pub fn targets(
        &self,
        dims: (usize, usize),
        row: usize,
        col: usize,
    ) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        let overflow = self.overflow;
        self.kernel.offsets().filter_map(move |((dr, dc), w)| {
            let r = overflow.resolve(row, dr, dims.0)?;
            let c = overflow.resolve(col, dc, dims.1)?;
            Some(((r, c), w))
        })
    }

    /// Kernel-weighted sum of the occupancy around `(row, col)`.
    ///
    /// The result is not normalised. The focal cell itself never contributes.
    pub fn pressure<C: State>(&self, cells: ArrayView2<'_, C>, row: usize, col: usize) -> f64 {
        self.targets(cells.dim(), row, col)
            .map(|(ix, w)| cells[ix].occupancy() * w)
            .sum()
    }
}

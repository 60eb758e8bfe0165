use crate::{DispersalError, Result};
use float_ord::FloatOrd;
use itertools::iproduct;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Exponential decay, `exp(-d / scale)`.
#[inline]
pub fn exponential(distance: f64, scale: f64) -> f64 {
    (-distance / scale).exp()
}

/// Gaussian decay, `exp(-d² / 2σ²)`.
#[inline]
pub fn gaussian(distance: f64, sigma: f64) -> f64 {
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

/// A named decay function, for when the kernel comes from configuration
/// instead of a closure.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decay {
    Exponential { scale: f64 },
    Gaussian { sigma: f64 },
}

impl Default for Decay {
    fn default() -> Self {
        Decay::Exponential { scale: 1.0 }
    }
}

impl Decay {
    #[inline]
    pub fn eval(self, distance: f64) -> f64 {
        match self {
            Decay::Exponential { scale } => exponential(distance, scale),
            Decay::Gaussian { sigma } => gaussian(distance, sigma),
        }
    }
}

/// A square matrix of dispersal weights centred on the focal cell.
///
/// The side is always `2 * radius + 1`. The centre weight is stored, but
/// [`DispersalKernel::offsets`] never yields it: a cell does not disperse
/// into itself.
#[derive(Clone, Debug, PartialEq)]
pub struct DispersalKernel {
    radius: usize,
    weights: Array2<f64>,
}

/// Build a kernel by evaluating `f` at the euclidean distance of every offset
/// in the window.
///
/// `f` should map distances to `[0, 1]`. That is not enforced here; the
/// rules clamp the probabilities they derive from the weights.
pub fn build_kernel<F>(f: F, radius: usize) -> Result<DispersalKernel>
where
    F: Fn(f64) -> f64,
{
    if radius == 0 {
        return Err(DispersalError::InvalidRadius(radius));
    }
    Ok(DispersalKernel::fill(f, radius))
}

impl Default for DispersalKernel {
    /// `exponential(d, 1)` over a radius of 3 cells.
    fn default() -> Self {
        Self::fill(|d| exponential(d, 1.0), 3)
    }
}

impl DispersalKernel {
    fn fill<F: Fn(f64) -> f64>(f: F, radius: usize) -> Self {
        let side = 2 * radius + 1;
        let weights = Array2::from_shape_fn((side, side), |(r, c)| {
            let dr = r as f64 - radius as f64;
            let dc = c as f64 - radius as f64;
            f(dr.hypot(dc))
        });
        DispersalKernel { radius, weights }
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Side length of the window.
    #[inline]
    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    /// The raw weight matrix, centre included.
    #[inline]
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weight at a signed offset from the centre. Returns `None` outside the window.
    pub fn weight(&self, dr: isize, dc: isize) -> Option<f64> {
        let r = self.radius as isize;
        if dr.abs() > r || dc.abs() > r {
            return None;
        }
        Some(self.weights[((dr + r) as usize, (dc + r) as usize)])
    }

    /// Every offset except the centre, with its weight.
    pub fn offsets(&self) -> impl Iterator<Item = ((isize, isize), f64)> + '_ {
        let r = self.radius as isize;
        iproduct!(-r..=r, -r..=r)
            .filter(|&delta| delta != (0, 0))
            .map(move |(dr, dc)| {
                (
                    (dr, dc),
                    self.weights[((dr + r) as usize, (dc + r) as usize)],
                )
            })
    }

    /// Sum of every non-centre weight.
    pub fn sum(&self) -> f64 {
        self.offsets().map(|(_, w)| w).sum()
    }

    /// Largest non-centre weight.
    pub fn max_weight(&self) -> f64 {
        self.offsets()
            .map(|(_, w)| FloatOrd(w))
            .max()
            .map_or(0.0, |w| w.0)
    }
}

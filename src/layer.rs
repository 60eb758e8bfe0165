//! Raster layers that modulate dispersal.
//!
//! A layer is either a single raster or a sequence of rasters that is
//! interpolated through time. Every layer has a [`LayerKind`]; lookups such as
//! [`suitability`] only consider layers of their own kind and multiply them
//! together, so unrelated layers can be mixed freely in one collection.

use crate::{DispersalError, Result};
use enum_iterator::IntoEnumIterator;
use float_ord::FloatOrd;
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The role a layer plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, IntoEnumIterator)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Habitat suitability, `0` is uninhabitable.
    Suitability,
    /// Human presence, used to weight vector-assisted spread.
    HumanImpact,
    /// Anything else. Ignored by the built-in rules.
    Generic,
}

/// Layers shared read-only between models.
pub type Layers = Arc<[Layer]>;

/// An immutable raster, or sequence of rasters, tagged with its role.
#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Static { kind: LayerKind, data: Array2<f64> },
    Sequence(LayerSequence),
}

impl Layer {
    pub fn suitability(data: Array2<f64>) -> Self {
        Layer::Static {
            kind: LayerKind::Suitability,
            data,
        }
    }

    pub fn human(data: Array2<f64>) -> Self {
        Layer::Static {
            kind: LayerKind::HumanImpact,
            data,
        }
    }

    pub fn generic(data: Array2<f64>) -> Self {
        Layer::Static {
            kind: LayerKind::Generic,
            data,
        }
    }

    #[inline]
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Static { kind, .. } => *kind,
            Layer::Sequence(sequence) => sequence.kind,
        }
    }

    /// Raster shape as `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Layer::Static { data, .. } => data.dim(),
            Layer::Sequence(sequence) => sequence.dim(),
        }
    }

    /// Check that the raster covers exactly a grid of shape `dims`.
    pub fn validate(&self, dims: (usize, usize)) -> Result<()> {
        let found = self.dim();
        if found == dims {
            Ok(())
        } else {
            Err(DispersalError::ShapeMismatch {
                expected: dims,
                found,
            })
        }
    }

    /// Raw value of one cell.
    ///
    /// `position` picks the entry of a sequence and is ignored by static
    /// layers. Returns `None` outside the raster.
    pub fn get_cell(&self, row: usize, col: usize, position: usize) -> Option<f64> {
        match self {
            Layer::Static { data, .. } => data.get((row, col)).copied(),
            Layer::Sequence(sequence) => sequence
                .entries
                .get(position)
                .and_then(|entry| entry.data.get((row, col)))
                .copied(),
        }
    }

    /// Value of one cell at time `t`, interpolating sequences.
    pub fn value(&self, row: usize, col: usize, t: f64) -> Option<f64> {
        match self {
            Layer::Static { data, .. } => data.get((row, col)).copied(),
            Layer::Sequence(sequence) => sequence_interpolate(sequence, row, col, t),
        }
    }
}

impl From<LayerSequence> for Layer {
    fn from(sequence: LayerSequence) -> Self {
        Layer::Sequence(sequence)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct SequenceEntry {
    start: f64,
    span: f64,
    data: Array2<f64>,
}

/// Rasters that follow each other through time.
///
/// Entry `i` starts where entry `i - 1` ends. The sequence repeats once the
/// last span is over, and the last entry interpolates back into the first.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSequence {
    kind: LayerKind,
    entries: Vec<SequenceEntry>,
    period: f64,
}

impl LayerSequence {
    /// Every raster lasts `timespan`.
    pub fn uniform(kind: LayerKind, timespan: f64, frames: Vec<Array2<f64>>) -> Result<Self> {
        Self::irregular(kind, frames.into_iter().map(|data| (timespan, data)))
    }

    /// Rasters stacked along the first axis, each lasting `timespan`.
    pub fn from_stack(kind: LayerKind, timespan: f64, stack: Array3<f64>) -> Result<Self> {
        let frames = stack.axis_iter(Axis(0)).map(|frame| frame.to_owned()).collect();
        Self::uniform(kind, timespan, frames)
    }

    /// Each raster comes with its own span.
    pub fn irregular<I>(kind: LayerKind, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, Array2<f64>)>,
    {
        let mut period = 0.0;
        let mut built: Vec<SequenceEntry> = Vec::new();
        for (span, data) in entries {
            if !span.is_finite() || span <= 0.0 {
                return Err(DispersalError::InvalidTimespan(span));
            }
            if let Some(first) = built.first() {
                if first.data.dim() != data.dim() {
                    return Err(DispersalError::ShapeMismatch {
                        expected: first.data.dim(),
                        found: data.dim(),
                    });
                }
            }
            built.push(SequenceEntry {
                start: period,
                span,
                data,
            });
            period += span;
        }
        if built.is_empty() {
            return Err(DispersalError::EmptySequence);
        }
        Ok(Self {
            kind,
            entries: built,
            period,
        })
    }

    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Number of rasters.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total length of one cycle through every raster.
    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Time at which each raster is sampled exactly.
    pub fn starts(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|entry| entry.start)
    }

    /// Longest single span in the sequence.
    pub fn longest_span(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| FloatOrd(entry.span))
            .max()
            .map_or(0.0, |span| span.0)
    }

    fn dim(&self) -> (usize, usize) {
        self.entries[0].data.dim()
    }
}

/// Wrap `t` into `[0, period)`.
///
/// Negative times wrap too. A non-finite `t` maps to `0`, and a period that
/// is not finite and positive leaves `t` untouched.
#[inline]
pub fn cyclic(t: f64, period: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    if !(period.is_finite() && period > 0.0) {
        return t;
    }
    let wrapped = t.rem_euclid(period);
    // rem_euclid can round up to exactly `period` for tiny negative `t`.
    if wrapped >= period {
        0.0
    } else {
        wrapped
    }
}

/// Linearly interpolate a cell of a sequence at time `t`.
///
/// At the start time of an entry the result is exactly that entry's value.
/// Returns `None` outside the raster.
pub fn sequence_interpolate(
    sequence: &LayerSequence,
    row: usize,
    col: usize,
    t: f64,
) -> Option<f64> {
    let entries = &sequence.entries;
    if entries.len() == 1 {
        return entries[0].data.get((row, col)).copied();
    }
    let t = cyclic(t, sequence.period);
    // The first start is zero, so the partition point is at least one.
    let ix = entries
        .partition_point(|entry| entry.start <= t)
        .saturating_sub(1);
    let current = &entries[ix];
    let next = &entries[(ix + 1) % entries.len()];
    let frac = (t - current.start) / current.span;
    let a = *current.data.get((row, col))?;
    let b = *next.data.get((row, col))?;
    Some(a * (1.0 - frac) + b * frac)
}

/// Product of every `kind` layer at a cell, each clamped to `[0, 1]`.
///
/// Layers of other kinds, and lookups that fall outside a raster, count as a
/// neutral `1.0`. An empty collection is therefore `1.0`. A NaN raster value
/// is treated as `0.0`.
pub fn scalar(layers: &[Layer], kind: LayerKind, row: usize, col: usize, t: f64) -> f64 {
    layers
        .iter()
        .filter(|layer| layer.kind() == kind)
        .map(|layer| layer.value(row, col, t).map_or(1.0, clamp_unit))
        .product()
}

/// Habitat suitability of a cell at time `t`.
#[inline]
pub fn suitability(layers: &[Layer], row: usize, col: usize, t: f64) -> f64 {
    scalar(layers, LayerKind::Suitability, row, col, t)
}

/// Human impact at a cell at time `t`.
#[inline]
pub fn human_impact(layers: &[Layer], row: usize, col: usize, t: f64) -> f64 {
    scalar(layers, LayerKind::HumanImpact, row, col, t)
}

/// Clamp into `[0, 1]`, sending NaN to zero.
#[inline]
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

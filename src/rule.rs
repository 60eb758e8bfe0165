use crate::layer::clamp_unit;
use crate::{
    human_impact, suitability, DispersalModel, HumanDispersal, HumanImpactAt,
    InwardsLocalDispersal, JumpDispersal, Layer, OutwardsLocalDispersal, State,
};
use boolinator::Boolinator;
use ndarray::ArrayView2;
use rand::Rng;

/// A `(row, col)` grid coordinate.
pub type Index = (usize, usize);

/// Evaluate one model at one cell.
///
/// `source` is the frame as of the start of the step and is never written.
/// Full models return the new state of `index`. Partial models return the
/// current state unchanged and push every cell they invade onto `spread`;
/// the caller merges those into the destination frame.
pub fn rule<C, R>(
    model: &DispersalModel,
    source: ArrayView2<'_, C>,
    index: Index,
    t: f64,
    rng: &mut R,
    spread: &mut Vec<Index>,
) -> C
where
    C: State,
    R: Rng + ?Sized,
{
    match model {
        DispersalModel::InwardsLocal(m) => m.invade(source, index, t, rng),
        DispersalModel::OutwardsLocal(m) => {
            m.spread(source, index, t, rng, spread);
            source[index]
        }
        DispersalModel::Jump(m) => {
            spread.extend(m.jump(source, index, t, rng));
            source[index]
        }
        DispersalModel::Human(m) => {
            spread.extend(m.jump(source, index, t, rng));
            source[index]
        }
    }
}

impl InwardsLocalDispersal {
    /// New state of `index`. Occupied cells stay occupied.
    pub fn invade<C, R>(&self, source: ArrayView2<'_, C>, index: Index, t: f64, rng: &mut R) -> C
    where
        C: State,
        R: Rng + ?Sized,
    {
        let state = source[index];
        if state.is_occupied() {
            return state;
        }
        let (row, col) = index;
        let suit = suitability(&self.layers, row, col, t);
        if suit <= self.suitability_threshold {
            return state;
        }
        let pressure = self.neighborhood.pressure(source, row, col);
        let p = clamp_unit(pressure * suit * self.prob);
        if rng.gen::<f64>() < p {
            C::occupied()
        } else {
            state
        }
    }
}

impl OutwardsLocalDispersal {
    /// Push every neighbour of an occupied `index` that gets invaded.
    ///
    /// Each neighbour is tried with its own draw.
    pub fn spread<C, R>(
        &self,
        source: ArrayView2<'_, C>,
        index: Index,
        t: f64,
        rng: &mut R,
        spread: &mut Vec<Index>,
    ) where
        C: State,
        R: Rng + ?Sized,
    {
        if !source[index].is_occupied() {
            return;
        }
        let (row, col) = index;
        for (target, weight) in self.neighborhood.targets(source.dim(), row, col) {
            if source[target].is_occupied() {
                continue;
            }
            let suit = suitability(&self.layers, target.0, target.1, t);
            if suit <= self.suitability_threshold {
                continue;
            }
            let p = clamp_unit(weight * suit * self.prob);
            if rng.gen::<f64>() < p {
                spread.push(target);
            }
        }
    }
}

/// Pick a cell uniformly from the square window of half-width `spotrange`
/// around `index`, clipped to the grid and excluding `index` itself.
///
/// Returns `None` when the window holds no other cell.
pub fn sample_target<R>(dims: (usize, usize), index: Index, spotrange: usize, rng: &mut R) -> Option<Index>
where
    R: Rng + ?Sized,
{
    let (rows, cols) = dims;
    let (row, col) = index;
    let top = row.saturating_sub(spotrange);
    let left = col.saturating_sub(spotrange);
    let height = row.saturating_add(spotrange).min(rows - 1) - top + 1;
    let width = col.saturating_add(spotrange).min(cols - 1) - left + 1;
    let cells = height * width;
    if cells <= 1 {
        return None;
    }
    let own = (row - top) * width + (col - left);
    let mut pick = rng.gen_range(0..cells - 1);
    if pick >= own {
        pick += 1;
    }
    Some((top + pick / width, left + pick % width))
}

#[allow(clippy::too_many_arguments)]
fn jump_target<C, R>(
    layers: &[Layer],
    threshold: f64,
    source: ArrayView2<'_, C>,
    index: Index,
    spotrange: usize,
    t: f64,
    rng: &mut R,
    prob: impl FnOnce(Index) -> f64,
) -> Option<Index>
where
    C: State,
    R: Rng + ?Sized,
{
    if !source[index].is_occupied() {
        return None;
    }
    let target = sample_target(source.dim(), index, spotrange, rng)?;
    let suitable = suitability(layers, target.0, target.1, t) > threshold;
    (suitable && rng.gen::<f64>() < clamp_unit(prob(target))).as_some(target)
}

impl JumpDispersal {
    /// The cell invaded from an occupied `index` this step, if any.
    pub fn jump<C, R>(&self, source: ArrayView2<'_, C>, index: Index, t: f64, rng: &mut R) -> Option<Index>
    where
        C: State,
        R: Rng + ?Sized,
    {
        jump_target(
            &self.layers,
            self.suitability_threshold,
            source,
            index,
            self.spotrange,
            t,
            rng,
            |_| self.prob,
        )
    }
}

impl HumanDispersal {
    /// Like [`JumpDispersal::jump`], with the acceptance probability scaled by
    /// human impact.
    pub fn jump<C, R>(&self, source: ArrayView2<'_, C>, index: Index, t: f64, rng: &mut R) -> Option<Index>
    where
        C: State,
        R: Rng + ?Sized,
    {
        jump_target(
            &self.layers,
            self.suitability_threshold,
            source,
            index,
            self.spotrange,
            t,
            rng,
            |target| {
                let (row, col) = match self.impact_at {
                    HumanImpactAt::Source => index,
                    HumanImpactAt::Target => target,
                };
                self.prob * human_impact(&self.layers, row, col, t)
            },
        )
    }
}

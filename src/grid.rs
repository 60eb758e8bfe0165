use crate::rng::derive_cell_rng;
use crate::{DispersalError, DispersalModel, Index, Result, Sim, State};
use ndarray::{Array2, ArrayView2, Zip};
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use tracing::{debug, info, trace, Level};

/// Represents the state of the simulation.
///
/// Every step runs each sim in order. A sim reads a frozen copy of the frame
/// left by the previous sim and writes a fresh frame, so the order in which
/// cells are evaluated, or which thread evaluates them, never changes the
/// result.
#[derive(Clone, Debug)]
pub struct SquareGrid<C, S = DispersalModel> {
    sims: Vec<S>,
    cells: Array2<C>,
    seed: u64,
    start_time: f64,
    step: u64,
}

impl<C, S> SquareGrid<C, S>
where
    C: State,
    S: Sim<C>,
{
    /// Make a new grid with the given cells.
    ///
    /// Every sim is validated against the grid shape up front.
    pub fn new(sims: Vec<S>, cells: Array2<C>, seed: u64) -> Result<Self> {
        let (rows, cols) = cells.dim();
        if rows == 0 || cols == 0 {
            return Err(DispersalError::EmptyGrid);
        }
        for sim in &sims {
            sim.validate((rows, cols))?;
        }
        info!(rows, cols, sims = sims.len(), seed, "created dispersal grid");
        Ok(Self {
            sims,
            cells,
            seed,
            start_time: 0.0,
            step: 0,
        })
    }

    /// Make a new grid of empty cells, with `occupied` cells seeded.
    ///
    /// Seeds outside the grid are ignored.
    pub fn new_occupied<I>(sims: Vec<S>, dims: Index, occupied: I, seed: u64) -> Result<Self>
    where
        I: IntoIterator<Item = Index>,
    {
        let mut cells = Array2::from_elem(dims, C::empty());
        for index in occupied {
            if let Some(cell) = cells.get_mut(index) {
                *cell = C::occupied();
            }
        }
        Self::new(sims, cells, seed)
    }

    /// Time value handed to the sims on the first step.
    pub fn with_start_time(mut self, start_time: f64) -> Result<Self> {
        if !start_time.is_finite() {
            return Err(DispersalError::InvalidStartTime(start_time));
        }
        self.start_time = start_time;
        Ok(self)
    }

    /// Run the grid for one step.
    pub fn cycle(&mut self) {
        let t = self.time();
        for (sim_ix, sim) in self.sims.iter().enumerate() {
            let next = if sim.is_partial() {
                partial_update(&self.cells, sim, self.seed, self.step, sim_ix, t)
            } else {
                full_update(&self.cells, sim, self.seed, self.step, sim_ix, t)
            };
            if tracing::enabled!(Level::DEBUG) {
                let invaded = Zip::from(&self.cells)
                    .and(&next)
                    .fold(0usize, |acc, &before, &after| {
                        acc + (!before.is_occupied() && after.is_occupied()) as usize
                    });
                debug!(step = self.step, t, sim = sim.name(), invaded, "dispersal step");
            }
            self.cells = next;
        }
        self.step += 1;
    }

    /// Run the grid for `steps` steps.
    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.cycle();
        }
    }

    /// Run the grid for `steps` steps, keeping a copy of the frame after each.
    pub fn run_recorded(&mut self, steps: usize) -> Vec<Array2<C>> {
        (0..steps)
            .map(|_| {
                self.cycle();
                self.cells.clone()
            })
            .collect()
    }

    /// Time value of the next step.
    #[inline]
    pub fn time(&self) -> f64 {
        self.start_time + self.step as f64
    }

    /// Number of steps taken so far.
    #[inline]
    pub fn steps_taken(&self) -> u64 {
        self.step
    }

    /// Get the grid's cells.
    #[inline]
    pub fn cells(&self) -> ArrayView2<'_, C> {
        self.cells.view()
    }

    #[inline]
    pub fn into_cells(self) -> Array2<C> {
        self.cells
    }

    /// Get a cell, or `None` when out of bounds.
    #[inline]
    pub fn get_cell(&self, index: Index) -> Option<&C> {
        self.cells.get(index)
    }

    #[inline]
    pub fn sims(&self) -> &[S] {
        &self.sims
    }

    /// Get the grid's `(rows, cols)`.
    #[inline]
    pub fn dim(&self) -> Index {
        self.cells.dim()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }
}

fn full_update<C, S>(cells: &Array2<C>, sim: &S, seed: u64, step: u64, sim_ix: usize, t: f64) -> Array2<C>
where
    C: State,
    S: Sim<C>,
{
    let cols = cells.ncols();
    let view = cells.view();
    Zip::indexed(cells).par_map_collect(|index, _| {
        let mut rng = derive_cell_rng(seed, step, sim_ix, index.0 * cols + index.1);
        sim.compute(view, index, t, &mut rng)
    })
}

fn partial_update<C, S>(cells: &Array2<C>, sim: &S, seed: u64, step: u64, sim_ix: usize, t: f64) -> Array2<C>
where
    C: State,
    S: Sim<C>,
{
    let cols = cells.ncols();
    let view = cells.view();
    let sources: Vec<Index> = cells
        .indexed_iter()
        .filter(|(_, c)| c.is_occupied())
        .map(|(index, _)| index)
        .collect();
    let source_count = sources.len();
    let flows: Vec<Index> = sources
        .into_par_iter()
        .flat_map_iter(|index| {
            let mut rng = derive_cell_rng(seed, step, sim_ix, index.0 * cols + index.1);
            let mut flows = Vec::new();
            sim.egress(view, index, t, &mut rng, &mut flows);
            flows
        })
        .collect();
    trace!(sim = sim.name(), sources = source_count, flows = flows.len(), "partial update");

    let mut next = cells.clone();
    for index in flows {
        sim.ingress(&mut next[index]);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        exponential, DispersalNeighborhood, InwardsLocalDispersal, JumpDispersal, Layer,
        OutwardsLocalDispersal, Overflow,
    };

    fn no_sims() -> Vec<DispersalModel> {
        Vec::new()
    }

    fn local_hood() -> DispersalNeighborhood {
        DispersalNeighborhood::from_decay(|d| exponential(d, 1.0), 1, Overflow::Skip).unwrap()
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = SquareGrid::<bool>::new(no_sims(), Array2::from_elem((0, 3), false), 0);
        assert!(matches!(grid, Err(DispersalError::EmptyGrid)));
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let model = DispersalModel::from(
            JumpDispersal::default().with_layers(vec![Layer::suitability(Array2::zeros((2, 2)))]),
        );
        let grid = SquareGrid::<bool>::new_occupied(vec![model], (3, 3), vec![(1, 1)], 0);
        assert!(matches!(grid, Err(DispersalError::ShapeMismatch { .. })));
    }

    #[test]
    fn non_finite_start_time_is_rejected() {
        for &start in &[f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let grid = SquareGrid::<bool>::new_occupied(no_sims(), (2, 2), vec![(0, 0)], 0)
                .unwrap()
                .with_start_time(start);
            assert!(matches!(grid, Err(DispersalError::InvalidStartTime(_))));
        }
    }

    #[test]
    fn time_advances_from_start() {
        let mut grid = SquareGrid::<bool>::new_occupied(no_sims(), (2, 2), vec![(0, 0)], 0)
            .unwrap()
            .with_start_time(10.0)
            .unwrap();
        assert_eq!(grid.time(), 10.0);
        grid.run(3);
        assert_eq!(grid.time(), 13.0);
        assert_eq!(grid.steps_taken(), 3);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn seeds_outside_grid_are_ignored() {
        let grid =
            SquareGrid::<u8>::new_occupied(no_sims(), (2, 2), vec![(0, 1), (5, 5)], 0).unwrap();
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.get_cell((0, 1)), Some(&1));
        assert_eq!(grid.get_cell((5, 5)), None);
    }

    #[test]
    fn same_seed_same_result() {
        let sims = || {
            vec![
                DispersalModel::from(InwardsLocalDispersal::new(local_hood())),
                DispersalModel::from(
                    JumpDispersal::default()
                        .with_prob(0.5)
                        .unwrap()
                        .with_spotrange(4),
                ),
            ]
        };
        let mut a = SquareGrid::<bool>::new_occupied(sims(), (16, 16), vec![(8, 8)], 42).unwrap();
        let mut b = SquareGrid::<bool>::new_occupied(sims(), (16, 16), vec![(8, 8)], 42).unwrap();
        assert_eq!(a.run_recorded(5), b.run_recorded(5));
    }

    #[test]
    fn occupation_is_monotonic() {
        let sims = vec![
            DispersalModel::from(InwardsLocalDispersal::new(local_hood())),
            DispersalModel::from(OutwardsLocalDispersal::new(local_hood())),
        ];
        let mut grid = SquareGrid::<bool>::new_occupied(sims, (9, 9), vec![(4, 4)], 7).unwrap();
        let frames = grid.run_recorded(6);
        for pair in frames.windows(2) {
            Zip::from(&pair[0])
                .and(&pair[1])
                .for_each(|&before, &after| assert!(!before || after));
        }
    }

    #[test]
    fn outwards_saturating_kernel_fills_neighbourhood() {
        let hood = DispersalNeighborhood::from_decay(|_| 1.0, 1, Overflow::Skip).unwrap();
        let sims = vec![DispersalModel::from(OutwardsLocalDispersal::new(hood))];
        let mut grid = SquareGrid::<bool>::new_occupied(sims, (5, 5), vec![(2, 2)], 0).unwrap();
        grid.cycle();
        let expected = Array2::from_shape_fn((5, 5), |(r, c)| {
            (1..=3).contains(&r) && (1..=3).contains(&c)
        });
        assert_eq!(grid.cells(), expected);
    }
}

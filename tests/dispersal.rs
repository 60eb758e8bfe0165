use gridsim_dispersal::*;
use ndarray::{arr2, Array2, Zip};

fn seeded_grid(sims: Vec<DispersalModel>, dims: Index, seed_cell: Index, seed: u64) -> SquareGrid<bool> {
    SquareGrid::new_occupied(sims, dims, vec![seed_cell], seed).unwrap()
}

fn exp_hood(radius: usize, overflow: Overflow) -> DispersalNeighborhood {
    DispersalNeighborhood::from_decay(|d| (-d).exp(), radius, overflow).unwrap()
}

#[test]
fn no_invasion_of_unsuitable_cells() {
    // Seed at (5, 3) counting from one.
    let seed_cell = (4, 2);
    let suit = Array2::from_shape_fn((7, 7), |(r, c)| {
        if r.abs_diff(seed_cell.0) <= 1 && c.abs_diff(seed_cell.1) <= 1 {
            1.0
        } else {
            0.0
        }
    });
    let layers: Layers = vec![Layer::suitability(suit.clone())].into();
    for seed in 0..20 {
        let local = InwardsLocalDispersal::new(exp_hood(2, Overflow::Skip)).with_layers(layers.clone());
        let mut grid = seeded_grid(vec![local.into()], (7, 7), seed_cell, seed);
        for frame in grid.run_recorded(3) {
            Zip::from(&frame)
                .and(&suit)
                .for_each(|&occupied, &s| assert!(!occupied || s > 0.0));
        }
    }
}

#[test]
fn documented_example_respects_suitability() {
    let suit = arr2(&[
        [0.5, 0.0, 0.3, 0.0, 0.0, 0.3, 0.0],
        [0.0, 0.2, 0.8, 0.0, 0.9, 0.6, 0.0],
        [0.0, 0.5, 1.0, 1.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 1.0, 0.7, 0.0, 0.0],
        [0.0, 0.0, 0.6, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.1, 0.6, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7],
    ]);
    let layers: Layers = vec![Layer::suitability(suit.clone())].into();
    let local = InwardsLocalDispersal::new(exp_hood(2, Overflow::Skip)).with_layers(layers.clone());
    let jump = JumpDispersal::default().with_layers(layers);
    let mut grid = seeded_grid(vec![local.into(), jump.into()], (7, 7), (4, 2), 3);
    let frames = grid.run_recorded(3);
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert!(frame[(4, 2)]);
        Zip::from(frame)
            .and(&suit)
            .for_each(|&occupied, &s| assert!(!occupied || s > 0.0));
    }
}

fn jump_success_rate(model: DispersalModel, trials: u64) -> f64 {
    let successes = (0..trials)
        .filter(|&seed| {
            let mut grid = seeded_grid(vec![model.clone()], (5, 5), (2, 2), seed);
            grid.cycle();
            grid.occupied_count() == 2
        })
        .count();
    successes as f64 / trials as f64
}

fn suitable_everywhere() -> Layers {
    vec![Layer::suitability(Array2::from_elem((5, 5), 1.0))].into()
}

#[test]
fn jump_with_certain_probability_always_lands() {
    let model = JumpDispersal::default()
        .with_prob(1.0)
        .unwrap()
        .with_spotrange(100)
        .with_layers(suitable_everywhere());
    assert_eq!(jump_success_rate(model.into(), 200), 1.0);
}

#[test]
fn jump_lands_at_configured_rate() {
    let model = JumpDispersal::default()
        .with_prob(0.3)
        .unwrap()
        .with_spotrange(100)
        .with_layers(suitable_everywhere());
    let rate = jump_success_rate(model.into(), 2000);
    assert!((rate - 0.3).abs() < 0.05, "rate {}", rate);
}

#[test]
fn human_dispersal_lands_at_configured_rate() {
    let model = HumanDispersal::default()
        .with_prob(1.0)
        .unwrap()
        .with_spotrange(100)
        .with_layers(suitable_everywhere());
    assert_eq!(jump_success_rate(model.into(), 200), 1.0);

    let mut layers = suitable_everywhere().to_vec();
    layers.push(Layer::human(Array2::from_elem((5, 5), 0.5)));
    let model = HumanDispersal::default()
        .with_prob(0.8)
        .unwrap()
        .with_spotrange(100)
        .with_layers(layers);
    let rate = jump_success_rate(model.into(), 2000);
    assert!((rate - 0.4).abs() < 0.05, "rate {}", rate);
}

#[test]
fn outwards_wraps_across_edges() {
    let hood = DispersalNeighborhood::from_decay(|_| 1.0, 1, Overflow::Wrap).unwrap();
    let mut grid = seeded_grid(vec![OutwardsLocalDispersal::new(hood).into()], (4, 4), (0, 0), 0);
    grid.cycle();
    for &ix in &[(3, 3), (3, 0), (0, 3), (1, 1), (3, 1), (1, 3)] {
        assert!(grid.cells()[ix], "{:?} not invaded", ix);
    }
    assert_eq!(grid.occupied_count(), 9);
}

#[test]
fn inwards_and_outwards_saturate_alike() {
    let saturating = || DispersalNeighborhood::from_decay(|_| 1.0, 1, Overflow::Skip).unwrap();
    let mut inwards = seeded_grid(vec![InwardsLocalDispersal::new(saturating()).into()], (6, 6), (2, 3), 1);
    let mut outwards = seeded_grid(vec![OutwardsLocalDispersal::new(saturating()).into()], (6, 6), (2, 3), 2);
    assert_eq!(inwards.run_recorded(2), outwards.run_recorded(2));
}

#[test]
fn suitability_sequence_gates_spread_through_time() {
    let closed = Array2::zeros((5, 5));
    let open = Array2::from_elem((5, 5), 1.0);
    let sequence = LayerSequence::uniform(LayerKind::Suitability, 1.0, vec![closed, open]).unwrap();
    let hood = DispersalNeighborhood::from_decay(|_| 1.0, 1, Overflow::Skip).unwrap();
    let local = InwardsLocalDispersal::new(hood).with_layers(vec![Layer::from(sequence)]);
    let mut grid = seeded_grid(vec![local.into()], (5, 5), (2, 2), 0);

    let counts: Vec<_> = grid
        .run_recorded(4)
        .iter()
        .map(|frame| frame.iter().filter(|&&c| c).count())
        .collect();
    // t = 0 closed, t = 1 open, t = 2 closed again, t = 3 open.
    assert_eq!(counts, vec![1, 9, 9, 25]);
}

#[test]
fn infinite_start_time_fails_at_setup() {
    let closed = Array2::zeros((5, 5));
    let open = Array2::from_elem((5, 5), 1.0);
    let sequence = LayerSequence::uniform(LayerKind::Suitability, 1.0, vec![closed, open]).unwrap();
    let local = InwardsLocalDispersal::new(exp_hood(1, Overflow::Skip)).with_layers(vec![Layer::from(sequence)]);
    let grid = seeded_grid(vec![local.into()], (5, 5), (2, 2), 0).with_start_time(f64::INFINITY);
    assert!(matches!(grid, Err(DispersalError::InvalidStartTime(_))));
}

#[test]
fn numeric_states_disperse_too() {
    let hood = DispersalNeighborhood::from_decay(|_| 1.0, 1, Overflow::Skip).unwrap();
    let sims: Vec<DispersalModel> = vec![OutwardsLocalDispersal::new(hood).into()];
    let mut grid = SquareGrid::<f32>::new_occupied(sims, (3, 3), vec![(1, 1)], 0).unwrap();
    grid.cycle();
    assert!(grid.cells().iter().all(|&c| c == 1.0));
}

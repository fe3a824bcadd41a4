use gencam_stereo::{CostVolume, SemiGlobalOptimizer};
use ndarray::{s, Array3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const PENALTIES: [(u32, u32); 5] = [(0, 0), (1, 2), (5, 32), (40, 40), (100, 1000)];

#[test]
fn global_minimum_ignores_the_penalties() {
    let mut rng = Pcg64::from_seed([3; 32]);
    let cheapest = 6;
    let mut errors = Array3::from_shape_fn((9, 12, 16), |_| rng.gen_range(1..=255u8));
    errors.slice_mut(s![.., .., cheapest]).fill(0);
    let volume = CostVolume::from_errors(errors);
    for (step, jump) in PENALTIES {
        let disparity = SemiGlobalOptimizer::new(step, jump).optimize(&volume);
        assert!(
            disparity.iter().all(|&d| d == cheapest as u8),
            "penalties {} and {} gave {:?}",
            step,
            jump,
            disparity
        );
    }
}

#[test]
fn jump_smooths_an_isolated_cell() {
    let mut errors = Array3::from_elem((5, 5, 8), 50u8);
    errors.slice_mut(s![.., .., 5]).fill(0);
    // The center cell matches equally well at disparity zero.
    errors[(2, 2, 0)] = 0;
    let volume = CostVolume::from_errors(errors);

    let free = SemiGlobalOptimizer::new(0, 0).optimize(&volume);
    assert_eq!(free[(2, 2)], 0);
    let smooth = SemiGlobalOptimizer::new(100, 100).optimize(&volume);
    assert_eq!(smooth[(2, 2)], 5);
    for disparity in [&free, &smooth] {
        let others = disparity
            .indexed_iter()
            .filter(|&(cell, _)| cell != (2, 2))
            .all(|(_, &d)| d == 5);
        assert!(others);
    }
}

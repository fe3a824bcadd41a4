//! Semi-global aggregation of the cost volume.
//!
//! The matching errors are aggregated along four 1-D paths (left to right, right to left,
//! top to bottom and bottom to top). Along a path, changing the disparity by one between
//! neighbor cells costs `step` and any larger change costs `jump`. The aggregates of the four
//! paths each include the error of the cell, and the final score counts the error once.

use crate::CostVolume;
use log::*;
use ndarray::{
    s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, ArrayViewMut2, Axis, Zip,
};

/// The four aggregation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::LeftToRight,
        Direction::RightToLeft,
        Direction::TopToBottom,
        Direction::BottomToTop,
    ];

    /// The axis that indexes the independent paths of this direction.
    fn lines_axis(self) -> Axis {
        match self {
            Direction::LeftToRight | Direction::RightToLeft => Axis(0),
            Direction::TopToBottom | Direction::BottomToTop => Axis(1),
        }
    }

    fn reversed(self) -> bool {
        matches!(self, Direction::RightToLeft | Direction::BottomToTop)
    }
}

/// One step of the dynamic programming.
///
/// `previous` holds the aggregate of the previous cell along the path, `errors` the matching
/// errors of the current cell and `out` receives its aggregate. The minimum of `previous` is
/// subtracted to keep the aggregates bounded by `255 + jump`.
pub fn dynamic_step(
    previous: ArrayView1<i32>,
    errors: ArrayView1<u8>,
    mut out: ArrayViewMut1<i32>,
    step: i32,
    jump: i32,
) {
    let n = previous.len();
    let min_previous = previous.iter().copied().min().unwrap_or(0);
    for d in 0..n {
        let mut best = previous[d].min(min_previous + jump);
        if d > 0 {
            best = best.min(previous[d - 1] + step);
        }
        if d + 1 < n {
            best = best.min(previous[d + 1] + step);
        }
        out[d] = i32::from(errors[d]) + best - min_previous;
    }
}

/// Semi-global optimizer with the smoothness penalties of the stereo settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemiGlobalOptimizer {
    pub step: i32,
    pub jump: i32,
}

impl SemiGlobalOptimizer {
    pub fn new(step: u32, jump: u32) -> Self {
        Self {
            step: step as i32,
            jump: jump as i32,
        }
    }

    /// Aggregates one path through a line of cells, `errors` being `[cells, disparities]`.
    /// The first cell of the path takes its raw errors.
    fn aggregate_line(&self, errors: ArrayView2<u8>, out: ArrayViewMut2<i32>, reverse: bool) {
        let (errors, mut out) = if reverse {
            (errors.slice_move(s![..;-1, ..]), out.slice_move(s![..;-1, ..]))
        } else {
            (errors, out)
        };
        if errors.is_empty() {
            return;
        }
        out.row_mut(0).assign(&errors.row(0).mapv(i32::from));
        for i in 1..errors.nrows() {
            let (done, mut rest) = out.view_mut().split_at(Axis(0), i);
            dynamic_step(
                done.row(i - 1),
                errors.row(i),
                rest.row_mut(0),
                self.step,
                self.jump,
            );
        }
    }

    /// Aggregates the errors along one direction into a tableau of the same shape.
    pub fn aggregate(&self, errors: ArrayView3<u8>, direction: Direction) -> Array3<i32> {
        trace!("Aggregating {:?}.", direction);
        let mut tableau = Array3::zeros(errors.dim());
        let axis = direction.lines_axis();
        let reverse = direction.reversed();
        let zip = Zip::from(errors.axis_iter(axis)).and(tableau.axis_iter_mut(axis));
        #[cfg(not(feature = "rayon"))]
        zip.for_each(|errors, out| self.aggregate_line(errors, out, reverse));
        #[cfg(feature = "rayon")]
        zip.par_for_each(|errors, out| self.aggregate_line(errors, out, reverse));
        tableau
    }

    /// Runs the four aggregations and selects the disparity of every cell.
    ///
    /// The score of a disparity is the sum of the four aggregates with its error counted once,
    /// that is minus three times the error.
    /// The lowest score wins, ties going to the lowest disparity. Cells without reachable
    /// disparity get `disparity_max`.
    ///
    /// ```
    /// use gencam_stereo::{CostVolume, SemiGlobalOptimizer};
    /// use ndarray::Array3;
    /// let mut errors = Array3::from_elem((3, 4, 6), 40u8);
    /// errors.slice_mut(ndarray::s![.., .., 2]).fill(0);
    /// let disparity = SemiGlobalOptimizer::new(5, 32).optimize(&CostVolume::from_errors(errors));
    /// assert!(disparity.iter().all(|&d| d == 2));
    /// ```
    pub fn optimize(&self, volume: &CostVolume) -> Array2<u8> {
        let errors = volume.errors.view();
        #[cfg(not(feature = "rayon"))]
        let tableaus = Direction::ALL.map(|direction| self.aggregate(errors, direction));
        #[cfg(feature = "rayon")]
        let tableaus = {
            let ((a, b), (c, d)) = rayon::join(
                || {
                    rayon::join(
                        || self.aggregate(errors, Direction::LeftToRight),
                        || self.aggregate(errors, Direction::RightToLeft),
                    )
                },
                || {
                    rayon::join(
                        || self.aggregate(errors, Direction::TopToBottom),
                        || self.aggregate(errors, Direction::BottomToTop),
                    )
                },
            );
            [a, b, c, d]
        };
        select(volume, &tableaus)
    }
}

/// Picks the disparity of least score in every cell.
fn select(volume: &CostVolume, tableaus: &[Array3<i32>; 4]) -> Array2<u8> {
    let sentinel = volume.disparity_max() as u8;
    let (rows, columns, _) = volume.errors.dim();
    let mut disparity = Array2::from_elem((rows, columns), sentinel);
    let pick = |(v, u): (usize, usize), d: &mut u8, &reachable: &u16| {
        if reachable == 0 {
            return;
        }
        let errors = volume.errors.slice(s![v, u, ..]);
        let mut best = i32::MAX;
        for (i, &error) in errors.iter().enumerate() {
            let score = tableaus.iter().map(|t| t[(v, u, i)]).sum::<i32>() - 3 * i32::from(error);
            if score < best {
                best = score;
                *d = i as u8;
            }
        }
    };
    #[cfg(not(feature = "rayon"))]
    Zip::indexed(&mut disparity)
        .and(&volume.reachable)
        .for_each(pick);
    #[cfg(feature = "rayon")]
    Zip::indexed(&mut disparity)
        .and(&volume.reachable)
        .par_for_each(pick);
    debug!(
        "{} of {} cells are invalid",
        disparity.iter().filter(|&&d| d == sentinel).count(),
        disparity.len()
    );
    disparity
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    #[test]
    fn step_penalties() {
        let previous = arr1(&[10, 0, 10, 10, 50]);
        let errors = arr1(&[1u8, 1, 1, 1, 1]);
        let mut out = Array1::zeros(5);
        dynamic_step(previous.view(), errors.view(), out.view_mut(), 3, 7);
        // Neighbors of the minimum pay the step, the others the jump.
        assert_eq!(out, arr1(&[4, 1, 4, 8, 8]));
    }

    #[test]
    fn first_cell_takes_raw_errors() {
        let mut errors = Array3::from_elem((1, 3, 2), 9u8);
        errors[(0, 2, 1)] = 4;
        let optimizer = SemiGlobalOptimizer::new(1, 2);
        let right_to_left = optimizer.aggregate(errors.view(), Direction::RightToLeft);
        assert_eq!(right_to_left[(0, 2, 0)], 9);
        assert_eq!(right_to_left[(0, 2, 1)], 4);
        let left_to_right = optimizer.aggregate(errors.view(), Direction::LeftToRight);
        assert_eq!(left_to_right[(0, 0, 1)], 9);
        // The cheap disparity at the end is reached from the previous cell for free.
        assert_eq!(left_to_right[(0, 2, 1)], 4);
    }

    #[test]
    fn lone_cell_counts_its_error_once() {
        // Every path of a single cell is its raw errors, so the score is the error itself.
        let errors = Array3::from_shape_vec((1, 1, 4), vec![30u8, 10, 20, 10]).unwrap();
        let volume = CostVolume::from_errors(errors);
        let optimizer = SemiGlobalOptimizer::new(5, 32);
        let tableaus =
            Direction::ALL.map(|direction| optimizer.aggregate(volume.errors.view(), direction));
        for (d, &error) in volume.errors.iter().enumerate() {
            let score = tableaus.iter().map(|t| t[(0, 0, d)]).sum::<i32>() - 3 * i32::from(error);
            assert_eq!(score, i32::from(error));
        }
        assert_eq!(optimizer.optimize(&volume)[(0, 0)], 1);
    }

    #[test]
    fn unreachable_cells_get_the_sentinel() {
        let mut volume = CostVolume::from_errors(Array3::from_elem((2, 2, 5), 10u8));
        volume.reachable[(1, 0)] = 0;
        let disparity = SemiGlobalOptimizer::new(5, 32).optimize(&volume);
        assert_eq!(disparity[(1, 0)], 5);
        assert_eq!(disparity[(0, 0)], 0);
    }
}

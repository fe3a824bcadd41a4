use crate::{CurveRasterizer, EpipolarCurve, Result, StereoError, StereoGrid};
use image::GrayImage;
use log::*;
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut1, Axis, Zip};

/// The error of unreachable disparities.
pub const MAX_ERROR: u8 = u8::MAX;

/// Matching errors of every disparity of every cell of the block grid.
///
/// `errors` has the shape `[rows, columns, disparity_max]`. `reachable` counts, for every cell,
/// the disparities whose block was actually compared. A cell without reachable disparities
/// is invalid and keeps [`MAX_ERROR`] everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostVolume {
    pub errors: Array3<u8>,
    pub reachable: Array2<u16>,
}

impl CostVolume {
    /// A volume of the given shape where nothing is reachable.
    pub fn new((rows, columns): (usize, usize), disparity_max: usize) -> Self {
        Self {
            errors: Array3::from_elem((rows, columns, disparity_max), MAX_ERROR),
            reachable: Array2::zeros((rows, columns)),
        }
    }

    /// Wraps precomputed errors, every disparity being reachable.
    ///
    /// This is how an external matching cost is fed to the optimizer.
    pub fn from_errors(errors: Array3<u8>) -> Self {
        let (rows, columns, disparities) = errors.dim();
        Self {
            reachable: Array2::from_elem((rows, columns), disparities as u16),
            errors,
        }
    }

    pub fn disparity_max(&self) -> usize {
        self.errors.len_of(Axis(2))
    }

    /// Fills the volume by block matching `image1` against `image2` along the epipolar curves.
    ///
    /// For every cell the block around the anchor pixel of `image1` is compared with the block
    /// around every pixel of the rasterized curve in `image2`, starting at the infinity
    /// projection. The walk stops at the epipole, when the block leaves `image2`, or after
    /// `disparity_max` pixels.
    pub fn compute(
        &mut self,
        grid: &StereoGrid,
        curves: ArrayView2<Option<EpipolarCurve>>,
        epipole: Option<(i32, i32)>,
        image1: &GrayImage,
        image2: &GrayImage,
    ) -> Result<()> {
        let expected = (grid.image_width as u32, grid.image_height as u32);
        for image in [image1, image2] {
            if image.dimensions() != expected {
                return Err(StereoError::ImageDimensions {
                    expected,
                    found: image.dimensions(),
                });
            }
        }
        trace!("Computing the cost volume.");

        let half = grid.half_block as i32;
        let disparity_max = self.disparity_max();
        let match_cell = |(v, u): (usize, usize),
                          mut errors: ArrayViewMut1<u8>,
                          reachable: &mut u16,
                          curve: &Option<EpipolarCurve>| {
            errors.fill(MAX_ERROR);
            *reachable = 0;
            let curve = match curve {
                Some(curve) => curve,
                None => return,
            };
            let (u1, v1) = grid.anchor((v, u));
            let pixels = candidates(grid, curve).take(disparity_max);
            for (error, pixel) in errors.iter_mut().zip(pixels) {
                *error = block_error(
                    image1,
                    (u1 - half, v1 - half),
                    image2,
                    (pixel.0 - half, pixel.1 - half),
                    grid.block_size,
                );
                *reachable += 1;
                if Some(pixel) == epipole {
                    break;
                }
            }
        };

        let zip = Zip::indexed(self.errors.lanes_mut(Axis(2)))
            .and(&mut self.reachable)
            .and(curves);
        #[cfg(not(feature = "rayon"))]
        zip.for_each(match_cell);
        #[cfg(feature = "rayon")]
        zip.par_for_each(match_cell);

        debug!(
            "{} of {} cells have no reachable disparity",
            self.reachable.iter().filter(|&&r| r == 0).count(),
            self.reachable.len()
        );
        trace!("Cost volume finished.");
        Ok(())
    }
}

/// The pixels of `image2` compared with a cell, in order of disparity.
///
/// The walk ends where the block around the pixel would leave the image.
pub fn candidates(grid: &StereoGrid, curve: &EpipolarCurve) -> CurveRasterizer {
    let block = grid.block_size as i32;
    let half = grid.half_block as i32;
    let (width, height) = (grid.image_width as i32, grid.image_height as i32);
    curve
        .rasterizer()
        .bounds(half, half, width - block + half, height - block + half)
}

/// Sum of absolute differences between two square blocks given by their top left corners,
/// saturated to [`MAX_ERROR`].
///
/// Both blocks must lie inside their images.
pub fn block_error(
    image1: &GrayImage,
    (u1, v1): (i32, i32),
    image2: &GrayImage,
    (u2, v2): (i32, i32),
    block_size: usize,
) -> u8 {
    let stride1 = image1.width() as usize;
    let stride2 = image2.width() as usize;
    let (raw1, raw2) = (image1.as_raw(), image2.as_raw());
    let mut sum = 0u32;
    for row in 0..block_size {
        let start1 = (v1 as usize + row) * stride1 + u1 as usize;
        let start2 = (v2 as usize + row) * stride2 + u2 as usize;
        sum += raw1[start1..start1 + block_size]
            .iter()
            .zip(&raw2[start2..start2 + block_size])
            .map(|(&a, &b)| u32::from(a.abs_diff(b)))
            .sum::<u32>();
    }
    sum.min(u32::from(MAX_ERROR)) as u8
}

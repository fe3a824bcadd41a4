use crate::StereoGrid;
use image::GrayImage;
use log::*;
use ndarray::ArrayView2;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Offsets `(row, column)` of the cells a pixel may take its disparity from, own cell first.
const CANDIDATES: [(isize, isize); 5] = [(0, 0), (0, -1), (0, 1), (-1, 0), (1, 0)];

/// Brings the disparity of the block grid back to the resolution of `image1`.
///
/// A pixel of a valid cell takes the disparity of the valid cell, among its own cell and the
/// four neighbor cells, whose anchor pixel has the intensity closest to its own intensity in
/// `image1`. This keeps disparity discontinuities on intensity edges. Ties go to the own cell,
/// then to the left, right, top and bottom cells. Pixels off the grid and pixels of invalid
/// cells get `disparity_max`.
pub fn upsample_disparity(
    grid: &StereoGrid,
    image1: &GrayImage,
    small: ArrayView2<u8>,
) -> GrayImage {
    trace!("Upsampling the disparity.");
    let sentinel = grid.sentinel();
    let width = image1.width() as usize;
    let mut disparity = GrayImage::from_pixel(
        image1.width(),
        image1.height(),
        image::Luma([sentinel]),
    );
    let intensity = |u: usize, v: usize| i32::from(image1.as_raw()[v * width + u]);

    let process_row = |(v, row): (usize, &mut [u8])| {
        if !grid.covers(grid.u0, v) {
            return;
        }
        let cell_v = grid.v_small(v);
        for (u, out) in row.iter_mut().enumerate() {
            if !grid.covers(u, v) {
                continue;
            }
            let cell_u = grid.u_small(u);
            if small[(cell_v, cell_u)] == sentinel {
                continue;
            }
            let value = intensity(u, v);
            let mut best = None;
            for (dv, du) in CANDIDATES {
                let (cv, cu) = (cell_v as isize + dv, cell_u as isize + du);
                if cv < 0 || cu < 0 {
                    continue;
                }
                let (cv, cu) = (cv as usize, cu as usize);
                let d = match small.get((cv, cu)) {
                    Some(&d) if d != sentinel => d,
                    _ => continue,
                };
                let difference = (intensity(grid.u_big(cu), grid.v_big(cv)) - value).abs();
                if best.map_or(true, |(b, _)| difference < b) {
                    best = Some((difference, d));
                }
            }
            if let Some((_, d)) = best {
                *out = d;
            }
        }
    };
    #[cfg(not(feature = "rayon"))]
    disparity
        .chunks_mut(width)
        .enumerate()
        .for_each(process_row);
    #[cfg(feature = "rayon")]
    disparity
        .par_chunks_mut(width)
        .enumerate()
        .for_each(process_row);
    disparity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StereoSettings;
    use image::Luma;
    use ndarray::Array2;

    fn grid() -> StereoGrid {
        StereoSettings::new(40, 12)
            .disparity_max(10)
            .block_size(3)
            .roi(9, 6)
            .grid()
            .unwrap()
    }

    #[test]
    fn uniform_disparity_fills_the_grid() {
        let grid = grid();
        let image = GrayImage::from_pixel(40, 12, Luma([128]));
        let small = Array2::from_elem(grid.shape(), 4u8);
        let disparity = upsample_disparity(&grid, &image, small.view());
        assert_eq!(disparity.dimensions(), (40, 12));
        for (u, v, d) in disparity.enumerate_pixels() {
            let expected = if grid.covers(u as usize, v as usize) { 4 } else { 10 };
            assert_eq!(d.0[0], expected, "pixel ({}, {})", u, v);
        }
    }

    #[test]
    fn follows_intensity_edges() {
        let grid = grid();
        // Bright from the second column of the second cell onwards.
        let edge = grid.u0 + grid.block_size + 1;
        let image = GrayImage::from_fn(40, 12, |u, _| {
            Luma([if u as usize >= edge { 200 } else { 20 }])
        });
        let mut small = Array2::from_elem(grid.shape(), 2u8);
        small.column_mut(1).fill(7);
        small.column_mut(2).fill(7);
        let disparity = upsample_disparity(&grid, &image, small.view());
        let v = grid.v_big(1) as u32;
        // The dark first column of the second cell borrows from the dark cell on its left.
        assert_eq!(disparity.get_pixel(edge as u32 - 1, v).0[0], 2);
        assert_eq!(disparity.get_pixel(edge as u32, v).0[0], 7);
    }

    #[test]
    fn invalid_cells_stay_invalid() {
        let grid = grid();
        let image = GrayImage::from_pixel(40, 12, Luma([50]));
        let mut small = Array2::from_elem(grid.shape(), 4u8);
        small[(1, 1)] = 10;
        let disparity = upsample_disparity(&grid, &image, small.view());
        let block = grid.block_size as u32;
        let (u0, v0) = (grid.u0 as u32, grid.v0 as u32);
        for dv in 0..block {
            for du in 0..block {
                // Every pixel of the invalid cell keeps the sentinel despite its valid neighbors.
                assert_eq!(disparity.get_pixel(u0 + block + du, v0 + block + dv).0[0], 10);
                // The valid cells around it never borrow the sentinel.
                assert_eq!(disparity.get_pixel(u0 + du, v0 + block + dv).0[0], 4);
                assert_eq!(disparity.get_pixel(u0 + 2 * block + du, v0 + block + dv).0[0], 4);
                assert_eq!(disparity.get_pixel(u0 + block + du, v0 + dv).0[0], 4);
            }
        }
    }
}

//! Metric reconstruction from the disparity and analytic ground truth to validate it.

use crate::{cost, GeneralizedStereo};
use gencam_core::nalgebra::{Point2, Point3};
use gencam_core::{CameraModel, TriangulatorRelative, WorldToCamera};
use gencam_geom::plane::PlanarTarget;
use gencam_geom::triangulation::MidpointTriangulator;
use image::{ImageBuffer, Luma};
use log::*;
use ndarray::{Array2, Zip};

/// A map of metric distances from the first optical center, `0` where unknown.
pub type DistanceImage = ImageBuffer<Luma<f32>, Vec<f32>>;

impl<C1, C2> GeneralizedStereo<C1, C2>
where
    C1: CameraModel + Sync,
    C2: CameraModel + Sync,
{
    /// Triangulates pixel `(x1, y1)` of the first image with pixel `(x2, y2)` of the second.
    ///
    /// The point is expressed in the frame of the first camera. Returns `None` when a pixel
    /// cannot be unprojected or the two rays are parallel.
    pub fn triangulate(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Point3<f64>> {
        let a = self.camera1().calibrate(Point2::new(x1, y1))?;
        let b = self.camera2().calibrate(Point2::new(x2, y2))?;
        MidpointTriangulator::new().triangulate_relative(self.pose(), a, b)
    }

    /// The distance of every cell of the grid, triangulated from the anchor pixel and the
    /// pixel of its epipolar curve at the disparity of the last
    /// [`GeneralizedStereo::compute_stereo`].
    pub fn compute_distance(&self) -> DistanceImage {
        let grid = *self.grid();
        let sentinel = grid.sentinel();
        let mut distance = Array2::<f32>::zeros(grid.shape());
        let triangulate_cell = |cell: (usize, usize), out: &mut f32, &d: &u8| {
            if d == sentinel {
                return;
            }
            let curve = match &self.curves()[cell] {
                Some(curve) => curve,
                None => return,
            };
            let (u1, v1) = grid.anchor(cell);
            let point = cost::candidates(&grid, curve)
                .nth(d as usize)
                .and_then(|(u2, v2)| {
                    self.triangulate(u1 as f64, v1 as f64, u2 as f64, v2 as f64)
                });
            if let Some(point) = point {
                *out = point.coords.norm() as f32;
            }
        };
        #[cfg(not(feature = "rayon"))]
        Zip::indexed(&mut distance)
            .and(self.small_disparity())
            .for_each(triangulate_cell);
        #[cfg(feature = "rayon")]
        Zip::indexed(&mut distance)
            .and(self.small_disparity())
            .par_for_each(triangulate_cell);
        debug!(
            "{} of {} cells could not be triangulated",
            distance.iter().filter(|&&d| d == 0.0).count(),
            distance.len()
        );
        into_image(distance)
    }

    /// The distance of every cell of the grid to a planar target seen by the first camera.
    ///
    /// `pose` maps the frame of the target into the first camera and the target is the `z = 0`
    /// plane of its frame, bounded by `polygon` unless it is empty. Cells whose ray misses the
    /// target are `0`.
    pub fn generate_plane(&self, pose: WorldToCamera, polygon: &[Point3<f64>]) -> DistanceImage {
        let target = PlanarTarget::new(pose).polygon(polygon);
        let distance = self.reconstructed().map(|ray| {
            ray.and_then(|ray| target.intersect(ray.into_inner()))
                .map_or(0.0, |scale| scale as f32)
        });
        into_image(distance)
    }
}

fn into_image(distance: Array2<f32>) -> DistanceImage {
    let (rows, columns) = distance.dim();
    ImageBuffer::from_fn(columns as u32, rows as u32, |u, v| {
        Luma([distance[(v as usize, u as usize)]])
    })
}

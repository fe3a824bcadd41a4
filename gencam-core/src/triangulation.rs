use crate::CameraToCamera;
use nalgebra::{Point3, UnitVector3};

/// This trait allows you to take one relative pose from camera `A` to camera `B` and two bearings `a` and `b` from
/// their respective cameras to triangulate a point from the perspective of camera `A`.
///
/// Implementations return `None` when the geometry does not determine the point, for instance when the two
/// rays are parallel.
pub trait TriangulatorRelative {
    fn triangulate_relative(
        &self,
        relative_pose: CameraToCamera,
        a: UnitVector3<f64>,
        b: UnitVector3<f64>,
    ) -> Option<Point3<f64>>;
}

use crate::{ImagePoint, KeyPoint};
use nalgebra::{UnitVector3, Vector3};

/// Allows conversion between the point on an image and the bearing of the light
/// that hit it, for any central camera.
///
/// Both directions are fallible: a pixel may lie outside the area of the sensor the lens
/// projects onto, and a direction may lie outside the field of view of the lens.
///
/// Implementors own their parameters. Algorithms that need to keep a camera take it by value,
/// so callers clone the model when they want to keep using it.
pub trait CameraModel {
    /// Extracts a bearing from a pixel location in an image.
    ///
    /// The bearings X axis points right, Y axis points down, and Z axis points forwards.
    /// The image point uses the same coordiate frame. Its Y is down and its X is right.
    ///
    /// Returns `None` if the pixel has no corresponding direction.
    fn calibrate<P>(&self, point: P) -> Option<UnitVector3<f64>>
    where
        P: ImagePoint;

    /// Extracts the pixel location in the image from a direction.
    ///
    /// The direction does not need to be normalized, since only central cameras are
    /// modelled and every point along the direction projects to the same pixel.
    ///
    /// Returns `None` if the direction is outside the field of view.
    fn uncalibrate(&self, direction: Vector3<f64>) -> Option<KeyPoint>;

    /// The intrinsic parameter vector of the model.
    fn parameters(&self) -> Vec<f64>;

    /// The closed `(lower, upper)` bounds of every intrinsic parameter, in the
    /// order of [`CameraModel::parameters`]. Unbounded sides are infinite.
    fn parameter_bounds(&self) -> Vec<(f64, f64)>;

    /// The number of intrinsic parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Checks that every parameter is within its bounds.
    fn parameters_in_bounds(&self) -> bool {
        self.parameters()
            .iter()
            .zip(self.parameter_bounds())
            .all(|(&p, (lower, upper))| p >= lower && p <= upper)
    }
}

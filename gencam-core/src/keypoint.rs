use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the point on the image a measurement came from.
pub trait ImagePoint {
    /// Retrieves the point on the image
    fn image_point(&self) -> Point2<f64>;
}

/// A point on an image frame in pixel coordinates.
/// This means the keypoint is neither undistorted nor normalized.
///
/// For calibrated coordinates, use a bearing (`UnitVector3<f64>`) obtained from a
/// [`CameraModel`](crate::CameraModel).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl KeyPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }

    /// The integer pixel closest to the keypoint.
    ///
    /// ```
    /// use gencam_core::KeyPoint;
    /// assert_eq!(KeyPoint::new(3.49, -0.51).nearest_pixel(), (3, -1));
    /// ```
    pub fn nearest_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}

impl ImagePoint for Point2<f64> {
    fn image_point(&self) -> Point2<f64> {
        *self
    }
}

/// Integer pixels are sampled at their center, which is the integer coordinate itself.
impl ImagePoint for (i32, i32) {
    fn image_point(&self) -> Point2<f64> {
        Point2::new(self.0 as f64, self.1 as f64)
    }
}

//! This crate plugs into `gencam-core` and provides the enhanced unified camera model (EUCM)
//! of Khomutenko, Garcia and Martinet. It converts pixels into bearings (3d directions pointing
//! towards where the light came from) and back, for lenses ranging from a plain pinhole to
//! fisheye lenses with a field of view beyond 180 degrees.
//!
//! The model projects a direction `(x, y, z)` as
//!
//! ```text
//! d   = sqrt(beta * (x² + y²) + z²)
//! rho = alpha * d + (1 - alpha) * z
//! u   = fx * x / rho + u0
//! v   = fy * y / rho + v0
//! ```
//!
//! With `alpha = 0` the model is a pinhole camera. With `beta = 1` it is the unified camera model.

mod error;

pub use error::*;

use gencam_core::nalgebra::{Point2, UnitVector3, Vector2, Vector3};
use gencam_core::{CameraModel, ImagePoint, KeyPoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Smallest `rho` (for a unit direction) or unprojection discriminant considered valid.
const PRECISION: f64 = 1e-3;

/// Enhanced unified camera model.
///
/// The parameter vector is `[fx, fy, u0, v0, alpha, beta]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct EucmCamera {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
    pub alpha: f64,
    pub beta: f64,
}

impl EucmCamera {
    /// Number of intrinsic parameters.
    pub const NUM_PARAMETERS: usize = 6;

    /// Creates a camera that would behave like an identity pinhole intrinsic matrix.
    /// This would imply that the pixel positions have an origin at `0,0`,
    /// the pixel distance unit is the focal length, and there is no distortion.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            principal_point: Point2::new(0.0, 0.0),
            alpha: 0.0,
            beta: 1.0,
        }
    }

    /// Creates the camera from `[fx, fy, u0, v0, alpha, beta]`, checking the parameter bounds.
    ///
    /// ```
    /// use gencam_eucm::{EucmCamera, EucmError};
    /// let camera = EucmCamera::from_parameters(&[300.0, 300.0, 320.0, 240.0, 0.6, 1.1]).unwrap();
    /// assert_eq!(camera.alpha, 0.6);
    /// assert!(matches!(
    ///     EucmCamera::from_parameters(&[300.0, 300.0, 320.0, 240.0, 1.5, 1.1]),
    ///     Err(EucmError::OutOfBounds { index: 4, .. })
    /// ));
    /// ```
    pub fn from_parameters(parameters: &[f64]) -> Result<Self> {
        if parameters.len() != Self::NUM_PARAMETERS {
            return Err(EucmError::ParameterCount {
                expected: Self::NUM_PARAMETERS,
                found: parameters.len(),
            });
        }
        let camera = Self {
            focals: Vector2::new(parameters[0], parameters[1]),
            principal_point: Point2::new(parameters[2], parameters[3]),
            alpha: parameters[4],
            beta: parameters[5],
        };
        for (index, (&value, (lower, upper))) in parameters
            .iter()
            .zip(camera.parameter_bounds())
            .enumerate()
        {
            if !(value >= lower && value <= upper) {
                return Err(EucmError::OutOfBounds {
                    index,
                    value,
                    lower,
                    upper,
                });
            }
        }
        Ok(camera)
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    pub fn alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }

    /// Normalized image coordinates of a pixel (focal length units, centered on the principal point).
    fn normalize(&self, point: Point2<f64>) -> Vector2<f64> {
        (point - self.principal_point).component_div(&self.focals)
    }

    /// For `alpha > 0.5` the image of the model is a disk. This is the squared radius of that
    /// disk in normalized coordinates.
    fn max_radius_squared(&self) -> Option<f64> {
        if self.alpha > 0.5 {
            Some(1.0 / (self.beta * (2.0 * self.alpha - 1.0)))
        } else {
            None
        }
    }
}

impl Default for EucmCamera {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraModel for EucmCamera {
    /// Takes in a point from an image in pixel coordinates and
    /// converts it to a unit bearing.
    ///
    /// ```
    /// use gencam_core::{KeyPoint, CameraModel};
    /// use gencam_core::nalgebra::{Point2, Vector2};
    /// use gencam_eucm::EucmCamera;
    /// let camera = EucmCamera::identity()
    ///     .focals(Vector2::new(250.0, 260.0))
    ///     .principal_point(Point2::new(320.0, 240.0))
    ///     .alpha(0.6)
    ///     .beta(1.2);
    /// let kp = KeyPoint::new(471.0, 322.0);
    /// let bearing = camera.calibrate(kp).unwrap();
    /// let back = camera.uncalibrate(bearing.into_inner()).unwrap();
    /// assert!((kp.0 - back.0).norm() < 1e-6);
    /// ```
    fn calibrate<P>(&self, point: P) -> Option<UnitVector3<f64>>
    where
        P: ImagePoint,
    {
        let m = self.normalize(point.image_point());
        let r2 = m.norm_squared();
        if let Some(max_r2) = self.max_radius_squared() {
            if r2 > max_r2 {
                return None;
            }
        }
        let alpha = self.alpha;
        let discriminant = 1.0 - (2.0 * alpha - 1.0) * self.beta * r2;
        if discriminant < PRECISION {
            return None;
        }
        let mz = (1.0 - self.beta * alpha * alpha * r2)
            / (alpha * discriminant.sqrt() + 1.0 - alpha);
        UnitVector3::try_new(Vector3::new(m.x, m.y, mz), f64::EPSILON)
    }

    /// Converts a direction back into pixel coordinates.
    ///
    /// ```
    /// use gencam_core::CameraModel;
    /// use gencam_core::nalgebra::{Point2, Vector3};
    /// use gencam_eucm::EucmCamera;
    /// let pinhole = EucmCamera::identity().focal(100.0).principal_point(Point2::new(50.0, 40.0));
    /// let kp = pinhole.uncalibrate(Vector3::new(0.1, -0.2, 1.0)).unwrap();
    /// assert!((kp.x - 60.0).abs() < 1e-12 && (kp.y - 20.0).abs() < 1e-12);
    /// // A pinhole camera cannot see behind itself.
    /// assert!(pinhole.uncalibrate(Vector3::new(0.0, 0.0, -1.0)).is_none());
    /// ```
    fn uncalibrate(&self, direction: Vector3<f64>) -> Option<KeyPoint> {
        let norm = direction.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return None;
        }
        let unit = direction / norm;
        let (x, y, z) = (unit.x, unit.y, unit.z);
        let d = (self.beta * (x * x + y * y) + z * z).sqrt();
        let rho = self.alpha * d + (1.0 - self.alpha) * z;
        if rho < PRECISION {
            return None;
        }
        if self.alpha > 0.5 {
            // Beyond the rim of the image disk the projection folds back onto itself.
            let c = (self.alpha - 1.0) / (2.0 * self.alpha - 1.0);
            if z < c * rho {
                return None;
            }
        }
        let m = Vector2::new(x / rho, y / rho);
        Some(KeyPoint(
            self.principal_point + m.component_mul(&self.focals),
        ))
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.focals.x,
            self.focals.y,
            self.principal_point.x,
            self.principal_point.y,
            self.alpha,
            self.beta,
        ]
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![
            (f64::MIN_POSITIVE, f64::INFINITY),
            (f64::MIN_POSITIVE, f64::INFINITY),
            (f64::NEG_INFINITY, f64::INFINITY),
            (f64::NEG_INFINITY, f64::INFINITY),
            (0.0, 1.0),
            (f64::MIN_POSITIVE, f64::INFINITY),
        ]
    }
}

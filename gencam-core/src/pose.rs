use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix4, Point3, Rotation3, Vector3, Vector6};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by all the different poses in this library:
///
/// * [`CameraToCamera`] - Transforms camera points from one camera into camera points of another camera
/// * [`WorldToCamera`] - Transforms world (or object) points into camera points
/// * [`CameraToWorld`] - Transforms camera points into world (or object) points
///
/// Poses serialize to a 6 parameter array: the translation followed by the rotation
/// as a rotation vector (axis scaled by the angle in radians).
pub trait Pose: From<IsometryMatrix3<f64>> + Clone + Copy {
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> IsometryMatrix3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }

    /// Retrieve the homogeneous matrix.
    fn homogeneous(self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// The translation component of the pose.
    fn translation(self) -> Vector3<f64> {
        self.isometry().translation.vector
    }

    /// The rotation component of the pose.
    fn rotation(self) -> Rotation3<f64> {
        self.isometry().rotation
    }

    /// Retrieve the 6 parameter representation of the pose
    /// (translation components before the rotation vector).
    fn se3(self) -> Vector6<f64> {
        let isometry = self.isometry();
        let t = isometry.translation.vector;
        let r = isometry.rotation.scaled_axis();
        Vector6::new(t.x, t.y, t.z, r.x, r.y, r.z)
    }

    /// Create the pose from its 6 parameter representation.
    fn from_se3(se3: Vector6<f64>) -> Self {
        let translation = se3.xyz();
        let rotation = Rotation3::from_scaled_axis(Vector3::new(se3[3], se3[4], se3[5]));
        Self::from_parts(translation, rotation)
    }

    /// Create the pose from a 6 parameter array.
    ///
    /// ```
    /// use gencam_core::{CameraToCamera, Pose};
    /// let array = [0.1, -0.2, 0.3, 0.01, 0.02, -0.03];
    /// let pose = CameraToCamera::from_array(array);
    /// let back = pose.to_array();
    /// for (a, b) in array.iter().zip(back.iter()) {
    ///     assert!((a - b).abs() < 1e-12);
    /// }
    /// ```
    fn from_array(array: [f64; 6]) -> Self {
        Self::from_se3(Vector6::from_column_slice(&array))
    }

    /// Serialize the pose to a 6 parameter array.
    fn to_array(self) -> [f64; 6] {
        let se3 = self.se3();
        [se3[0], se3[1], se3[2], se3[3], se3[4], se3[5]]
    }

    /// Composes two poses. The result applies `other` first and then `self`.
    #[must_use]
    fn compose(self, other: Self) -> Self {
        (self.isometry() * other.isometry()).into()
    }

    /// Transform a point.
    fn transform(self, point: Point3<f64>) -> Point3<f64> {
        self.isometry() * point
    }

    /// Apply only the rotation of the pose to a direction.
    fn rotate(self, direction: Vector3<f64>) -> Vector3<f64> {
        self.isometry().rotation * direction
    }

    /// Transform a point by the inverse of the pose.
    fn inverse_transform(self, point: Point3<f64>) -> Point3<f64> {
        self.isometry().inverse_transform_point(&point)
    }

    /// Transform a batch of points by the inverse of the pose.
    fn inverse_transform_points(self, points: &[Point3<f64>]) -> Vec<Point3<f64>> {
        let isometry = self.isometry();
        points
            .iter()
            .map(|point| isometry.inverse_transform_point(point))
            .collect()
    }
}

/// This contains a world pose, which is a pose of the world relative to the camera.
/// This maps world points into camera points, changing an absolute position into
/// a vector relative to the camera.
///
/// The "world" may be any object frame, such as the frame of a planar target.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldToCamera(pub IsometryMatrix3<f64>);

impl Pose for WorldToCamera {
    type Inverse = CameraToWorld;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

/// This contains a camera pose, which is a pose of the camera relative to the world.
/// This transforms camera points (with depth as `z`) into world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToWorld(pub IsometryMatrix3<f64>);

impl Pose for CameraToWorld {
    type Inverse = WorldToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

/// This contains a relative pose that transforms a point in the space of camera `A`
/// into the space of camera `B`.
///
/// The translation is the optical center of `A` seen from `B`, so the rotation alone maps
/// directions (such as points at infinity) from `A` to `B`.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToCamera(pub IsometryMatrix3<f64>);

impl Pose for CameraToCamera {
    type Inverse = CameraToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

impl CameraToCamera {
    /// The optical center of camera `B` expressed in the space of camera `A`.
    pub fn target_center(self) -> Point3<f64> {
        self.inverse_transform(Point3::origin())
    }

    /// The length of the baseline between the two optical centers.
    pub fn baseline(self) -> f64 {
        self.translation().norm()
    }
}

impl WorldToCamera {
    /// The optical center of the camera in world coordinates.
    pub fn camera_center(self) -> Point3<f64> {
        self.inverse_transform(Point3::origin())
    }
}

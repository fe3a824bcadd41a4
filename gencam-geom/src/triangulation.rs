use gencam_core::{
    nalgebra::{Point3, UnitVector3},
    CameraToCamera, Pose, TriangulatorRelative,
};

/// Triangulates the midpoint of the shortest segment joining the two rays.
///
/// Ray `a` starts at the optical center of camera `A` and ray `b` starts at the optical
/// center of camera `B`, which is [`CameraToCamera::target_center`] in the space of `A`.
/// When the bearings are exact, the segment has zero length and the midpoint is the point itself.
///
/// Returns `None` when the rays are parallel up to the epsilon, since the depth along them is
/// then undetermined. This is what happens for points at infinity or with a zero baseline.
///
/// ```
/// use gencam_core::nalgebra::{Vector3, Point3, Rotation3, UnitVector3};
/// use gencam_core::{TriangulatorRelative, CameraToCamera, Pose};
/// use gencam_geom::triangulation::MidpointTriangulator;
///
/// let point = Point3::new(0.3, 0.1, 2.0);
/// let pose = CameraToCamera::from_parts(Vector3::new(0.1, 0.1, 0.1), Rotation3::new(Vector3::new(0.1, 0.1, 0.1)));
/// let bearing_a = UnitVector3::new_normalize(point.coords);
/// let bearing_b = UnitVector3::new_normalize(pose.transform(point).coords);
/// let triangulated = MidpointTriangulator::new().triangulate_relative(pose, bearing_a, bearing_b).unwrap();
/// assert!((point - triangulated).norm() < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct MidpointTriangulator {
    epsilon: f64,
}

impl MidpointTriangulator {
    /// Creates a `MidpointTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the smallest squared sine of the angle between the rays that is still triangulated.
    ///
    /// Default is `1e-10`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Default for MidpointTriangulator {
    fn default() -> Self {
        Self { epsilon: 1e-10 }
    }
}

impl TriangulatorRelative for MidpointTriangulator {
    fn triangulate_relative(
        &self,
        relative_pose: CameraToCamera,
        a: UnitVector3<f64>,
        b: UnitVector3<f64>,
    ) -> Option<Point3<f64>> {
        // Both rays in the space of camera A.
        let origin_b = relative_pose.target_center().coords;
        let da = a.into_inner();
        let db = relative_pose.inverse().rotate(b.into_inner());
        let w0 = -origin_b;

        let aa = da.dot(&da);
        let ab = da.dot(&db);
        let bb = db.dot(&db);
        let aw = da.dot(&w0);
        let bw = db.dot(&w0);
        let denominator = aa * bb - ab * ab;
        if !(denominator >= self.epsilon) {
            return None;
        }

        let depth_a = (ab * bw - bb * aw) / denominator;
        let depth_b = (aa * bw - ab * aw) / denominator;
        let closest_a = da * depth_a;
        let closest_b = origin_b + db * depth_b;
        Some(Point3::from((closest_a + closest_b) * 0.5))
            .filter(|p| p.coords.iter().all(|n| n.is_finite()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gencam_core::nalgebra::{Rotation3, Vector3};

    #[test]
    fn parallel_rays_are_rejected() {
        let pose = CameraToCamera::from_parts(Vector3::new(-0.2, 0.0, 0.0), Rotation3::identity());
        let bearing = UnitVector3::new_normalize(Vector3::new(0.1, 0.2, 1.0));
        assert!(MidpointTriangulator::new()
            .triangulate_relative(pose, bearing, bearing)
            .is_none());
    }

    #[test]
    fn zero_baseline_is_rejected() {
        let pose = CameraToCamera::from_parts(
            Vector3::zeros(),
            Rotation3::new(Vector3::new(0.0, 0.3, 0.0)),
        );
        let point = Point3::new(0.5, -0.2, 3.0);
        let a = UnitVector3::new_normalize(point.coords);
        let b = UnitVector3::new_normalize(pose.transform(point).coords);
        assert!(MidpointTriangulator::new()
            .triangulate_relative(pose, a, b)
            .is_none());
    }

    #[test]
    fn skew_rays_give_the_midpoint() {
        // Ray a along z through the origin. Ray b along x at height y = 1, z = 2.
        let pose = CameraToCamera::from_parts(Vector3::new(0.0, -1.0, -2.0), Rotation3::identity());
        let a = UnitVector3::new_normalize(Vector3::z());
        let b = UnitVector3::new_normalize(Vector3::x());
        let p = MidpointTriangulator::new()
            .triangulate_relative(pose, a, b)
            .unwrap();
        assert!((p - Point3::new(0.0, 0.5, 2.0)).norm() < 1e-12);
    }
}

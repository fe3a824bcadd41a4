//! Bounded planar targets.
//!
//! A target is the `z = 0` plane of its own frame, optionally bounded by a polygon given in
//! that frame. A [`WorldToCamera`] pose places the target in front of a camera, with the
//! target frame playing the role of the world.

use gencam_core::{
    nalgebra::{Point2, Point3, Vector3},
    Pose, WorldToCamera,
};

/// The `z = 0` plane of a target frame, bounded by a polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarTarget {
    pose: WorldToCamera,
    polygon: Vec<Point2<f64>>,
}

impl PlanarTarget {
    /// Places an unbounded plane with the given pose.
    pub fn new(pose: WorldToCamera) -> Self {
        Self {
            pose,
            polygon: vec![],
        }
    }

    /// Bounds the plane with a polygon expressed in the target frame.
    ///
    /// Only the `x` and `y` coordinates of the vertices are used. An empty polygon means
    /// the plane is unbounded.
    #[must_use]
    pub fn polygon(self, polygon: &[Point3<f64>]) -> Self {
        Self {
            polygon: polygon.iter().map(|p| p.xy()).collect(),
            ..self
        }
    }

    /// The normal of the plane in camera space.
    pub fn normal(&self) -> Vector3<f64> {
        self.pose.rotate(Vector3::z())
    }

    /// Intersects a ray leaving the optical center with the target.
    ///
    /// Returns the scale of `direction` at which the ray hits the target. Rays that are
    /// parallel to the plane, hit it behind the camera or miss the polygon return `None`.
    ///
    /// ```
    /// use gencam_core::nalgebra::{Point3, Rotation3, Vector3};
    /// use gencam_core::{Pose, WorldToCamera};
    /// use gencam_geom::plane::PlanarTarget;
    ///
    /// let pose = WorldToCamera::from_parts(Vector3::new(0.0, 0.0, 2.0), Rotation3::identity());
    /// let square = [
    ///     Point3::new(-1.0, -1.0, 0.0),
    ///     Point3::new(1.0, -1.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(-1.0, 1.0, 0.0),
    /// ];
    /// let target = PlanarTarget::new(pose).polygon(&square);
    /// assert_eq!(target.intersect(Vector3::new(0.0, 0.0, 1.0)), Some(2.0));
    /// assert_eq!(target.intersect(Vector3::new(1.0, 0.0, 1.0)), None);
    /// assert_eq!(target.intersect(Vector3::new(0.0, 0.0, -1.0)), None);
    /// ```
    pub fn intersect(&self, direction: Vector3<f64>) -> Option<f64> {
        let normal = self.normal();
        let origin = self.pose.translation();
        let denominator = normal.dot(&direction);
        if denominator.abs() < f64::EPSILON {
            return None;
        }
        let scale = normal.dot(&origin) / denominator;
        if !(scale > 0.0) || !scale.is_finite() {
            return None;
        }
        let hit = self.pose.inverse_transform(Point3::from(direction * scale));
        if self.polygon.is_empty() || contains(&self.polygon, hit.xy()) {
            Some(scale)
        } else {
            None
        }
    }
}

/// Crossing number test. Points exactly on an edge may fall on either side.
pub fn contains(polygon: &[Point2<f64>], point: Point2<f64>) -> bool {
    let mut inside = false;
    let mut previous = match polygon.last() {
        Some(&last) => last,
        None => return false,
    };
    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y) {
            let x = current.x
                + (point.y - current.y) * (previous.x - current.x) / (previous.y - current.y);
            if point.x < x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn concave_polygon() {
        // An L shape missing its top right quadrant.
        let polygon = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(contains(&polygon, Point2::new(0.5, 0.5)));
        assert!(contains(&polygon, Point2::new(1.5, 0.5)));
        assert!(contains(&polygon, Point2::new(0.5, 1.5)));
        assert!(!contains(&polygon, Point2::new(1.5, 1.5)));
        assert!(!contains(&polygon, Point2::new(-0.5, 0.5)));
        assert!(!contains(&[], Point2::new(0.0, 0.0)));
    }
}

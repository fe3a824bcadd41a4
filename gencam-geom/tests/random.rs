use gencam_core::nalgebra::{Point3, Rotation3, UnitVector3, Vector3};
use gencam_core::{CameraToCamera, Pose, TriangulatorRelative};
use gencam_geom::triangulation::MidpointTriangulator;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const SAMPLE_POINTS: usize = 100;
const ROT_MAGNITUDE: f64 = 0.3;
const POINT_BOX_SIZE: f64 = 2.0;
const TOLERANCE: f64 = 1e-6;

fn random_vector(rng: &mut Pcg64) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    )
}

#[test]
fn randomized() {
    let mut rng = Pcg64::from_seed([1; 32]);
    let triangulator = MidpointTriangulator::new();
    for _ in 0..SAMPLE_POINTS {
        let mut translation = random_vector(&mut rng) * 0.5;
        if translation.norm() < 0.05 {
            translation.x += 0.1;
        }
        let pose = CameraToCamera::from_parts(
            translation,
            Rotation3::new(random_vector(&mut rng) * ROT_MAGNITUDE),
        );
        let mut point = random_vector(&mut rng) * 0.5 * POINT_BOX_SIZE;
        point.z += 2.0 + POINT_BOX_SIZE;
        let point = Point3::from(point);

        let a = UnitVector3::new_normalize(point.coords);
        let b = UnitVector3::new_normalize(pose.transform(point).coords);
        let triangulated = triangulator
            .triangulate_relative(pose, a, b)
            .expect("rays with a baseline must triangulate");
        assert!(
            (triangulated - point).norm() < TOLERANCE,
            "real: {}, triangulated: {}",
            point,
            triangulated
        );
    }
}

#[test]
fn point_behind_both_cameras_of_a_wide_lens() {
    // Wide-field bearings may point backwards, the midpoint does not care.
    let pose = CameraToCamera::from_parts(Vector3::new(-0.3, 0.0, 0.0), Rotation3::identity());
    let point = Point3::new(0.5, 0.2, -1.5);
    let a = UnitVector3::new_normalize(point.coords);
    let b = UnitVector3::new_normalize(pose.transform(point).coords);
    let triangulated = MidpointTriangulator::new()
        .triangulate_relative(pose, a, b)
        .unwrap();
    assert!((triangulated - point).norm() < TOLERANCE);
}

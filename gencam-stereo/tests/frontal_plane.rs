use approx::assert_relative_eq;
use gencam_core::nalgebra::{Point2, Point3, Rotation3, Vector3};
use gencam_core::{CameraModel, CameraToCamera, Pose, WorldToCamera};
use gencam_eucm::EucmCamera;
use gencam_stereo::{candidates, CurveShape, GeneralizedStereo, StereoSettings};
use image::{GrayImage, Luma};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;
const DISPARITY_MAX: u32 = 32;
/// The disparity of a plane at a depth of one focal unit seen with a baseline of `0.1`.
const SHIFT: u32 = 10;
/// Distance on the plane between the random values of its texture.
const TEXTURE_SPACING: f64 = 0.025;

fn pinhole() -> EucmCamera {
    EucmCamera::identity()
        .focal(100.0)
        .principal_point(Point2::new(80.0, 60.0))
}

/// The second camera sits `0.1` to the right of the first one.
fn lateral_pose() -> CameraToCamera {
    CameraToCamera::from_parts(Vector3::new(-0.1, 0.0, 0.0), Rotation3::identity())
}

/// A textured plane at depth one seen by both cameras.
fn frontal_plane() -> (GrayImage, GrayImage) {
    let mut rng = Pcg64::from_seed([7; 32]);
    let image1 = GrayImage::from_fn(WIDTH, HEIGHT, |_, _| Luma([rng.gen()]));
    let image2 = GrayImage::from_fn(WIDTH, HEIGHT, |u, v| {
        if u + SHIFT < WIDTH {
            *image1.get_pixel(u + SHIFT, v)
        } else {
            Luma([rng.gen()])
        }
    });
    (image1, image2)
}

/// Intensity of the textured plane at `(x, y)`, bilinear between the values of `lattice`.
fn plane_texture(lattice: &GrayImage, x: f64, y: f64) -> f64 {
    let size = lattice.width() as f64;
    let (fu, fv) = (x / TEXTURE_SPACING + size / 2.0, y / TEXTURE_SPACING + size / 2.0);
    let (i, j) = (fu.floor().clamp(0.0, size - 2.0), fv.floor().clamp(0.0, size - 2.0));
    let (a, b) = (fu - i, fv - j);
    let at = |di: u32, dj: u32| f64::from(lattice.get_pixel(i as u32 + di, j as u32 + dj).0[0]);
    at(0, 0) * (1.0 - a) * (1.0 - b)
        + at(1, 0) * a * (1.0 - b)
        + at(0, 1) * (1.0 - a) * b
        + at(1, 1) * a * b
}

/// Renders the plane `z = 1` through `camera` with its optical center at `center`, both
/// expressed in the frame of the first camera.
fn render(camera: &EucmCamera, center: Vector3<f64>, lattice: &GrayImage) -> GrayImage {
    GrayImage::from_fn(WIDTH, HEIGHT, |u, v| {
        let intensity = camera
            .calibrate((u as i32, v as i32))
            .filter(|ray| ray.z > 1e-3)
            .map_or(0.0, |ray| {
                let point = center + ray.into_inner() / ray.z;
                plane_texture(lattice, point.x, point.y)
            });
        Luma([intensity.round() as u8])
    })
}

fn engine() -> GeneralizedStereo<EucmCamera, EucmCamera> {
    let settings = StereoSettings::new(WIDTH, HEIGHT).disparity_max(DISPARITY_MAX);
    GeneralizedStereo::new(lateral_pose(), pinhole(), pinhole(), settings).unwrap()
}

#[test]
fn constant_disparity() {
    let _ = pretty_env_logger::try_init();
    let (image1, image2) = frontal_plane();
    let mut stereo = engine();
    // The optical center of the first camera is behind the image plane of the second one.
    assert_eq!(stereo.epipole(), None);

    let disparity = stereo.compute_stereo(&image1, &image2).unwrap();
    assert_eq!(disparity.dimensions(), (WIDTH, HEIGHT));
    let grid = *stereo.grid();
    let half_block = grid.block_size as i32 / 2;
    for (u, v, d) in disparity.enumerate_pixels() {
        let d = d.0[0];
        if grid.covers(u as usize, v as usize) {
            assert!(
                (d as i32 - SHIFT as i32).abs() <= half_block,
                "pixel ({}, {}) has disparity {}",
                u,
                v,
                d
            );
        } else {
            assert_eq!(d, DISPARITY_MAX as u8, "pixel ({}, {})", u, v);
        }
    }
    assert!(stereo
        .small_disparity()
        .iter()
        .all(|&d| d == SHIFT as u8));
}

#[test]
fn distance_matches_the_plane() {
    let (image1, image2) = frontal_plane();
    let mut stereo = engine();
    stereo.compute_stereo(&image1, &image2).unwrap();

    let distance = stereo.compute_distance();
    let plane = WorldToCamera::from_parts(Vector3::new(0.0, 0.0, 1.0), Rotation3::identity());
    let expected = stereo.generate_plane(plane, &[]);
    let grid = stereo.grid();
    assert_eq!(
        distance.dimensions(),
        (grid.small_width as u32, grid.small_height as u32)
    );
    assert_eq!(distance.dimensions(), expected.dimensions());
    for (measured, expected) in distance.pixels().zip(expected.pixels()) {
        assert!(expected.0[0] >= 1.0);
        assert_relative_eq!(measured.0[0], expected.0[0], max_relative = 1e-5);
    }
}

#[test]
fn bounded_plane() {
    let stereo = engine();
    let plane = WorldToCamera::from_parts(Vector3::new(0.0, 0.0, 2.0), Rotation3::identity());
    let square = [
        Point3::new(-0.2, -0.2, 0.0),
        Point3::new(0.2, -0.2, 0.0),
        Point3::new(0.2, 0.2, 0.0),
        Point3::new(-0.2, 0.2, 0.0),
    ];
    let distance = stereo.generate_plane(plane, &square);
    let grid = stereo.grid();
    // The anchor of cell (20, 15) is pixel (81, 61), almost on the optical axis.
    assert_eq!(grid.anchor((20, 15)), (81, 61));
    let center = distance.get_pixel(15, 20).0[0];
    assert_relative_eq!(center, 2.0, max_relative = 1e-3);
    assert_eq!(distance.get_pixel(0, 0).0[0], 0.0);
}

#[test]
fn wrong_image_size() {
    let (image1, _) = frontal_plane();
    let mut stereo = engine();
    let small = GrayImage::new(100, 100);
    assert_eq!(
        stereo.compute_stereo(&image1, &small),
        Err(gencam_stereo::StereoError::ImageDimensions {
            expected: (WIDTH, HEIGHT),
            found: (100, 100),
        })
    );
}

#[test]
fn fisheye_plane_along_curved_epipolar_lines() {
    let _ = pretty_env_logger::try_init();
    let fisheye = pinhole().alpha(0.6);
    let pose = lateral_pose();
    let mut rng = Pcg64::from_seed([11; 32]);
    let lattice = GrayImage::from_fn(160, 160, |_, _| Luma([rng.gen_range(40..=215)]));
    let image1 = render(&fisheye, Vector3::zeros(), &lattice);
    let image2 = render(&fisheye, -pose.translation(), &lattice);

    let settings = StereoSettings::new(WIDTH, HEIGHT).disparity_max(DISPARITY_MAX);
    let mut stereo = GeneralizedStereo::new(pose, fisheye, fisheye, settings).unwrap();
    // The wide field of view sees the first optical center, left of the image.
    let epipole = stereo.epipole().unwrap();
    assert!(epipole.x < 0.0);
    let valid = stereo.curves().iter().flatten().count();
    assert!(valid > 0);
    assert_eq!(stereo.geometry().count_shape(CurveShape::Parabola), valid);

    stereo.compute_stereo(&image1, &image2).unwrap();
    let grid = *stereo.grid();
    let low = grid.half_block as f64;
    let u_high = (grid.image_width - grid.block_size + grid.half_block) as f64;
    let v_high = (grid.image_height - grid.block_size + grid.half_block) as f64;
    let (mut checked, mut matched) = (0, 0);
    for (cell, curve) in stereo.curves().indexed_iter() {
        let (curve, ray) = match (curve, stereo.reconstructed()[cell]) {
            (Some(curve), Some(ray)) => (curve, ray),
            _ => continue,
        };
        let point = Point3::from(ray.into_inner() / ray.z);
        let truth = fisheye.uncalibrate(pose.transform(point).coords).unwrap();
        if !(low..=u_high).contains(&truth.x) || !(low..=v_high).contains(&truth.y) {
            continue;
        }
        let (expected, closest) = candidates(&grid, curve)
            .take(grid.disparity_max)
            .map(|(u, v)| (Point2::new(u as f64, v as f64) - truth.0).norm())
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .unwrap();
        assert!(
            closest < 1.0,
            "cell {:?} passes {} pixels away from its match",
            cell,
            closest
        );
        checked += 1;
        let found = i32::from(stereo.small_disparity()[cell]);
        if (found - expected as i32).abs() <= grid.half_block as i32 {
            matched += 1;
        }
    }
    assert!(checked > 1000);
    assert!(
        matched * 100 >= checked * 95,
        "{} of {} cells found the plane",
        matched,
        checked
    );
}

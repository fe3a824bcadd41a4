//! Epipolar curves of the block grid.
//!
//! The match of a pixel of the first image lies on the projection, by the second camera, of the
//! ray of that pixel. For a pinhole camera the projection is a line. For a wide-field camera it
//! is a conic-like curve going from the projection of the point at infinity of the ray (disparity
//! zero) to the epipole, the projection of the first optical center (infinite disparity).
//!
//! Everything here except [`reconstruct`] depends on the pose.

use crate::{CurveRasterizer, Polynomial2, StereoGrid};
use gencam_core::nalgebra::{Point2, Rotation3, UnitVector3, Vector2, Vector3};
use gencam_core::{CameraModel, CameraToCamera, KeyPoint, Pose};
use ndarray::{Array2, ArrayView2, Zip};

/// Translations shorter than this are a pure rotation, which has no epipole.
pub const BASELINE_TOLERANCE: f64 = 1e-9;

/// Curve anchors closer than this, in pixels, do not define a direction.
const MIN_CHORD: f64 = 0.5;

/// Number of depths tried for the finite-depth sample, doubling from the baseline.
const SAMPLE_DEPTHS: i32 = 24;

/// How the curve of a cell was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveShape {
    /// Parabola through the infinity projection, the epipole and the finite-depth sample.
    Parabola,
    /// Line from the infinity projection to the epipole.
    Chord,
    /// Line from the infinity projection through the finite-depth sample.
    Sample,
    /// Horizontal line towards decreasing `u`, used when the pose gives no direction at all.
    Horizontal,
}

/// The epipolar curve of one pixel of the first image, in the second image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpipolarCurve {
    pub polynomial: Polynomial2,
    /// The pixel of zero disparity, the rounded infinity projection.
    pub seed: (i32, i32),
    /// Direction of growing disparity at the seed.
    pub heading: Vector2<f64>,
    pub shape: CurveShape,
}

impl EpipolarCurve {
    /// Walks the curve from disparity zero towards the epipole.
    pub fn rasterizer(&self) -> CurveRasterizer {
        CurveRasterizer::new(self.polynomial, self.seed, self.heading)
    }

    fn line(start: Point2<f64>, direction: Vector2<f64>, shape: CurveShape) -> Self {
        let heading = direction.normalize();
        Self {
            polynomial: Polynomial2::line(start, heading),
            seed: KeyPoint(start).nearest_pixel(),
            heading,
            shape,
        }
    }
}

/// Unprojects the anchor pixel of every cell of the grid through the first camera.
///
/// Pixels the camera cannot unproject are `None`.
pub fn reconstruct<C>(camera: &C, grid: &StereoGrid) -> Array2<Option<UnitVector3<f64>>>
where
    C: CameraModel + Sync,
{
    let mut rays = Array2::from_elem(grid.shape(), None);
    let unproject = |cell: (usize, usize), ray: &mut Option<UnitVector3<f64>>| {
        *ray = camera.calibrate(grid.anchor(cell));
    };
    #[cfg(not(feature = "rayon"))]
    Zip::indexed(&mut rays).for_each(unproject);
    #[cfg(feature = "rayon")]
    Zip::indexed(&mut rays).par_for_each(unproject);
    rays
}

/// Expresses the rays of the first camera in the frame of the second one.
pub fn rotate(
    rotation: Rotation3<f64>,
    rays: ArrayView2<Option<UnitVector3<f64>>>,
) -> Array2<Option<UnitVector3<f64>>> {
    rays.map(|ray| ray.map(|ray| rotation * ray))
}

/// Projects the optical center of the first camera into the second image.
///
/// `None` for a pure rotation or when the center is out of the field of view.
pub fn epipole<C: CameraModel>(camera2: &C, pose: CameraToCamera) -> Option<KeyPoint> {
    let translation = pose.translation();
    if translation.norm() > BASELINE_TOLERANCE {
        camera2.uncalibrate(translation)
    } else {
        None
    }
}

/// Projects the rotated rays into the second image, which is where their points at infinity appear.
pub fn infinity_projection<C>(
    camera2: &C,
    rotated: ArrayView2<Option<UnitVector3<f64>>>,
) -> Array2<Option<KeyPoint>>
where
    C: CameraModel + Sync,
{
    let mut pinf = Array2::from_elem(rotated.dim(), None);
    let project = |p: &mut Option<KeyPoint>, ray: &Option<UnitVector3<f64>>| {
        *p = ray.and_then(|ray| camera2.uncalibrate(ray.into_inner()));
    };
    #[cfg(not(feature = "rayon"))]
    Zip::from(&mut pinf).and(rotated).for_each(project);
    #[cfg(feature = "rayon")]
    Zip::from(&mut pinf).and(rotated).par_for_each(project);
    pinf
}

/// Projects the point of the ray at the smallest depth, among the baseline times a power of
/// two, that the second camera sees at least [`MIN_CHORD`] away from `start`.
///
/// Depth is in units of the baseline, so the point lies along `rotated * 2^k + t / |t|`. At the
/// baseline itself this is the bisector of the directions of the point at infinity and of the
/// first optical center, which falls half way along the arc between the two anchors. Larger
/// depths are needed when that point is behind the second camera, as in forward motion.
fn depth_sample<C: CameraModel>(
    camera2: &C,
    translation: Vector3<f64>,
    rotated: UnitVector3<f64>,
    start: Point2<f64>,
) -> Option<Point2<f64>> {
    let baseline = translation.norm();
    if baseline <= BASELINE_TOLERANCE {
        return None;
    }
    let towards_center = translation / baseline;
    (0..SAMPLE_DEPTHS)
        .map(|k| rotated.into_inner() * 2f64.powi(k) + towards_center)
        .filter_map(|point| camera2.uncalibrate(point))
        .map(|kp| kp.0)
        .find(|sample| (sample - start).norm() >= MIN_CHORD)
}

/// Fits the epipolar curve of a ray.
///
/// The curve goes through the infinity projection `pinf`, the `epipole` and the projection of
/// a point of the ray at finite depth. That depth is the baseline, doubled until the second
/// camera sees the point away from `pinf`.
///
/// When the anchors coincide or the epipole is undefined the curve degrades to a line, first
/// through the finite-depth sample and otherwise horizontal.
pub fn fit_curve<C: CameraModel>(
    camera2: &C,
    translation: Vector3<f64>,
    rotated: UnitVector3<f64>,
    pinf: KeyPoint,
    epipole: Option<KeyPoint>,
) -> EpipolarCurve {
    let start = pinf.0;
    let sample = depth_sample(camera2, translation, rotated, start);
    let end = epipole
        .map(|kp| kp.0)
        .filter(|end| (end - start).norm() >= MIN_CHORD);

    match (end, sample) {
        (Some(end), sample) => {
            let parabola = sample.and_then(|sample| Polynomial2::chord_parabola(start, end, sample));
            match parabola {
                Some(polynomial) => EpipolarCurve {
                    polynomial,
                    seed: pinf.nearest_pixel(),
                    heading: (end - start).normalize(),
                    shape: CurveShape::Parabola,
                },
                None => EpipolarCurve::line(start, end - start, CurveShape::Chord),
            }
        }
        (None, Some(sample)) => EpipolarCurve::line(start, sample - start, CurveShape::Sample),
        _ => EpipolarCurve::line(start, -Vector2::x(), CurveShape::Horizontal),
    }
}

/// The pose-dependent part of the epipolar geometry.
#[derive(Debug, Clone)]
pub struct EpipolarGeometry {
    pub rotated: Array2<Option<UnitVector3<f64>>>,
    pub epipole: Option<KeyPoint>,
    pub pinf: Array2<Option<KeyPoint>>,
    pub curves: Array2<Option<EpipolarCurve>>,
}

impl EpipolarGeometry {
    /// Computes the rotated rays, the epipole, the infinity projections and the curves.
    pub fn new<C>(
        camera2: &C,
        pose: CameraToCamera,
        reconstructed: ArrayView2<Option<UnitVector3<f64>>>,
    ) -> Self
    where
        C: CameraModel + Sync,
    {
        let rotated = rotate(pose.rotation(), reconstructed);
        let epipole = epipole(camera2, pose);
        let pinf = infinity_projection(camera2, rotated.view());
        let translation = pose.translation();

        let mut curves = Array2::from_elem(rotated.dim(), None);
        let fit = |curve: &mut Option<EpipolarCurve>,
                   ray: &Option<UnitVector3<f64>>,
                   pinf: &Option<KeyPoint>| {
            *curve = ray
                .zip(*pinf)
                .map(|(ray, pinf)| fit_curve(camera2, translation, ray, pinf, epipole));
        };
        #[cfg(not(feature = "rayon"))]
        Zip::from(&mut curves).and(&rotated).and(&pinf).for_each(fit);
        #[cfg(feature = "rayon")]
        Zip::from(&mut curves)
            .and(&rotated)
            .and(&pinf)
            .par_for_each(fit);

        Self {
            rotated,
            epipole,
            pinf,
            curves,
        }
    }

    /// The epipole rounded to the nearest pixel.
    pub fn epipole_pixel(&self) -> Option<(i32, i32)> {
        self.epipole.map(|kp| kp.nearest_pixel())
    }

    /// The number of cells whose curve is of the given shape.
    pub fn count_shape(&self, shape: CurveShape) -> usize {
        self.curves
            .iter()
            .filter(|curve| matches!(curve, Some(curve) if curve.shape == shape))
            .count()
    }
}

use crate::{
    epipolar, upsample_disparity, CostVolume, EpipolarCurve, EpipolarGeometry, Result,
    SemiGlobalOptimizer, StereoError, StereoGrid, StereoSettings,
};
use gencam_core::nalgebra::UnitVector3;
use gencam_core::{CameraModel, CameraToCamera, KeyPoint, Pose};
use image::{GrayImage, Luma};
use log::*;
use ndarray::Array2;

/// Dense stereo between two generalized cameras with a known relative pose.
///
/// The engine owns both camera models. It unprojects the anchor pixels of the block grid once,
/// at construction. Everything that depends on the pose is recomputed by
/// [`GeneralizedStereo::set_pose`], which is cheap enough to be called while refining a pose.
///
/// ```
/// use gencam_core::nalgebra::{Point2, Rotation3, Vector3};
/// use gencam_core::{CameraToCamera, Pose};
/// use gencam_eucm::EucmCamera;
/// use gencam_stereo::{GeneralizedStereo, StereoSettings};
/// use image::{GrayImage, Luma};
///
/// let camera = EucmCamera::identity()
///     .focal(100.0)
///     .principal_point(Point2::new(80.0, 60.0))
///     .alpha(0.5);
/// let pose = CameraToCamera::from_parts(Vector3::new(-0.1, 0.0, 0.0), Rotation3::identity());
/// let settings = StereoSettings::new(160, 120).disparity_max(32);
/// let mut stereo = GeneralizedStereo::new(pose, camera, camera, settings).unwrap();
///
/// let image = GrayImage::from_fn(160, 120, |u, v| Luma([((u * 7 + v * 13) % 256) as u8]));
/// let disparity = stereo.compute_stereo(&image, &image).unwrap();
/// assert_eq!(disparity.dimensions(), (160, 120));
/// assert!(disparity.pixels().all(|p| p.0[0] <= 32));
/// ```
#[derive(Debug, Clone)]
pub struct GeneralizedStereo<C1, C2> {
    pose: CameraToCamera,
    camera1: C1,
    camera2: C2,
    settings: StereoSettings,
    grid: StereoGrid,
    reconstructed: Array2<Option<UnitVector3<f64>>>,
    geometry: EpipolarGeometry,
    cost: CostVolume,
    small_disparity: Array2<u8>,
}

impl<C1, C2> GeneralizedStereo<C1, C2>
where
    C1: CameraModel + Sync,
    C2: CameraModel + Sync,
{
    /// Validates the settings and precomputes the epipolar geometry.
    ///
    /// `pose` transforms points of the first camera into the second camera.
    pub fn new(
        pose: CameraToCamera,
        camera1: C1,
        camera2: C2,
        settings: StereoSettings,
    ) -> Result<Self> {
        let grid = settings.grid()?;
        info!(
            "Stereo grid of {}x{} cells of {} pixels, {} disparities",
            grid.small_width, grid.small_height, grid.block_size, grid.disparity_max
        );
        let reconstructed = epipolar::reconstruct(&camera1, &grid);
        debug!(
            "{} of {} anchor pixels have no ray",
            reconstructed.iter().filter(|ray| ray.is_none()).count(),
            reconstructed.len()
        );
        let geometry = EpipolarGeometry::new(&camera2, pose, reconstructed.view());
        let stereo = Self {
            pose,
            camera1,
            camera2,
            settings,
            grid,
            reconstructed,
            geometry,
            cost: CostVolume::new(grid.shape(), grid.disparity_max),
            small_disparity: Array2::from_elem(grid.shape(), grid.sentinel()),
        };
        stereo.log_geometry();
        Ok(stereo)
    }

    /// Changes the pose and recomputes the pose-dependent geometry only.
    pub fn set_pose(&mut self, pose: CameraToCamera) {
        info!("Updating the stereo pose to {:?}", pose.to_array());
        self.pose = pose;
        self.geometry = EpipolarGeometry::new(&self.camera2, pose, self.reconstructed.view());
        self.log_geometry();
    }

    fn log_geometry(&self) {
        use crate::CurveShape::*;
        debug!(
            "Epipole {:?}, curves: {} parabolas, {} chords, {} sampled lines, {} horizontal lines",
            self.geometry.epipole.map(|kp| kp.0),
            self.geometry.count_shape(Parabola),
            self.geometry.count_shape(Chord),
            self.geometry.count_shape(Sample),
            self.geometry.count_shape(Horizontal),
        );
    }

    /// Computes the disparity of every pixel of `image1`.
    ///
    /// Both images must have the size of the settings. The output has the same size. Its values
    /// are disparities below `disparity_max`, or `disparity_max` where the disparity is unknown.
    pub fn compute_stereo(&mut self, image1: &GrayImage, image2: &GrayImage) -> Result<GrayImage> {
        self.cost.compute(
            &self.grid,
            self.geometry.curves.view(),
            self.geometry.epipole_pixel(),
            image1,
            image2,
        )?;
        self.small_disparity = SemiGlobalOptimizer::new(
            self.settings.lambda_step,
            self.settings.lambda_jump,
        )
        .optimize(&self.cost);
        let disparity = upsample_disparity(&self.grid, image1, self.small_disparity.view());
        info!(
            "Computed the disparity of a {}x{} image",
            disparity.width(),
            disparity.height()
        );
        Ok(disparity)
    }

    /// Draws the epipolar curve of a pixel of the first image into `out`, from the infinity
    /// projection over `disparity_max` pixels towards the epipole.
    ///
    /// Nothing is drawn if the pixel cannot be unprojected or its point at infinity is out of
    /// view of the second camera.
    pub fn trace_epipolar_curve(&self, pixel: (i32, i32), out: &mut GrayImage) -> Result<()> {
        let expected = (self.grid.image_width as u32, self.grid.image_height as u32);
        if out.dimensions() != expected {
            return Err(StereoError::ImageDimensions {
                expected,
                found: out.dimensions(),
            });
        }
        let curve = self.camera1.calibrate(pixel).and_then(|ray| {
            let rotated = self.pose.rotation() * ray;
            let pinf = self.camera2.uncalibrate(rotated.into_inner())?;
            Some(epipolar::fit_curve(
                &self.camera2,
                self.pose.translation(),
                rotated,
                pinf,
                self.geometry.epipole,
            ))
        });
        let curve = match curve {
            Some(curve) => curve,
            None => return Ok(()),
        };
        let (width, height) = out.dimensions();
        for (u, v) in curve
            .rasterizer()
            .bounds(0, 0, width as i32 - 1, height as i32 - 1)
            .take(self.grid.disparity_max)
        {
            out.put_pixel(u as u32, v as u32, Luma([u8::MAX]));
        }
        Ok(())
    }

    pub fn settings(&self) -> &StereoSettings {
        &self.settings
    }

    pub fn grid(&self) -> &StereoGrid {
        &self.grid
    }

    pub fn pose(&self) -> CameraToCamera {
        self.pose
    }

    pub fn camera1(&self) -> &C1 {
        &self.camera1
    }

    pub fn camera2(&self) -> &C2 {
        &self.camera2
    }

    /// The rays of the anchor pixels in the first camera. They never change with the pose.
    pub fn reconstructed(&self) -> &Array2<Option<UnitVector3<f64>>> {
        &self.reconstructed
    }

    pub fn epipole(&self) -> Option<KeyPoint> {
        self.geometry.epipole
    }

    pub fn epipole_pixel(&self) -> Option<(i32, i32)> {
        self.geometry.epipole_pixel()
    }

    pub fn geometry(&self) -> &EpipolarGeometry {
        &self.geometry
    }

    pub fn curves(&self) -> &Array2<Option<EpipolarCurve>> {
        &self.geometry.curves
    }

    /// The disparity of the block grid from the last [`GeneralizedStereo::compute_stereo`].
    pub fn small_disparity(&self) -> &Array2<u8> {
        &self.small_disparity
    }

    /// The matching errors from the last [`GeneralizedStereo::compute_stereo`].
    pub fn cost_volume(&self) -> &CostVolume {
        &self.cost
    }
}

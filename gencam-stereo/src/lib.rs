//! # gencam stereo
//!
//! Dense stereo matching for generalized cameras, such as fisheye and other wide-field lenses,
//! without rectification.
//!
//! For a pinhole pair the match of a pixel lies on a straight epipolar line. For a generalized
//! camera it lies on a curve. [`GeneralizedStereo`] fits an implicit quadratic to the epipolar
//! curve of the anchor pixel of every block of the region of interest once per pose. It then
//! matches blocks along the rasterized curves, starting at the projection of the point at
//! infinity and walking towards the epipole. The matching errors are aggregated by semi-global
//! matching along four directions. The disparity of the block grid is then brought back to full
//! resolution following the intensity edges of the first image.
//!
//! The output disparity counts the pixels walked along the curve. It is not a horizontal shift.
//! [`GeneralizedStereo::compute_distance`] turns it into metric distances.
//!
//! Disparities range in `0..disparity_max`. The value `disparity_max` marks pixels whose
//! disparity is unknown.

mod cost;
pub mod epipolar;
mod error;
mod polynomial;
mod rasterizer;
mod reconstruction;
mod settings;
mod sgm;
mod stereo;
mod upsample;

pub use cost::*;
pub use epipolar::{CurveShape, EpipolarCurve, EpipolarGeometry};
pub use error::*;
pub use polynomial::*;
pub use rasterizer::*;
pub use reconstruction::*;
pub use settings::*;
pub use sgm::*;
pub use stereo::*;
pub use upsample::*;

//! # gencam core
//!
//! Common abstractions shared by every crate of the generalized-camera stereo workspace:
//! the [`CameraModel`] trait, image points, rigid [`Pose`]s and the [`TriangulatorRelative`] trait.
//!
//! A generalized camera is any central camera whose projection is not necessarily a pinhole:
//! fisheye, catadioptric and other wide-field lenses. Such a camera maps a pixel to a bearing
//! (a unit direction out of the optical center) and a 3d direction back to a pixel. Unlike the
//! pinhole model, both directions can fail. A pinhole camera cannot see behind itself and
//! a fisheye lens has a limited field of view on the image sensor. For this reason both
//! [`CameraModel::calibrate`] and [`CameraModel::uncalibrate`] return an `Option`, and all
//! algorithms built on top of these traits propagate the `None` instead of failing.
//!
//! ## Frames
//!
//! Camera space is defined as:
//!
//! * Origin is the optical center
//! * Positive z axis is forwards
//! * Positive y axis is down
//! * Positive x axis is right
//!
//! A [`CameraToCamera`] pose transforms points from the space of camera `A` into the
//! space of camera `B`. Its translation is therefore the optical center of `A` expressed in `B`,
//! which is exactly what projects to the epipole of `A` in the image of `B`.
//!
//! ```text
//!            epipole of A
//!                 |
//!   @@@@@@@@@@@@@@e@@@@@@@@@@@     image of B
//!                  \
//!                   \
//!    O_A ------------O_B
//! ```

mod camera;
mod keypoint;
mod pose;
mod triangulation;

pub use camera::*;
pub use keypoint::*;
pub use nalgebra;
pub use pose::*;
pub use triangulation::*;

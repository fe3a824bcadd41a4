//! This crate contains computational geometry used by the generalized camera stereo crates.
//!
//! ## Triangulation
//!
//! In this problem we know the relative pose of cameras and the bearing of the same feature
//! observed in each camera frame. We want to find the point of intersection from both cameras.
//!
//! - `p` the point we are trying to triangulate
//! - `a` the bearing on camera A
//! - `b` the bearing on camera B
//! - `O` the optical center of a camera
//! - `@` the image surface
//!
//! ```text
//!                        @
//!                        @
//!               p--------b--------O
//!              /         @
//!             /          @
//!            /           @
//!           /            @
//!   @@@@@@@a@@@@@
//!         /
//!        /
//!       /
//!      O
//! ```
//!
//! With noisy bearings the two rays do not meet, so the point is estimated from
//! their common perpendicular.
//!
//! ## Planes
//!
//! The [`plane`] module intersects rays with bounded planar targets, which is how analytic
//! depth maps are produced for validating a stereo pipeline.

pub mod plane;
pub mod triangulation;

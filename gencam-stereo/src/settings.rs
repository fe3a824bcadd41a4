use crate::{Result, StereoError};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Penalties above this would risk overflowing the aggregated costs.
const MAX_PENALTY: u32 = 1 << 20;

/// The settings of the stereo matcher.
///
/// All fields are fixed once a [`GeneralizedStereo`](crate::GeneralizedStereo) is built.
/// The region of interest starts `u_margin + disparity_max + block_size` pixels from the
/// left border, leaving room for the matching blocks that slide towards the epipole.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StereoSettings {
    /// Number of disparities searched along every curve.
    /// It is also the value of invalid pixels in the disparity maps.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_disparity_max")
    )]
    pub disparity_max: u32,
    /// Side of the matching blocks and stride of the block grid.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_block_size"))]
    pub block_size: u32,
    /// Left margin of the region of interest.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub u_margin: u32,
    /// Top margin of the region of interest.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub v_margin: u32,
    /// Width of the region of interest. `None` extends it to the right border.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub width: Option<u32>,
    /// Height of the region of interest. `None` extends it to the bottom border.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub height: Option<u32>,
    /// Penalty of a disparity change of one between neighbor cells.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_lambda_step"))]
    pub lambda_step: u32,
    /// Penalty of any larger disparity change between neighbor cells.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_lambda_jump"))]
    pub lambda_jump: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl StereoSettings {
    /// Default settings for images of the given size.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn disparity_max(self, disparity_max: u32) -> Self {
        Self {
            disparity_max,
            ..self
        }
    }

    #[must_use]
    pub fn block_size(self, block_size: u32) -> Self {
        Self { block_size, ..self }
    }

    #[must_use]
    pub fn margins(self, u_margin: u32, v_margin: u32) -> Self {
        Self {
            u_margin,
            v_margin,
            ..self
        }
    }

    /// Restricts the region of interest to `width` by `height` pixels.
    #[must_use]
    pub fn roi(self, width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..self
        }
    }

    #[must_use]
    pub fn penalties(self, lambda_step: u32, lambda_jump: u32) -> Self {
        Self {
            lambda_step,
            lambda_jump,
            ..self
        }
    }

    /// Checks the settings and derives the block grid.
    ///
    /// ```
    /// use gencam_stereo::StereoSettings;
    /// let grid = StereoSettings::new(160, 120).grid().unwrap();
    /// assert_eq!(grid.u0, 48 + 3);
    /// assert_eq!(grid.u_small(grid.u_big(7)), 7);
    /// assert!(StereoSettings::new(40, 120).grid().is_err());
    /// ```
    pub fn grid(&self) -> Result<StereoGrid> {
        let invalid = |message: String| Err(StereoError::InvalidSettings(message));
        if self.disparity_max == 0 || self.disparity_max > u8::MAX as u32 {
            return invalid(format!(
                "disparity_max must be within 1..=255, got {}",
                self.disparity_max
            ));
        }
        if self.block_size == 0 {
            return invalid("block_size must be positive".into());
        }
        if self.image_width == 0 || self.image_height == 0 {
            return invalid(format!(
                "image size must be positive, got {}x{}",
                self.image_width, self.image_height
            ));
        }
        if self.lambda_step > MAX_PENALTY || self.lambda_jump > MAX_PENALTY {
            return invalid(format!(
                "penalties must not exceed {}, got step {} and jump {}",
                MAX_PENALTY, self.lambda_step, self.lambda_jump
            ));
        }

        let block_size = self.block_size as i64;
        let u0 = self.u_margin as i64 + self.disparity_max as i64 + block_size;
        let v0 = self.v_margin as i64;
        let u_max = match self.width {
            Some(width) => u0 + width as i64,
            None => self.image_width as i64 - self.u_margin as i64 - block_size,
        };
        let v_max = match self.height {
            Some(height) => v0 + height as i64,
            None => self.image_height as i64 - self.v_margin as i64 - block_size,
        };
        if u_max < u0 || v_max < v0 {
            return invalid(format!(
                "the region of interest is empty: u in {}..={}, v in {}..={}",
                u0, u_max, v0, v_max
            ));
        }
        if u_max + block_size > self.image_width as i64
            || v_max + block_size > self.image_height as i64
        {
            return invalid(format!(
                "the region of interest ends at ({}, {}) and its blocks leave the {}x{} image",
                u_max, v_max, self.image_width, self.image_height
            ));
        }

        let mut grid = StereoGrid {
            disparity_max: self.disparity_max as usize,
            block_size: self.block_size as usize,
            half_block: self.block_size as usize / 2,
            u0: u0 as usize,
            v0: v0 as usize,
            u_max: u_max as usize,
            v_max: v_max as usize,
            small_width: 0,
            small_height: 0,
            image_width: self.image_width as usize,
            image_height: self.image_height as usize,
        };
        grid.small_width = grid.u_small(grid.u_max) + 1;
        grid.small_height = grid.v_small(grid.v_max) + 1;
        Ok(grid)
    }
}

impl Default for StereoSettings {
    fn default() -> Self {
        Self {
            disparity_max: default_disparity_max(),
            block_size: default_block_size(),
            u_margin: 0,
            v_margin: 0,
            width: None,
            height: None,
            lambda_step: default_lambda_step(),
            lambda_jump: default_lambda_jump(),
            image_width: 0,
            image_height: 0,
        }
    }
}

fn default_disparity_max() -> u32 {
    48
}

fn default_block_size() -> u32 {
    3
}

fn default_lambda_step() -> u32 {
    5
}

fn default_lambda_jump() -> u32 {
    32
}

/// The block grid derived from [`StereoSettings`].
///
/// Each cell of the grid is a `block_size` square of the region of interest. Matching happens
/// at the anchor pixel in the middle of every cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StereoGrid {
    pub disparity_max: usize,
    pub block_size: usize,
    pub half_block: usize,
    /// Left column of the region of interest.
    pub u0: usize,
    /// Top row of the region of interest.
    pub v0: usize,
    pub u_max: usize,
    pub v_max: usize,
    pub small_width: usize,
    pub small_height: usize,
    pub image_width: usize,
    pub image_height: usize,
}

impl StereoGrid {
    /// Column of the cell containing image column `u`, which must be at least `u0`.
    pub fn u_small(&self, u: usize) -> usize {
        (u - self.u0) / self.block_size
    }

    /// Row of the cell containing image row `v`, which must be at least `v0`.
    pub fn v_small(&self, v: usize) -> usize {
        (v - self.v0) / self.block_size
    }

    /// Image column of the anchor of cell column `u`.
    pub fn u_big(&self, u: usize) -> usize {
        u * self.block_size + self.half_block + self.u0
    }

    /// Image row of the anchor of cell row `v`.
    pub fn v_big(&self, v: usize) -> usize {
        v * self.block_size + self.half_block + self.v0
    }

    /// The `(rows, columns)` of the grid, the leading shape of every grid buffer.
    pub fn shape(&self) -> (usize, usize) {
        (self.small_height, self.small_width)
    }

    /// The anchor pixel of a cell given as `(row, column)`.
    pub fn anchor(&self, (v, u): (usize, usize)) -> (i32, i32) {
        (self.u_big(u) as i32, self.v_big(v) as i32)
    }

    /// The value marking invalid disparities.
    pub fn sentinel(&self) -> u8 {
        self.disparity_max as u8
    }

    /// Whether the full resolution pixel lies on the block grid.
    pub fn covers(&self, u: usize, v: usize) -> bool {
        u >= self.u0
            && v >= self.v0
            && u < self.u0 + self.small_width * self.block_size
            && v < self.v0 + self.small_height * self.block_size
    }
}

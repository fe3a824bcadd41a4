use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StereoError {
    #[error("invalid stereo settings: {0}")]
    InvalidSettings(String),
    #[error(
        "expected a {}x{} image, found {}x{}",
        .expected.0,
        .expected.1,
        .found.0,
        .found.1
    )]
    ImageDimensions {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, StereoError>;

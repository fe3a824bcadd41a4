use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EucmError {
    #[error("expected {expected} EUCM parameters, found {found}")]
    ParameterCount { expected: usize, found: usize },
    #[error("EUCM parameter {index} = {value} is outside [{lower}, {upper}]")]
    OutOfBounds {
        index: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },
}

pub type Result<T> = std::result::Result<T, EucmError>;

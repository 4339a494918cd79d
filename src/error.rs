//! Error types shared by the arithmetic layer and the proving pipeline.

use thiserror::Error;

/// Coarse classification of a [`StarkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A multiplicative inverse of zero (or of the zero polynomial) was required.
    Arithmetic,
    /// Mismatched or empty vectors, domains or traces.
    Dimension,
    /// A quotient that must be exact was not: the trace violates a constraint.
    Soundness,
    /// Malformed external input or configuration.
    Input,
    /// The proof run ran out of time.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StarkError {
    #[error("division by the zero element")]
    DivisionByZero,
    #[error("element {0} has no multiplicative inverse")]
    NonInvertibleElement(String),
    #[error("divisor is the zero polynomial")]
    InvalidDivisor,
    #[error("no primitive root of unity of order {0}")]
    InvalidRootOrder(u128),

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("domain is empty")]
    EmptyDomain,
    #[error("trace has no rows")]
    EmptyTrace,
    #[error("trace row {row} has {actual} registers, expected {expected}")]
    RaggedTrace {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("cannot fold a codeword of odd length {0}")]
    OddCodewordLength(usize),

    #[error("polynomial division leaves a non-zero remainder")]
    NonZeroRemainder,
    #[error("boundary constraints of register {register} are not satisfied")]
    UnsatisfiedBoundary { register: usize },
    #[error("transition constraint `{constraint}` is not satisfied")]
    UnsatisfiedTransition { constraint: String },

    #[error("invalid field literal `{0}`")]
    InvalidFieldLiteral(String),
    #[error("line {line}: cannot parse `{token}` as a register value")]
    TraceParse { line: usize, token: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded { stage: String },
}

impl StarkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StarkError::DivisionByZero
            | StarkError::NonInvertibleElement(_)
            | StarkError::InvalidDivisor
            | StarkError::InvalidRootOrder(_) => ErrorCategory::Arithmetic,
            StarkError::SizeMismatch { .. }
            | StarkError::EmptyDomain
            | StarkError::EmptyTrace
            | StarkError::RaggedTrace { .. }
            | StarkError::OddCodewordLength(_) => ErrorCategory::Dimension,
            StarkError::NonZeroRemainder
            | StarkError::UnsatisfiedBoundary { .. }
            | StarkError::UnsatisfiedTransition { .. } => ErrorCategory::Soundness,
            StarkError::InvalidFieldLiteral(_)
            | StarkError::TraceParse { .. }
            | StarkError::InvalidConfig(_) => ErrorCategory::Input,
            StarkError::DeadlineExceeded { .. } => ErrorCategory::Cancelled,
        }
    }

    /// True when the error means the claimed trace does not satisfy the AIR.
    pub fn is_soundness_failure(&self) -> bool {
        self.category() == ErrorCategory::Soundness
    }
}

pub type Result<T> = std::result::Result<T, StarkError>;

//! Error types for engine contract violations.

/// Errors returned when a caller breaks an engine precondition.
///
/// The engine performs no I/O, so every variant is a programmer error that
/// should be fixed at the call site rather than retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("fleet size must be > 0, got {0}")]
    InvalidFleetSize(usize),
    #[error("seed {0} is outside the generator range 1..=2147483646")]
    SeedOutOfRange(u64),
    #[error("required power must be finite, got {0}")]
    NonFiniteRequirement(f64),
    #[error("house index {index} out of range for fleet of {len}")]
    HouseIndexOutOfRange { index: usize, len: usize },
    #[error("invalid engine parameter {field}: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },
}

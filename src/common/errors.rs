//! Error types for the engine

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while loading configuration or constructing the engine
///
/// Ticks never fail: every degraded market condition inside a tick
/// resolves to a defined fallback rather than an error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An instrument was configured more than once
    #[error("Duplicate instrument in configuration: {0}")]
    DuplicateInstrument(String),

    /// Position limits must be positive
    #[error("Invalid position limit {limit} for {instrument}")]
    InvalidPositionLimit { instrument: String, limit: i64 },

    /// A basket references a component that is not configured
    #[error("Basket {basket} references unknown component {component}")]
    UnknownComponent { basket: String, component: String },

    /// An option-like instrument references an underlying that is not configured
    #[error("Instrument {instrument} references unknown underlying {underlying}")]
    UnknownUnderlying {
        instrument: String,
        underlying: String,
    },

    /// A conversion entry references an instrument that is not configured
    #[error("Conversion entry references unknown instrument {0}")]
    UnknownConversionInstrument(String),
}

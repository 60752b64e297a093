//! Error taxonomy for dimensionality, unit, and scalar operations.

use thiserror::Error;

/// The unified error type returned by every fallible operation in this crate.
///
/// Replaces the out-parameter error-string convention of a C-style API with
/// ordinary `Result`/`?` propagation: there is no shared mutable error slot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SIError {
    /// A unit symbol did not resolve against the registry.
    #[error("unknown unit symbol: {0}")]
    UnknownSymbol(String),

    /// A constant-function identifier (`aw[X]`, `fw[X]`, isotope property, ...)
    /// did not resolve against the periodic table collaborator.
    #[error("unknown constant: {0}")]
    UnknownConstant(String),

    /// Two operands carry dimensionalities that cannot be combined the
    /// requested way (e.g. addition of incompatible quantities).
    #[error("incompatible dimensionalities: {lhs} vs {rhs}")]
    IncompatibleDimensionalities { lhs: String, rhs: String },

    /// A root or power operation required an integer exponent that divides
    /// every dimension exponent evenly, and it did not.
    #[error("non-integer power: cannot raise dimensionality {dimensionality} to the power {power}")]
    NonIntegerPower { dimensionality: String, power: f64 },

    /// A function's domain requirement was violated (e.g. a non-dimensionless
    /// argument to a transcendental function, or a negative argument to a
    /// root with even degree).
    #[error("domain error: {0}")]
    Domain(String),

    /// A numeric computation over- or underflowed representable range.
    #[error("numeric overflow: {0}")]
    Overflow(String),

    /// A unit or scalar expression failed to parse.
    #[error("parse error at {position}: {message} (near {fragment:?})")]
    ParseError {
        position: usize,
        message: String,
        fragment: String,
    },

    /// An argument was structurally invalid independent of parsing (e.g. an
    /// empty exponent list, a malformed library key).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An invariant internal to this crate was violated; indicates a bug
    /// rather than bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

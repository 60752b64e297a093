// src/lib.rs

//! # SITypes — Dimensional Analysis Engine
//!
//! **Layer:** Library core
//! **Status:** Normative — strict dimensional-consistency execution environment
//!
//! This crate is the computational core of a dimensional-analysis engine: a
//! seven-base-dimension algebra, a process-wide interned unit catalog, and
//! scalar/unit expression parsers built on top of them. Every quantity that
//! flows through the public API carries its dimensionality and unit
//! alongside its numeric value, and arithmetic between incompatible
//! dimensionalities fails loudly rather than silently producing a wrong
//! number.
//!
//! ## Architectural guarantees
//! 1. **Process-wide interning**: every distinct `Dimensionality` and `Unit`
//!    is allocated once and handed out as a `'static` reference thereafter,
//!    so equality between two handles of the same kind is always pointer
//!    equality.
//! 2. **No silent unit loss**: multiplying, dividing, or raising a `Scalar`
//!    to a power always carries its resulting unit forward; only explicit
//!    `reduce` calls cancel matching exponents on opposite sides of a
//!    fraction.
//! 3. **Panic-free parsing**: malformed unit or scalar expressions resolve
//!    to a typed `SIError`, never a panic.

pub mod canonicalize;
pub mod dimensionality;
pub mod error;
pub mod format;
pub mod periodic_table;
pub mod scalar;
pub mod scalar_parser;
pub mod unit;
pub mod unit_algebra;
pub mod unit_parser;
pub mod unit_registry;

pub use dimensionality::{Dimensionality, DimensionalityRef};
pub use error::SIError;
pub use periodic_table::{BuiltinPeriodicTable, PeriodicTable};
pub use scalar::{Comparison, Numeric, NumericKind, Scalar};
pub use scalar_parser::scalar_from_expression;
pub use unit::{Unit, UnitRef};
pub use unit_parser::{dimensionality_from_expression, library_key_of_expression, unit_from_expression};
pub use unit_registry::{UnitRegistry, VolumeUnitSystem};

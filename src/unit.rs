//! The immutable `Unit` record (C3): a dimensionality, a scale to the
//! coherent SI unit of that dimensionality, and display names.

use std::fmt;

use crate::dimensionality::DimensionalityRef;

/// An immutable, interned unit of measure.
///
/// Two interned `Unit`s are the *same* iff they are the same instance
/// (pointer equality via `UnitRef`); they are *equivalent* iff they share
/// dimensionality and scale.
#[derive(Debug)]
pub struct Unit {
    dimensionality: DimensionalityRef,
    /// Multiply a value expressed in this unit by this factor to obtain the
    /// value in the coherent SI unit of the same dimensionality.
    scale_to_coherent_si: f64,
    symbol: String,
    name: Option<String>,
    plural_name: Option<String>,
}

/// Process-lifetime handle to an interned `Unit`.
pub type UnitRef = &'static Unit;

impl Unit {
    #[must_use]
    pub fn new(
        dimensionality: DimensionalityRef,
        scale_to_coherent_si: f64,
        symbol: impl Into<String>,
        name: Option<String>,
        plural_name: Option<String>,
    ) -> Self {
        debug_assert!(scale_to_coherent_si > 0.0, "unit scale must be positive");
        Self {
            dimensionality,
            scale_to_coherent_si,
            symbol: symbol.into(),
            name,
            plural_name,
        }
    }

    #[must_use]
    pub fn dimensionality(&self) -> DimensionalityRef {
        self.dimensionality
    }

    #[must_use]
    pub fn scale_to_coherent_si(&self) -> f64 {
        self.scale_to_coherent_si
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn plural_name(&self) -> Option<&str> {
        self.plural_name.as_deref()
    }

    /// The unit is the coherent SI unit of its dimensionality iff its scale
    /// is exactly 1.
    #[must_use]
    pub fn is_coherent_si(&self) -> bool {
        (self.scale_to_coherent_si - 1.0).abs() < f64::EPSILON
    }

    /// Whether `self` and `other` are equivalent: same dimensionality
    /// (reduced) and scale, regardless of symbol.
    #[must_use]
    pub fn is_equivalent(&self, other: &Unit) -> bool {
        std::ptr::eq(self.dimensionality.reduced(), other.dimensionality.reduced())
            && (self.scale_to_coherent_si - other.scale_to_coherent_si).abs()
                <= 1e-12 * self.scale_to_coherent_si.abs().max(other.scale_to_coherent_si.abs())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Unit {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensionality::from_signed_exponents;

    #[test]
    fn coherent_unit_has_unit_scale() {
        let length = from_signed_exponents([1, 0, 0, 0, 0, 0, 0]);
        let metre = Unit::new(length, 1.0, "m", Some("meter".into()), Some("meters".into()));
        assert!(metre.is_coherent_si());
    }

    #[test]
    fn equivalence_ignores_symbol() {
        let length = from_signed_exponents([1, 0, 0, 0, 0, 0, 0]);
        let a = Unit::new(length, 1000.0, "km", None, None);
        let b = Unit::new(length, 1000.0, "kilometre", None, None);
        assert!(a.is_equivalent(&b));
    }
}

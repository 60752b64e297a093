//! Unit algebra (C6): multiply/divide/power/nth-root over `Unit`s, in both
//! reducing and non-reducing forms, plus `reduce`.
//!
//! Each operation returns the resulting unit together with a multiplier:
//! `value_user * multiplier == value_coherent_si * scale_of_returned_unit`.
//! Callers that already hold a running multiplier fold these into it.

use crate::dimensionality::Dimensionality;
use crate::error::SIError;
use crate::unit::{Unit, UnitRef};
use crate::unit_registry::UnitRegistry;

/// `multiply_without_reducing(a, b)`: dimensionalities combine without
/// cancelling opposite-signed exponents; scales multiply.
pub fn multiply_without_reducing(registry: &UnitRegistry, a: UnitRef, b: UnitRef) -> (UnitRef, f64) {
    if a.dimensionality().is_dimensionless() && a.scale_to_coherent_si() == 1.0 {
        return (b, 1.0);
    }
    if b.dimensionality().is_dimensionless() && b.scale_to_coherent_si() == 1.0 {
        return (a, 1.0);
    }
    if std::ptr::eq(a, b) {
        return power_without_reducing(registry, a, 2);
    }
    let dim = Dimensionality::multiply_without_reducing(a.dimensionality(), b.dimensionality());
    let scale = a.scale_to_coherent_si() * b.scale_to_coherent_si();
    let symbol = format!("({})\u{2022}({})", a.symbol(), b.symbol());
    let unit = registry.best_match_or_synthesize(dim, scale, &symbol);
    (unit, scale / unit.scale_to_coherent_si())
}

/// `multiply(a, b)`: as above, but the resulting dimensionality is reduced.
pub fn multiply(registry: &UnitRegistry, a: UnitRef, b: UnitRef) -> (UnitRef, f64) {
    let (unit, mult) = multiply_without_reducing(registry, a, b);
    (reduce(registry, unit), mult)
}

pub fn divide_without_reducing(registry: &UnitRegistry, a: UnitRef, b: UnitRef) -> (UnitRef, f64) {
    if b.dimensionality().is_dimensionless() && b.scale_to_coherent_si() == 1.0 {
        return (a, 1.0);
    }
    if std::ptr::eq(a, b) {
        return (registry.dimensionless_unit(), 1.0);
    }
    let dim = Dimensionality::divide_without_reducing(a.dimensionality(), b.dimensionality());
    let scale = a.scale_to_coherent_si() / b.scale_to_coherent_si();
    let symbol = format!("({})/({})", a.symbol(), b.symbol());
    let unit = registry.best_match_or_synthesize(dim, scale, &symbol);
    (unit, scale / unit.scale_to_coherent_si())
}

pub fn divide(registry: &UnitRegistry, a: UnitRef, b: UnitRef) -> (UnitRef, f64) {
    let (unit, mult) = divide_without_reducing(registry, a, b);
    (reduce(registry, unit), mult)
}

pub fn power_without_reducing(registry: &UnitRegistry, a: UnitRef, n: i32) -> (UnitRef, f64) {
    if n == 0 {
        return (registry.dimensionless_unit(), 1.0);
    }
    if n == 1 {
        return (a, 1.0);
    }
    let dim = Dimensionality::power_without_reducing(a.dimensionality(), n);
    let scale = a.scale_to_coherent_si().powi(n);
    let symbol = format!("({})^{n}", a.symbol());
    let unit = registry.best_match_or_synthesize(dim, scale, &symbol);
    (unit, scale / unit.scale_to_coherent_si())
}

pub fn power(registry: &UnitRegistry, a: UnitRef, n: i32) -> (UnitRef, f64) {
    let (unit, mult) = power_without_reducing(registry, a, n);
    (reduce(registry, unit), mult)
}

/// `nth_root(a, n)`: fails with `NonIntegerPower` unless every exponent of
/// `a`'s dimensionality is evenly divisible by `n`; fails with `Domain` for
/// `n == 0`.
pub fn nth_root(registry: &UnitRegistry, a: UnitRef, n: i32) -> Result<(UnitRef, f64), SIError> {
    if n == 1 {
        return Ok((a, 1.0));
    }
    if n == 0 {
        return Err(SIError::Domain("0th root of a unit".into()));
    }
    let dim = Dimensionality::nth_root(a.dimensionality(), n)?;
    let scale = a.scale_to_coherent_si().powf(1.0 / f64::from(n));
    let symbol = format!("({})^(1/{n})", a.symbol());
    let unit = registry.best_match_or_synthesize(dim, scale, &symbol);
    Ok((unit, scale / unit.scale_to_coherent_si()))
}

/// Returns the `Unit` with the same scale whose dimensionality is the
/// reduced form of `a`'s. The multiplier is unchanged (1.0).
pub fn reduce(registry: &UnitRegistry, a: UnitRef) -> UnitRef {
    if a.dimensionality().is_reduced() {
        return a;
    }
    let reduced_dim = a.dimensionality().reduced();
    registry.best_match_or_synthesize(reduced_dim, a.scale_to_coherent_si(), a.symbol())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_by_dimensionless_identity_is_noop() {
        let registry = UnitRegistry::new();
        let metre = registry.unit_with_symbol("m").unwrap();
        let one = registry.dimensionless_unit();
        let (result, mult) = multiply(&registry, metre, one);
        assert!(std::ptr::eq(result, metre));
        assert_eq!(mult, 1.0);
    }

    #[test]
    fn divide_by_self_is_dimensionless() {
        let registry = UnitRegistry::new();
        let metre = registry.unit_with_symbol("m").unwrap();
        let (result, _) = divide(&registry, metre, metre);
        assert!(result.dimensionality().is_dimensionless());
    }

    #[test]
    fn power_zero_is_dimensionless() {
        let registry = UnitRegistry::new();
        let metre = registry.unit_with_symbol("m").unwrap();
        let (result, _) = power(&registry, metre, 0);
        assert!(result.dimensionality().is_dimensionless());
    }

    #[test]
    fn nth_root_of_area_is_length() {
        let registry = UnitRegistry::new();
        let square_metre = registry.unit_with_symbol("m^2").unwrap();
        let (result, scale) = nth_root(&registry, square_metre, 2).unwrap();
        assert!((scale - 1.0).abs() < 1e-12);
        assert_eq!(result.dimensionality().signed_exponent(0), 1);
    }
}

//! Canonicalization and reduction invariants.

use sitypes::canonicalize::library_key;
use sitypes::unit_parser::{dimensionality_from_expression, unit_from_expression};
use sitypes::unit_registry::UnitRegistry;

#[test]
fn library_key_is_idempotent() {
    let once = library_key("kg\u{00B7}m/s^2").unwrap();
    let twice = library_key(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn empty_and_whitespace_expressions_are_dimensionless() {
    let registry = UnitRegistry::new();
    let (empty_unit, empty_mult) = unit_from_expression(&registry, "").unwrap();
    let (ws_unit, ws_mult) = unit_from_expression(&registry, "   ").unwrap();

    assert!(empty_unit.dimensionality().is_dimensionless());
    assert!(ws_unit.dimensionality().is_dimensionless());
    assert_eq!(empty_mult, 1.0);
    assert_eq!(ws_mult, 1.0);
}

#[test]
fn self_division_does_not_cancel_but_reduces_to_dimensionless() {
    let registry = UnitRegistry::new();
    let (unit, _) = unit_from_expression(&registry, "m/m").unwrap();
    assert_eq!(unit.symbol(), "m/m");
    assert!(unit.dimensionality().reduced().is_dimensionless());
}

#[test]
fn explicit_first_power_and_redundant_parens_match_bare_symbol() {
    let a = library_key("m^(1)").unwrap();
    let b = library_key("(m)").unwrap();
    let c = library_key("m").unwrap();
    assert_eq!(a, c);
    assert_eq!(b, c);
}

#[test]
fn zeroth_power_is_dimensionless() {
    let key = library_key("m^0").unwrap();
    assert_eq!(key, "1");
}

#[test]
fn micro_prefix_confusables_produce_the_same_unit() {
    let registry = UnitRegistry::new();
    let (mu_symbol, _) = unit_from_expression(&registry, "\u{03BC}m").unwrap();
    let (micro_sign, _) = unit_from_expression(&registry, "\u{00B5}m").unwrap();
    assert!(std::ptr::eq(mu_symbol, micro_sign));
}

#[test]
fn dimensionality_from_expression_matches_unit_dimensionality() {
    let registry = UnitRegistry::new();
    let (unit, _) = unit_from_expression(&registry, "N/m^2").unwrap();
    let dim = dimensionality_from_expression(&registry, "N/m^2").unwrap();
    assert!(std::ptr::eq(unit.dimensionality(), dim));
}

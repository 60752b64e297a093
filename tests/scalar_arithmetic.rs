//! Scalar conversion, reduction, and additive-dimensional-mismatch behavior.

use approx::assert_relative_eq;
use sitypes::unit_parser::unit_from_expression;
use sitypes::{scalar_from_expression, BuiltinPeriodicTable, Comparison, SIError, Scalar, UnitRegistry};

fn parse(registry: &UnitRegistry, table: &BuiltinPeriodicTable, s: &str) -> Scalar {
    scalar_from_expression(registry, table, s).unwrap()
}

#[test]
fn convert_round_trips_back_to_the_original_value() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let original = parse(&registry, &table, "12 km");
    let (metres, _) = unit_from_expression(&registry, "m").unwrap();

    let converted = original.convert_to_unit(metres).unwrap();
    let back = converted.convert_to_unit(original.unit()).unwrap();

    assert_relative_eq!(back.value().as_f64(), original.value().as_f64(), max_relative = 1e-12);
}

#[test]
fn adding_incompatible_dimensionalities_fails() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let metres = parse(&registry, &table, "3 m");
    let seconds = parse(&registry, &table, "4 s");

    let err = metres.add(&seconds).unwrap_err();
    assert!(matches!(err, SIError::IncompatibleDimensionalities { .. }));
}

#[test]
fn additive_operators_commute_within_tolerance() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let a = parse(&registry, &table, "2.5 kg");
    let b = parse(&registry, &table, "7.25 kg");

    let forward = a.add(&b).unwrap();
    let backward = b.add(&a).unwrap();
    assert_eq!(forward.compare_loose(&backward, 1e-12), Comparison::Equal);
}

#[test]
fn reduce_of_multiply_without_reducing_matches_reducing_multiply() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let newtons = parse(&registry, &table, "3 N");
    let metres = parse(&registry, &table, "2 m");

    let unreduced = newtons.multiply_without_reducing(&registry, &metres);
    let reduced_after = unreduced.reduce_unit(&registry);
    let direct = newtons.multiply(&registry, &metres);

    assert_eq!(reduced_after.compare(&direct), Comparison::Equal);
}

#[test]
fn reduce_of_divide_without_reducing_matches_reducing_divide() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let joules = parse(&registry, &table, "10 J");
    let seconds = parse(&registry, &table, "2 s");

    let unreduced = joules.divide_without_reducing(&registry, &seconds);
    let reduced_after = unreduced.reduce_unit(&registry);
    let direct = joules.divide(&registry, &seconds);

    assert_eq!(reduced_after.compare(&direct), Comparison::Equal);
}

#[test]
fn nth_root_of_power_is_the_original_unit() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let metres = parse(&registry, &table, "1 m");

    let squared = metres.raise_to_power(&registry, 2);
    let rooted = squared.nth_root(&registry, 2).unwrap();

    assert_eq!(rooted.compare(&metres), Comparison::Equal);
}

#[test]
fn division_by_zero_scalar_produces_signed_infinity() {
    let registry = UnitRegistry::new();
    let table = BuiltinPeriodicTable;
    let one = parse(&registry, &table, "1 m");
    let zero = parse(&registry, &table, "0 m");

    let result = one.divide(&registry, &zero);
    assert!(result.value().as_f64().is_infinite());
    assert!(result.value().as_f64() > 0.0);
}

//! End-to-end scenarios exercising the parser, registry, and scalar algebra
//! together, one integration test per scenario.

use approx::assert_relative_eq;
use sitypes::unit_parser::{library_key_of_expression, unit_from_expression};
use sitypes::{scalar_from_expression, BuiltinPeriodicTable, Comparison, UnitRegistry};

fn registry() -> UnitRegistry {
    UnitRegistry::new()
}

#[test]
fn electron_volt_converts_to_joules() {
    let table = BuiltinPeriodicTable;
    let registry = registry();
    let scalar = scalar_from_expression(&registry, &table, "4.3 eV").unwrap();
    assert_eq!(scalar.unit().symbol(), "eV");
    assert!((scalar.value().as_f64() - 4.3).abs() < 1e-12);

    let joules = scalar.convert_to_coherent_unit(&registry).unwrap();
    assert_relative_eq!(joules.value().as_f64(), 6.8885e-19, max_relative = 1e-3);
}

#[test]
fn force_over_acceleration_yields_mass_in_kilograms() {
    let table = BuiltinPeriodicTable;
    let registry = registry();
    let force = scalar_from_expression(&registry, &table, "500 N").unwrap();
    let acceleration = scalar_from_expression(&registry, &table, "9.8 m/s^2").unwrap();
    let mass = force.divide(&registry, &acceleration);

    assert_eq!(mass.unit().symbol(), "kg");
    assert_relative_eq!(mass.value().as_f64(), 51.020_408_163_265_3, epsilon = 1e-9);
}

#[test]
fn juxtaposed_sums_multiply_to_an_exact_integer() {
    let table = BuiltinPeriodicTable;
    let registry = registry();
    let scalar = scalar_from_expression(&registry, &table, "(2+3)(4+1)").unwrap();
    assert_eq!(scalar.value().as_f64(), 25.0);
    assert!(scalar.unit().dimensionality().is_dimensionless());
}

#[test]
fn square_root_binds_to_its_own_result_not_its_operand() {
    let table = BuiltinPeriodicTable;
    let registry = registry();
    let root = scalar_from_expression(&registry, &table, "\u{221A}(9) m").unwrap();
    let three_metres = scalar_from_expression(&registry, &table, "3 m").unwrap();
    assert_eq!(root.compare(&three_metres), Comparison::Equal);
}

#[test]
fn ideal_gas_law_matches_expected_pressure() {
    let table = BuiltinPeriodicTable;
    let registry = registry();
    let moles = scalar_from_expression(&registry, &table, "0.078 mol").unwrap();
    let gas_constant = scalar_from_expression(&registry, &table, "R").unwrap();
    let temperature = scalar_from_expression(&registry, &table, "298.15 K").unwrap();
    let volume = scalar_from_expression(&registry, &table, "42.0 mL").unwrap();

    let pressure = moles
        .multiply(&registry, &gas_constant)
        .multiply(&registry, &temperature)
        .divide(&registry, &volume);

    let expected = scalar_from_expression(&registry, &table, "4603777.340690149 Pa").unwrap();
    assert_eq!(pressure.compare_loose(&expected, 1e-6), Comparison::Equal);
}

#[test]
fn library_key_is_stable_across_equivalent_spellings() {
    let a = library_key_of_expression("lb*ft^2/s^2").unwrap();
    let b = library_key_of_expression("ft^2*lb/s^2").unwrap();
    let c = library_key_of_expression("ft*ft*lb/s/s").unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);

    let registry = registry();
    let (unit_a, mult_a) = unit_from_expression(&registry, "lb*ft^2/s^2").unwrap();
    let (unit_b, mult_b) = unit_from_expression(&registry, "ft^2*lb/s^2").unwrap();
    let (unit_c, mult_c) = unit_from_expression(&registry, "ft*ft*lb/s/s").unwrap();

    assert!(std::ptr::eq(unit_a, unit_b));
    assert!(std::ptr::eq(unit_b, unit_c));
    assert_eq!(mult_a, 1.0);
    assert_eq!(mult_b, 1.0);
    assert_eq!(mult_c, 1.0);
}

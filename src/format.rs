//! Formatting (C10): `Display` for `Scalar`/`Unit`/`Dimensionality`, typed
//! and untyped JSON forms, the split-by-units presentation formatter, and
//! `show`/`show_full` diagnostics.

use std::fmt;

use serde_json::{json, Value};

use crate::dimensionality::{quantities_for_dimensionality, Dimensionality, DimensionalityRef, BASE_SYMBOLS};
use crate::error::SIError;
use crate::periodic_table::PeriodicTable;
use crate::scalar::{Numeric, Scalar};
use crate::scalar_parser;
use crate::unit::{Unit, UnitRef};
use crate::unit_parser;
use crate::unit_registry::UnitRegistry;

/// Significant digits used when no explicit format is requested: narrower
/// representations (32-bit real/complex) get fewer digits than the 64-bit
/// ones, mirroring the precision each representation can actually carry.
fn default_significant_digits(value: Numeric) -> usize {
    match value {
        Numeric::Real32(_) | Numeric::Complex64(_) => 7,
        Numeric::Real64(_) | Numeric::Complex128(_) => 15,
    }
}

fn format_numeric(value: Numeric, significant_digits: Option<usize>) -> String {
    let digits = significant_digits.unwrap_or_else(|| default_significant_digits(value));
    let c = value.as_c128();
    if value.is_complex() {
        format_complex_parts(c.re, c.im, digits)
    } else {
        format_part(c.re, digits)
    }
}

fn format_complex_parts(re: f64, im: f64, digits: usize) -> String {
    if im == 0.0 {
        return format_part(re, digits);
    }
    if re == 0.0 {
        return format!("{}I", format_part(im, digits));
    }
    let sign = if im.is_sign_negative() { '-' } else { '+' };
    format!("{}{}{}I", format_part(re, digits), sign, format_part(im.abs(), digits))
}

fn format_part(v: f64, digits: usize) -> String {
    if v.is_infinite() {
        return if v > 0.0 { "\u{221E}".to_string() } else { "-\u{221E}".to_string() };
    }
    if v.is_nan() {
        return "NaN".to_string();
    }
    format_significant(v, digits)
}

/// Renders `v` to `digits` significant figures in plain decimal notation,
/// trimming trailing zeroes. Not a bit-exact replacement for C's `%g`
/// (no scientific-notation fallback for extreme magnitudes), but sufficient
/// for the re-parseable mantissa forms this crate produces.
fn format_significant(v: f64, digits: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    let rendered = format!("{v:.decimals$}");
    trim_trailing_zeros(&rendered)
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Reads the re-parseable string out of either a typed JSON object
/// (`{"type": "...", "value": "<string>"}`) or an untyped bare string.
fn text_from_json(value: &Value) -> Result<&str, SIError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Object(map) => map.get("value").and_then(Value::as_str).ok_or_else(|| SIError::ParseError {
            position: 0,
            message: "typed JSON object is missing a string \"value\" field".into(),
            fragment: value.to_string(),
        }),
        other => Err(SIError::ParseError {
            position: 0,
            message: "expected a JSON string or a typed {\"type\",\"value\"} object".into(),
            fragment: other.to_string(),
        }),
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_numeric(self.value(), None), self.unit().symbol())
    }
}

impl Scalar {
    /// Same as `Display`, but with an explicit significant-digit count.
    #[must_use]
    pub fn to_string_with_format(&self, significant_digits: usize) -> String {
        format!("{} {}", format_numeric(self.value(), Some(significant_digits)), self.unit().symbol())
    }

    /// Untyped JSON: a single string combining mantissa and unit symbol.
    #[must_use]
    pub fn to_json_untyped(&self) -> Value {
        Value::String(self.to_string())
    }

    /// Typed JSON: `{"type":"SIScalar","value":"<stringform>"}`.
    #[must_use]
    pub fn to_json_typed(&self) -> Value {
        json!({"type": "SIScalar", "value": self.to_string()})
    }

    /// Reconstructs a `Scalar` from either JSON form by re-parsing the
    /// stored string form as a scalar expression.
    pub fn from_json(registry: &UnitRegistry, table: &dyn PeriodicTable, value: &Value) -> Result<Scalar, SIError> {
        let text = text_from_json(value)?;
        scalar_parser::scalar_from_expression(registry, table, text)
    }

    /// Writes the canonical string form to stdout.
    pub fn show(&self) {
        println!("{self}");
    }

    /// Writes the canonical string form plus the full dimensionality table
    /// of its unit to stdout.
    pub fn show_full(&self) {
        println!("{self}");
        self.unit().dimensionality().show_full();
    }
}

impl Unit {
    /// Untyped JSON: the canonical symbol as a bare string.
    #[must_use]
    pub fn to_json_untyped(&self) -> Value {
        Value::String(self.symbol().to_string())
    }

    /// Typed JSON: `{"type":"SIUnit","value":"<symbol>"}`.
    #[must_use]
    pub fn to_json_typed(&self) -> Value {
        json!({"type": "SIUnit", "value": self.symbol()})
    }

    /// Reconstructs a `UnitRef` by re-parsing the stored symbol as a unit
    /// expression against `registry`.
    pub fn from_json(registry: &UnitRegistry, value: &Value) -> Result<UnitRef, SIError> {
        let text = text_from_json(value)?;
        let (unit, _multiplier) = unit_parser::unit_from_expression(registry, text)?;
        Ok(unit)
    }

    /// Writes the unit's symbol to stdout.
    pub fn show(&self) {
        println!("{self}");
    }

    /// Writes the unit's symbol plus its full dimensionality table to
    /// stdout.
    pub fn show_full(&self) {
        println!("{self}");
        self.dimensionality().show_full();
    }
}

impl Dimensionality {
    /// Untyped JSON: the canonical symbol as a bare string.
    #[must_use]
    pub fn to_json_untyped(&self) -> Value {
        Value::String(self.symbol().to_string())
    }

    /// Typed JSON: `{"type":"SIDimensionality","value":"<symbol>"}`.
    #[must_use]
    pub fn to_json_typed(&self) -> Value {
        json!({"type": "SIDimensionality", "value": self.symbol()})
    }

    /// Reconstructs a `DimensionalityRef` by re-parsing the stored symbol.
    pub fn from_json(value: &Value) -> Result<DimensionalityRef, SIError> {
        let text = text_from_json(value)?;
        crate::dimensionality::from_symbol(text)
    }

    /// Writes the canonical symbol to stdout.
    pub fn show(&self) {
        println!("{self}");
    }

    /// Writes a fixed table layout: the canonical symbol, the signed
    /// exponent of each base dimension, and every named quantity tag
    /// sharing this (reduced) dimensionality.
    pub fn show_full(&self) {
        println!("Dimensionality: {self}");
        for (i, name) in BASE_SYMBOLS.iter().enumerate() {
            println!("  {name}: {}", self.signed_exponent(i));
        }
        let quantities = quantities_for_dimensionality(self.reduced());
        if quantities.is_empty() {
            println!("  quantities: (none registered)");
        } else {
            println!("  quantities: {}", quantities.join(", "));
        }
    }
}

/// Splits `scalar` across an ordered list of same-dimensionality units,
/// repeatedly taking the largest whole-unit amount from each unit but the
/// last (which absorbs the remainder), e.g. `[yr, mo, wk, d, h, min, s]`
/// renders a duration as `"1 yr + 2 mo + 3 wk"`.
///
/// Mirrors the reference implementation's rounding: each candidate amount
/// is rounded to two decimal places before being floored (for a positive
/// total) or ceiled (for a negative one), and only terms whose sign
/// matches the overall sign are kept. Returns `InvalidArgument` if fewer
/// than two terms survive, since a single-term split carries no benefit
/// over the unit's own `Display` form.
pub fn split_by_units(scalar: &Scalar, units: &[UnitRef]) -> Result<String, SIError> {
    let Some(first) = units.first() else {
        return Err(SIError::InvalidArgument("split-by-units requires at least one unit".into()));
    };
    let target_dim = first.dimensionality().reduced();
    if !std::ptr::eq(scalar.unit().dimensionality().reduced(), target_dim) {
        return Err(SIError::IncompatibleDimensionalities {
            lhs: scalar.unit().to_string(),
            rhs: first.to_string(),
        });
    }

    let total = scalar.to_f64_in_coherent_si();
    let is_positive = total > 0.0;
    let mut remaining = total;
    let mut parts: Vec<String> = Vec::new();

    for (index, unit) in units.iter().enumerate() {
        let scale = unit.scale_to_coherent_si();
        let mut amount = (remaining / scale * 100.0).round() / 100.0;
        if index + 1 < units.len() {
            amount = if is_positive { amount.floor() } else { amount.ceil() };
        }
        let matches_sign = (amount > 0.0 && is_positive) || (amount < 0.0 && !is_positive);
        if matches_sign {
            parts.push(format!("{} {}", format_part(amount, 15), unit.symbol()));
            remaining -= amount * scale;
        }
    }

    if parts.len() < 2 {
        return Err(SIError::InvalidArgument("split-by-units produced fewer than two nonzero terms".into()));
    }

    let joiner = if is_positive { " + " } else { " " };
    Ok(parts.join(joiner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periodic_table::BuiltinPeriodicTable;

    #[test]
    fn scalar_display_is_mantissa_space_symbol() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        let scalar = scalar_parser::scalar_from_expression(&registry, &table, "4.3 eV").unwrap();
        assert_eq!(scalar.to_string(), "4.3 eV");
    }

    #[test]
    fn infinite_value_renders_infinity_symbol() {
        let registry = UnitRegistry::new();
        let dimensionless = registry.dimensionless_unit();
        let scalar = Scalar::new(Numeric::Real64(f64::INFINITY), dimensionless);
        assert_eq!(scalar.to_string(), "\u{221E} 1");
    }

    #[test]
    fn typed_json_round_trips_through_from_json() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        let scalar = scalar_parser::scalar_from_expression(&registry, &table, "9.8 m/s^2").unwrap();
        let json = scalar.to_json_typed();
        let back = Scalar::from_json(&registry, &table, &json).unwrap();
        assert_eq!(back.compare(&scalar), crate::scalar::Comparison::Equal);
    }

    #[test]
    fn unit_json_round_trips() {
        let registry = UnitRegistry::new();
        let newton = registry.unit_with_symbol("N").unwrap();
        let json = newton.to_json_typed();
        let back = Unit::from_json(&registry, &json).unwrap();
        assert_eq!(back.symbol(), "N");
    }

    #[test]
    fn dimensionality_json_round_trips() {
        let force = crate::dimensionality::dimensionality_for_quantity("force").unwrap();
        let json = force.to_json_typed();
        let back = Dimensionality::from_json(&json).unwrap();
        assert!(std::ptr::eq(force, back));
    }

    #[test]
    fn split_by_units_produces_compound_duration() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        let scalar = scalar_parser::scalar_from_expression(&registry, &table, "4082400 s").unwrap();
        let symbols = ["yr", "mo", "wk", "d", "h", "min", "s"];
        let units: Vec<UnitRef> = symbols.iter().map(|s| registry.unit_with_symbol(s).unwrap()).collect();
        let rendered = split_by_units(&scalar, &units).unwrap();
        assert!(rendered.starts_with("1 mo"));
        assert!(rendered.contains(" + "));
    }

    #[test]
    fn split_by_units_rejects_single_term() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        let scalar = scalar_parser::scalar_from_expression(&registry, &table, "3 s").unwrap();
        let units = vec![registry.unit_with_symbol("s").unwrap()];
        assert!(split_by_units(&scalar, &units).is_err());
    }
}

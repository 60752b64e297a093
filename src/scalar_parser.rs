//! Scalar expression parser (C9): literals, complex literals, functions,
//! roots, constants, factorial, and juxtaposition multiplication, each
//! primary optionally followed by a unit expression.
//!
//! Evaluation short-circuits on the first error encountered, mirroring the
//! single-error-slot propagation model of the original grammar by simply
//! returning `Result` at every recursive step.

use num_complex::Complex;

use crate::canonicalize::normalize_for_parsing;
use crate::error::SIError;
use crate::periodic_table::PeriodicTable;
use crate::scalar::{Numeric, Scalar};
use crate::unit_parser::unit_from_expression;
use crate::unit_registry::UnitRegistry;

/// Parses a scalar expression such as `500 N/(9.8 m/s^2)` or `\u{221A}(9) m`.
pub fn scalar_from_expression(registry: &UnitRegistry, table: &dyn PeriodicTable, input: &str) -> Result<Scalar, SIError> {
    let normalized = normalize_for_parsing(input);
    let mut parser = ScalarParser { registry, table, chars: normalized.chars().collect(), pos: 0, source: input.to_string() };
    let result = parser.parse_expr()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(parser.fail("unexpected trailing input in scalar expression"));
    }
    Ok(result)
}

const FUNCTIONS: &[&str] = &[
    "reduce", "sqrt", "cbrt", "qtrt", "exp", "erfc", "erf", "ln", "log", "acosh", "acos", "asinh", "asin", "atanh", "atan", "cosh", "cos", "sinh",
    "sin", "tanh", "tan", "conj", "creal", "cimag", "carg", "cabs",
];

const CONST_FUNCTIONS: &[&str] = &["abundance", "halflife", "gyromag", "magneticdipole", "electricquadrupole", "nmr", "aw", "fw", "spin"];

struct ScalarParser<'r> {
    registry: &'r UnitRegistry,
    table: &'r dyn PeriodicTable,
    chars: Vec<char>,
    pos: usize,
    source: String,
}

impl<'r> ScalarParser<'r> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn fail(&self, message: impl Into<String>) -> SIError {
        SIError::ParseError { position: self.pos, message: message.into(), fragment: self.source.clone() }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SIError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.fail(format!("expected '{expected}'")))
        }
    }

    fn try_consume_keyword(&mut self, keyword: &str) -> bool {
        let kw_len = keyword.chars().count();
        if self.chars[self.pos..].iter().take(kw_len).collect::<String>() == keyword {
            let follows_ident = self.peek_at(kw_len).is_some_and(is_ident_continue);
            if !follows_ident {
                self.pos += kw_len;
                return true;
            }
        }
        false
    }

    /// `expr := add`
    fn parse_expr(&mut self) -> Result<Scalar, SIError> {
        self.parse_add()
    }

    /// `add := mul { ("+"|"-") mul }`
    fn parse_add(&mut self) -> Result<Scalar, SIError> {
        let mut acc = self.parse_mul()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('+') => {
                    self.bump();
                    let rhs = self.parse_mul()?;
                    acc = acc.add(&rhs)?;
                }
                Some('-') => {
                    self.bump();
                    let rhs = self.parse_mul()?;
                    acc = acc.subtract(&rhs)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    /// `mul := pow { ("*"|"/"|"\u{2022}"|"\u{00F7}"|juxtapose) pow }`
    fn parse_mul(&mut self) -> Result<Scalar, SIError> {
        let mut acc = self.parse_pow()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('*') | Some('\u{2022}') => {
                    self.bump();
                    let rhs = self.parse_pow()?;
                    acc = acc.multiply(self.registry, &rhs);
                }
                Some('/') | Some('\u{00F7}') => {
                    self.bump();
                    let rhs = self.parse_pow()?;
                    acc = acc.divide(self.registry, &rhs);
                }
                Some(c) if starts_primary(c) => {
                    // Juxtaposition: "(2+3)(4+1)" or "3m".
                    let rhs = self.parse_pow()?;
                    acc = acc.multiply(self.registry, &rhs);
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    /// `pow := unary [ ("^" unary | "!") ]`
    fn parse_pow(&mut self) -> Result<Scalar, SIError> {
        let base = self.parse_unary()?;
        self.skip_ws();
        match self.peek() {
            Some('^') => {
                self.bump();
                let exponent = self.parse_unary()?;
                self.apply_power(base, exponent)
            }
            Some('!') => {
                self.bump();
                base.factorial(self.registry)
            }
            _ => Ok(base),
        }
    }

    fn apply_power(&self, base: Scalar, exponent: Scalar) -> Result<Scalar, SIError> {
        let exp_value = exponent.value().as_f64();
        if exponent.unit().dimensionality().is_dimensionless() && exp_value.fract() == 0.0 {
            return Ok(base.raise_to_power(self.registry, exp_value as i32));
        }
        if !base.unit().dimensionality().is_dimensionless() || !exponent.unit().dimensionality().is_dimensionless() {
            return Err(SIError::Domain("non-integer exponentiation requires dimensionless base and exponent".into()));
        }
        let result = base.value().as_c128().powc(exponent.value().as_c128());
        Ok(Scalar::new(Numeric::Complex128(result), self.registry.dimensionless_unit()))
    }

    /// `unary := ["-"|"+"] primary`
    fn parse_unary(&mut self) -> Result<Scalar, SIError> {
        self.skip_ws();
        match self.peek() {
            Some('-') => {
                self.bump();
                let value = self.parse_unary()?;
                Ok(negate(value))
            }
            Some('+') => {
                self.bump();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Scalar, SIError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_char(')')?;
                Ok(inner)
            }
            Some('|') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_char('|')?;
                Ok(inner.absolute_value())
            }
            Some('\u{221A}') => {
                self.bump();
                self.parse_root(2)
            }
            Some('\u{221B}') => {
                self.bump();
                self.parse_root(3)
            }
            Some('\u{221C}') => {
                self.bump();
                self.parse_root(4)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number_primary(),
            Some(c) if is_ident_start(c) => self.parse_identifier_led_primary(),
            _ => Err(self.fail("expected a number, '(', function, or unit symbol")),
        }
    }

    fn parse_root(&mut self, degree: i32) -> Result<Scalar, SIError> {
        let operand = self.parse_unary()?;
        operand.nth_root(self.registry, degree)
    }

    fn parse_identifier_led_primary(&mut self) -> Result<Scalar, SIError> {
        for &name in CONST_FUNCTIONS {
            if self.try_consume_keyword(name) {
                return self.parse_const_func_body(name);
            }
        }
        for &name in FUNCTIONS {
            if self.try_consume_keyword(name) {
                self.skip_ws();
                self.expect_char('(')?;
                let arg = self.parse_expr()?;
                self.expect_char(')')?;
                return self.apply_function(name, arg);
            }
        }
        // Bare unit-valued primary: treat as a Scalar of value 1 in that
        // unit (enables physical-constant-as-unit usage such as `R` for
        // the molar gas constant appearing directly in an expression).
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        let symbol: String = self.chars[start..self.pos].iter().collect();
        let (unit, mult) = unit_from_expression(self.registry, &symbol)?;
        Ok(Scalar::new(Numeric::Real64(mult), unit))
    }

    fn parse_const_func_body(&mut self, name: &str) -> Result<Scalar, SIError> {
        self.skip_ws();
        self.expect_char('[')?;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != ']') {
            self.bump();
        }
        let identifier: String = self.chars[start..self.pos].iter().collect();
        self.expect_char(']')?;

        let resolved = match name {
            "aw" => self.table.atomic_weight(&identifier),
            "fw" => self.table.formula_mass(&identifier),
            "abundance" => self.table.isotope_abundance(&identifier),
            "spin" => self.table.isotope_spin(&identifier),
            "halflife" => self.table.isotope_half_life(&identifier),
            "gyromag" => self.table.isotope_gyromagnetic_ratio(&identifier),
            "magneticdipole" => self.table.isotope_magnetic_dipole_moment(&identifier),
            "electricquadrupole" => self.table.isotope_electric_quadrupole_moment(&identifier),
            "nmr" => self.table.nmr_frequency(&identifier),
            _ => None,
        };
        resolved.ok_or_else(|| SIError::UnknownConstant(format!("{name}[{identifier}]")))
    }

    fn apply_function(&self, name: &str, arg: Scalar) -> Result<Scalar, SIError> {
        let dimensionless_required = !matches!(name, "reduce" | "conj" | "creal" | "cimag" | "carg" | "cabs" | "sqrt" | "cbrt" | "qtrt");
        if dimensionless_required && !arg.unit().dimensionality().is_dimensionless() {
            return Err(SIError::Domain(format!("{name} requires a dimensionless argument")));
        }
        let c = arg.value().as_c128();
        let angle_result = |value: f64| -> Result<Scalar, SIError> {
            let radian = self.registry.unit_with_symbol("rad").unwrap_or_else(|| self.registry.dimensionless_unit());
            Ok(Scalar::new(Numeric::Real64(value), radian))
        };

        match name {
            "reduce" => Ok(arg.reduce_unit(self.registry)),
            "sqrt" => arg.nth_root(self.registry, 2),
            "cbrt" => arg.nth_root(self.registry, 3),
            "qtrt" => arg.nth_root(self.registry, 4),
            "conj" => Ok(arg.conjugate()),
            "creal" => arg.take_complex_part(self.registry, "real"),
            "cimag" => arg.take_complex_part(self.registry, "imaginary"),
            "cabs" => arg.take_complex_part(self.registry, "magnitude"),
            "carg" => arg.take_complex_part(self.registry, "argument"),
            "exp" => Ok(Scalar::new(Numeric::Complex128(c.exp()), self.registry.dimensionless_unit())),
            "ln" => Ok(Scalar::new(Numeric::Complex128(c.ln()), self.registry.dimensionless_unit())),
            "log" => Ok(Scalar::new(Numeric::Real64(c.re.log10()), self.registry.dimensionless_unit())),
            "erf" => Ok(Scalar::new(Numeric::Real64(erf(c.re)), self.registry.dimensionless_unit())),
            "erfc" => Ok(Scalar::new(Numeric::Real64(1.0 - erf(c.re)), self.registry.dimensionless_unit())),
            "sin" => Ok(Scalar::new(Numeric::Complex128(c.sin()), self.registry.dimensionless_unit())),
            "cos" => Ok(Scalar::new(Numeric::Complex128(c.cos()), self.registry.dimensionless_unit())),
            "tan" => Ok(Scalar::new(Numeric::Complex128(c.tan()), self.registry.dimensionless_unit())),
            "sinh" => Ok(Scalar::new(Numeric::Complex128(c.sinh()), self.registry.dimensionless_unit())),
            "cosh" => Ok(Scalar::new(Numeric::Complex128(c.cosh()), self.registry.dimensionless_unit())),
            "tanh" => Ok(Scalar::new(Numeric::Complex128(c.tanh()), self.registry.dimensionless_unit())),
            "asin" => angle_result(c.re.asin()),
            "acos" => angle_result(c.re.acos()),
            "atan" => angle_result(c.re.atan()),
            "asinh" => angle_result(c.re.asinh()),
            "acosh" => angle_result(c.re.acosh()),
            "atanh" => angle_result(c.re.atanh()),
            other => Err(SIError::Internal(format!("unhandled function {other}"))),
        }
    }

    fn parse_number_primary(&mut self) -> Result<Scalar, SIError> {
        let re = self.parse_decimal()?;
        self.skip_ws();
        // Complex literal: "3+4*I" / "3-4I" immediately following, no
        // intervening operator context (distinguishing this from ordinary
        // addition requires the trailing imaginary marker "I").
        if matches!(self.peek(), Some('+') | Some('-')) {
            let save = self.pos;
            let sign = if self.peek() == Some('-') { -1.0 } else { 1.0 };
            self.bump();
            self.skip_ws();
            if let Ok(im_coeff) = self.try_parse_imaginary_coefficient() {
                let value = Numeric::Complex128(Complex::new(re, sign * im_coeff));
                return Ok(Scalar::new(value, self.registry.dimensionless_unit()));
            }
            self.pos = save;
        }
        if self.peek() == Some('I') && !self.peek_at(1).is_some_and(is_ident_continue) {
            self.bump();
            let value = Numeric::Complex128(Complex::new(0.0, re));
            return Ok(Scalar::new(value, self.registry.dimensionless_unit()));
        }
        Ok(Scalar::new(Numeric::Real64(re), self.registry.dimensionless_unit()))
    }

    fn try_parse_imaginary_coefficient(&mut self) -> Result<f64, SIError> {
        self.skip_ws();
        let coeff = if self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') { self.parse_decimal()? } else { 1.0 };
        self.skip_ws();
        if matches!(self.peek(), Some('*') | Some('\u{2022}')) {
            self.bump();
            self.skip_ws();
        }
        if self.peek() == Some('I') && !self.peek_at(1).is_some_and(is_ident_continue) {
            self.bump();
            Ok(coeff)
        } else {
            Err(self.fail("not an imaginary literal"))
        }
    }

    fn parse_decimal(&mut self) -> Result<f64, SIError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
            if self.pos == digits_start {
                self.pos = save;
            }
        }
        if self.pos == start {
            return Err(self.fail("expected a number"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().map_err(|_| self.fail("malformed number literal"))
    }

}

fn negate(scalar: Scalar) -> Scalar {
    let value = match scalar.value() {
        Numeric::Real32(v) => Numeric::Real32(-v),
        Numeric::Real64(v) => Numeric::Real64(-v),
        Numeric::Complex64(c) => Numeric::Complex64(-c),
        Numeric::Complex128(c) => Numeric::Complex128(-c),
    };
    Scalar::new(value, scalar.unit())
}

fn starts_primary(c: char) -> bool {
    c == '(' || c.is_ascii_digit() || is_ident_start(c)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '\u{00B5}' | '\u{00B0}' | '\u{2126}' | '\u{210F}')
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '_'
}

/// Abramowitz & Stegun 7.1.26 approximation of the error function, accurate
/// to about 1.5e-7 — sufficient for the dimensionless transcendental
/// functions this parser exposes.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254_829_592;
    let a2 = -0.284_496_736;
    let a3 = 1.421_413_741;
    let a4 = -1.453_152_027;
    let a5 = 1.061_405_429;
    let p = 0.326_7;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periodic_table::BuiltinPeriodicTable;

    fn parse(s: &str) -> Scalar {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        scalar_from_expression(&registry, &table, s).unwrap()
    }

    #[test]
    fn parses_number_with_unit() {
        let scalar = parse("4.3 eV");
        assert_eq!(scalar.unit().symbol(), "eV");
        assert!((scalar.value().as_f64() - 4.3).abs() < 1e-12);
    }

    #[test]
    fn juxtaposition_multiplies() {
        let scalar = parse("(2+3)(4+1)");
        assert!((scalar.value().as_f64() - 25.0).abs() < 1e-9);
        assert!(scalar.unit().dimensionality().is_dimensionless());
    }

    #[test]
    fn sqrt_of_nine_metres_equals_three_metres() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        let root = scalar_from_expression(&registry, &table, "\u{221A}(9) m").unwrap();
        let three = scalar_from_expression(&registry, &table, "3 m").unwrap();
        assert_eq!(root.compare(&three), crate::scalar::Comparison::Equal);
    }

    #[test]
    fn unknown_constant_fails() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        assert!(matches!(scalar_from_expression(&registry, &table, "aw[Xx]"), Err(SIError::UnknownConstant(_))));
    }

    #[test]
    fn ln_of_dimensioned_value_is_domain_error() {
        let registry = UnitRegistry::new();
        let table = BuiltinPeriodicTable;
        assert!(matches!(scalar_from_expression(&registry, &table, "ln(3 m)"), Err(SIError::Domain(_))));
    }

    #[test]
    fn factorial_is_gamma_of_n_plus_one() {
        let scalar = parse("4!");
        assert!((scalar.value().as_f64() - 24.0).abs() < 1e-9);
    }
}

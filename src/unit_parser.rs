//! Unit expression parser (C7): hand-written recursive-descent parser
//! converting strings like `kg\u{2022}m/s^2` into an interned `Unit` plus a
//! scale multiplier.

use crate::canonicalize::library_key;
use crate::error::SIError;
use crate::unit::UnitRef;
use crate::unit_algebra;
use crate::unit_registry::UnitRegistry;

/// Parses a unit expression, returning the resulting interned unit and the
/// multiplier such that `(original_numeric * multiplier)` is expressed in
/// the returned unit.
///
/// A trailing `..suffix` requests conversion into an explicit target unit:
/// the suffix is parsed as its own unit expression, and the returned
/// multiplier accounts for both the parsed expression and the conversion.
pub fn unit_from_expression(registry: &UnitRegistry, input: &str) -> Result<(UnitRef, f64), SIError> {
    let trimmed = input.trim();
    if let Some(idx) = trimmed.find("..") {
        let (expr_part, suffix_part) = (&trimmed[..idx], &trimmed[idx + 2..]);
        let (unit, mult) = parse_expr_str(registry, expr_part)?;
        let (target, _) = parse_expr_str(registry, suffix_part)?;
        if !std::ptr::eq(unit.dimensionality().reduced(), target.dimensionality().reduced()) {
            return Err(SIError::IncompatibleDimensionalities {
                lhs: unit.symbol().to_string(),
                rhs: target.symbol().to_string(),
            });
        }
        let conversion = unit.scale_to_coherent_si() / target.scale_to_coherent_si();
        return Ok((target, mult * conversion));
    }
    parse_expr_str(registry, trimmed)
}

fn parse_expr_str(registry: &UnitRegistry, s: &str) -> Result<(UnitRef, f64), SIError> {
    if s.trim().is_empty() {
        return Ok((registry.dimensionless_unit(), 1.0));
    }
    let normalized = crate::canonicalize::normalize_for_parsing(s);
    let mut parser = Parser { registry, chars: normalized.chars().collect(), pos: 0, source: s.to_string() };
    let result = parser.parse_unit_expr()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(parser.fail("unexpected trailing input in unit expression"));
    }
    Ok(result)
}

struct Parser<'r> {
    registry: &'r UnitRegistry,
    chars: Vec<char>,
    pos: usize,
    source: String,
}

impl<'r> Parser<'r> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
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

    /// `unit_expr := term { ("/"|"\u{2022}") term }`
    fn parse_unit_expr(&mut self) -> Result<(UnitRef, f64), SIError> {
        let (mut unit, mut mult) = self.parse_term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('\u{2022}') => {
                    self.bump();
                    let (rhs, rhs_mult) = self.parse_term()?;
                    let (result, _) = unit_algebra::multiply(self.registry, unit, rhs);
                    unit = result;
                    mult *= rhs_mult;
                }
                Some('/') => {
                    self.bump();
                    let (rhs, rhs_mult) = self.parse_term()?;
                    let (result, _) = unit_algebra::divide(self.registry, unit, rhs);
                    unit = result;
                    mult /= rhs_mult;
                }
                _ => break,
            }
        }
        Ok((unit, mult))
    }

    /// `term := factor { "^" integer | "^(" integer ")" | "^(1/" integer ")" }`
    fn parse_term(&mut self) -> Result<(UnitRef, f64), SIError> {
        self.skip_ws();
        let (mut unit, mut mult) = self.parse_factor()?;
        loop {
            self.skip_ws();
            if self.peek() != Some('^') {
                break;
            }
            self.bump();
            self.skip_ws();
            if self.peek() == Some('(') {
                self.bump();
                self.skip_ws();
                if self.peek() == Some('1') {
                    let save_one = self.pos;
                    self.bump();
                    self.skip_ws();
                    if self.peek() == Some('/') {
                        self.bump();
                        let n = self.parse_signed_integer()?;
                        self.skip_ws();
                        self.expect_char(')')?;
                        let (root_unit, root_mult) = unit_algebra::nth_root(self.registry, unit, n)?;
                        unit = root_unit;
                        mult = mult.powf(1.0 / f64::from(n)) * root_mult;
                        continue;
                    }
                    self.pos = save_one;
                }
                let n = self.parse_signed_integer()?;
                self.skip_ws();
                self.expect_char(')')?;
                let (pow_unit, pow_mult) = unit_algebra::power(self.registry, unit, n);
                unit = pow_unit;
                mult = mult.powi(n) * pow_mult;
                continue;
            }
            let n = self.parse_signed_integer()?;
            let (pow_unit, pow_mult) = unit_algebra::power(self.registry, unit, n);
            unit = pow_unit;
            mult = mult.powi(n) * pow_mult;
        }
        Ok((unit, mult))
    }

    /// `factor := symbol | "(" unit_expr ")" | "1"`
    fn parse_factor(&mut self) -> Result<(UnitRef, f64), SIError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.bump();
                let result = self.parse_unit_expr()?;
                self.skip_ws();
                self.expect_char(')')?;
                Ok(result)
            }
            Some('1') => {
                let save = self.pos;
                self.bump();
                if matches!(self.peek(), Some(c) if is_symbol_continue(c)) {
                    self.pos = save;
                    self.parse_symbol()
                } else {
                    Ok((self.registry.dimensionless_unit(), 1.0))
                }
            }
            Some(c) if is_symbol_start(c) => self.parse_symbol(),
            _ => Err(self.fail("expected a unit symbol, '(', or '1'")),
        }
    }

    fn parse_symbol(&mut self) -> Result<(UnitRef, f64), SIError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_symbol_continue(c)) {
            self.bump();
        }
        let symbol: String = self.chars[start..self.pos].iter().collect();
        self.registry
            .unit_with_symbol(&symbol)
            .map(|u| (u, 1.0))
            .ok_or_else(|| SIError::UnknownSymbol(symbol.clone()))
    }

    fn parse_signed_integer(&mut self) -> Result<i32, SIError> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.bump();
        }
        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == digits_start {
            return Err(self.fail("expected an integer exponent"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i32>().map_err(|_| self.fail("exponent out of range"))
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SIError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.fail(format!("expected '{expected}'")))
        }
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '\u{00B5}' | '\u{00B0}' | '\u{2126}' | '\u{210F}' | '%' | '\u{2030}' | '\u{2031}')
}

fn is_symbol_continue(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit() || c == '_'
}

/// `dimensionality_from_expression`: parses a unit expression and returns
/// just its dimensionality, discarding scale information.
pub fn dimensionality_from_expression(
    registry: &UnitRegistry,
    input: &str,
) -> Result<crate::dimensionality::DimensionalityRef, SIError> {
    let (unit, _) = unit_from_expression(registry, input)?;
    Ok(unit.dimensionality())
}

/// Re-validates that `s` is a syntactically valid unit expression and
/// returns its library key without requiring every symbol to resolve.
pub fn library_key_of_expression(s: &str) -> Result<String, SIError> {
    library_key(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_registry::UnitRegistry;

    #[test]
    fn parses_simple_symbol() {
        let registry = UnitRegistry::new();
        let (unit, mult) = unit_from_expression(&registry, "m").unwrap();
        assert_eq!(unit.symbol(), "m");
        assert_eq!(mult, 1.0);
    }

    #[test]
    fn parses_compound_expression() {
        let registry = UnitRegistry::new();
        let (unit, _) = unit_from_expression(&registry, "kg\u{2022}m/s^2").unwrap();
        assert_eq!(unit.symbol(), "N");
    }

    #[test]
    fn unknown_symbol_fails() {
        let registry = UnitRegistry::new();
        assert!(matches!(unit_from_expression(&registry, "frobnicate"), Err(SIError::UnknownSymbol(_))));
    }

    #[test]
    fn negative_exponent_parses() {
        let registry = UnitRegistry::new();
        let (unit, _) = unit_from_expression(&registry, "m^-1").unwrap();
        assert_eq!(unit.dimensionality().signed_exponent(0), -1);
    }

    #[test]
    fn bare_one_is_dimensionless() {
        let registry = UnitRegistry::new();
        let (unit, _) = unit_from_expression(&registry, "1").unwrap();
        assert!(unit.dimensionality().is_dimensionless());
    }
}

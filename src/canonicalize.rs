//! Unit symbol canonicalization (C5): `library_key` maps any acceptable
//! user-written unit expression onto the unique string under which its Unit
//! is interned.

use std::collections::BTreeMap;

use crate::error::SIError;

/// Maps a user-written unit expression onto its canonical library key.
///
/// Two expressions denote the same Unit iff `library_key` produces the same
/// string for both. This function is purely syntactic: it does not consult
/// the unit registry, and it never cancels a symbol that appears on both
/// sides of a fraction (`m/m` keeps its form; cancellation belongs to the
/// reducing variants of the unit algebra).
pub fn library_key(input: &str) -> Result<String, SIError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok("1".to_string());
    }

    let normalized = normalize_operators_and_confusables(trimmed);
    let mut parser = KeyParser::new(&normalized);
    let terms = parser.parse_expr()?;
    parser.expect_end()?;

    Ok(render(terms))
}

/// Parses a symbol^exponent product/quotient expression into its net,
/// consolidated (symbol, exponent) terms without rendering a final string.
/// Unlike `library_key`'s own term consolidation, a symbol's numerator and
/// denominator occurrences here merge into one net exponent — correct for
/// `Dimensionality::from_symbol`, which walks the same grammar over
/// base-dimension letters to recover a net signed exponent per dimension,
/// but not for `library_key`'s no-cancellation canonicalization.
pub(crate) fn parse_signed_terms(input: &str) -> Result<Vec<(String, i64)>, SIError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let normalized = normalize_operators_and_confusables(trimmed);
    let mut parser = KeyParser::new(&normalized);
    let terms = parser.parse_expr()?;
    parser.expect_end()?;

    let mut consolidated: BTreeMap<String, i64> = BTreeMap::new();
    for t in terms {
        *consolidated.entry(t.symbol).or_insert(0) += t.exponent;
    }
    consolidated.retain(|_, exp| *exp != 0);
    Ok(consolidated.into_iter().collect())
}

/// Rules 2–3: operator aliasing and Unicode confusable normalization.
/// Exposed to the unit and scalar expression parsers, which apply the same
/// early normalization before their own recursive-descent parse.
pub(crate) fn normalize_for_parsing(s: &str) -> String {
    normalize_operators_and_confusables(s)
}

fn normalize_operators_and_confusables(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let mapped = match c {
            '*' | '\u{00D7}' | '\u{00B7}' | '\u{22C5}' | '\u{2219}' => '\u{2022}',
            '\u{00F7}' | '\u{2215}' | '\u{2044}' => '/',
            '\u{03BC}' => '\u{00B5}',
            other => other,
        };
        out.push(mapped);
    }
    out
}

/// One (symbol, signed integer exponent) term, pre-consolidation.
struct RawTerm {
    symbol: String,
    exponent: i64,
}

struct KeyParser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> KeyParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, source }
    }

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
        SIError::ParseError {
            position: self.pos,
            message: message.into(),
            fragment: self.source.to_string(),
        }
    }

    fn expect_end(&mut self) -> Result<(), SIError> {
        self.skip_ws();
        if self.pos != self.chars.len() {
            return Err(self.fail("unexpected trailing input"));
        }
        Ok(())
    }

    /// `expr := term { ("/"|"\u{2022}") term }`, returning the flattened,
    /// signed term list (division negates every exponent in its term).
    fn parse_expr(&mut self) -> Result<Vec<RawTerm>, SIError> {
        let mut terms = self.parse_term(1)?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('\u{2022}') => {
                    self.bump();
                    terms.extend(self.parse_term(1)?);
                }
                Some('/') => {
                    self.bump();
                    terms.extend(self.parse_term(-1)?);
                }
                _ => break,
            }
        }
        Ok(terms)
    }

    /// `term := factor ["^" integer]`, each exponent scaled by `sign`.
    fn parse_term(&mut self, sign: i64) -> Result<Vec<RawTerm>, SIError> {
        self.skip_ws();
        let mut terms = self.parse_factor(sign)?;
        self.skip_ws();
        if self.peek() == Some('^') {
            self.bump();
            let power = self.parse_power()?;
            for t in &mut terms {
                t.exponent *= power;
            }
        }
        Ok(terms)
    }

    /// Parses the integer following `^`, accepting both `n` and `(n)`.
    /// `library_key` only ever sees integer exponents: fractional-power
    /// expressions (`^(1/n)`, roots) are the unit-expression parser's
    /// concern and are resolved against the registry before canonicalizing.
    fn parse_power(&mut self) -> Result<i64, SIError> {
        self.skip_ws();
        if self.peek() == Some('(') {
            self.bump();
            let n = self.parse_integer()?;
            self.skip_ws();
            self.expect_char(')')?;
            return Ok(n);
        }
        self.parse_integer()
    }

    fn parse_integer(&mut self) -> Result<i64, SIError> {
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
        text.parse::<i64>().map_err(|_| self.fail("exponent out of range"))
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SIError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.fail(format!("expected '{expected}'")))
        }
    }

    /// `factor := symbol | "(" expr ")" | "1"`
    fn parse_factor(&mut self, sign: i64) -> Result<Vec<RawTerm>, SIError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.skip_ws();
                self.expect_char(')')?;
                Ok(inner.into_iter().map(|t| RawTerm { symbol: t.symbol, exponent: t.exponent * sign }).collect())
            }
            Some('1') => {
                let save = self.pos;
                self.bump();
                if matches!(self.peek(), Some(c) if is_symbol_continue(c)) {
                    self.pos = save;
                    self.parse_symbol(sign)
                } else {
                    Ok(Vec::new())
                }
            }
            Some(c) if is_symbol_start(c) => self.parse_symbol(sign),
            _ => Err(self.fail("expected a unit symbol, '(', or '1'")),
        }
    }

    fn parse_symbol(&mut self, sign: i64) -> Result<Vec<RawTerm>, SIError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_symbol_continue(c)) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.fail("expected a unit symbol"));
        }
        let symbol: String = self.chars[start..self.pos].iter().collect();
        Ok(vec![RawTerm { symbol, exponent: sign }])
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '\u{00B5}' | '\u{00B0}' | '\u{2126}' | '\u{210F}' | '%' | '\u{2030}' | '\u{2031}')
}

fn is_symbol_continue(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit() || c == '_'
}

/// Rules 4, 6–9: drop redundant parens (handled implicitly by the parser
/// flattening them), consolidate repeated symbols, drop zero-exponent terms,
/// and emit in the required numerator/denominator order.
fn render(terms: Vec<RawTerm>) -> String {
    // Numerator and denominator are consolidated independently: a symbol
    // that appears on both sides (`m/m`) never cancels here, only within
    // one side (`m*m` -> `m^2`). Cancellation across the fraction line is
    // the unit algebra's `reduce`, not canonicalization.
    let mut num_totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut den_totals: BTreeMap<String, i64> = BTreeMap::new();
    for t in terms {
        if t.exponent > 0 {
            *num_totals.entry(t.symbol).or_insert(0) += t.exponent;
        } else if t.exponent < 0 {
            *den_totals.entry(t.symbol).or_insert(0) += -t.exponent;
        }
    }
    num_totals.retain(|_, exp| *exp != 0);
    den_totals.retain(|_, exp| *exp != 0);

    if num_totals.is_empty() && den_totals.is_empty() {
        return "1".to_string();
    }

    let mut numerator: Vec<(String, i64)> = num_totals.into_iter().collect();
    let mut denominator: Vec<(String, i64)> = den_totals.into_iter().collect();

    numerator.sort_by(|a, b| a.0.cmp(&b.0));
    denominator.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let num_str = numerator.iter().map(|(s, e)| term_string(s, *e)).collect::<Vec<_>>().join("\u{2022}");
    let den_str = denominator.iter().map(|(s, e)| term_string(s, *e)).collect::<Vec<_>>().join("\u{2022}");

    match (num_str.is_empty(), den_str.is_empty()) {
        (true, true) => "1".to_string(),
        (false, true) => num_str,
        (true, false) => format!("1/{den_str}"),
        (false, false) if denominator.len() > 1 => format!("{num_str}/({den_str})"),
        (false, false) => format!("{num_str}/{den_str}"),
    }
}

fn term_string(symbol: &str, exponent: i64) -> String {
    if exponent == 1 {
        symbol.to_string()
    } else {
        format!("{symbol}^{exponent}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_one() {
        assert_eq!(library_key("   ").unwrap(), "1");
    }

    #[test]
    fn operator_aliases_normalize() {
        assert_eq!(library_key("kg*m/s^2").unwrap(), library_key("kg\u{00B7}m/s^2").unwrap());
    }

    #[test]
    fn mu_confusable_normalizes() {
        assert_eq!(library_key("\u{03BC}m").unwrap(), "\u{00B5}m");
    }

    #[test]
    fn trivial_power_and_parens_strip() {
        assert_eq!(library_key("m^(1)").unwrap(), "m");
        assert_eq!(library_key("(m)").unwrap(), "m");
    }

    #[test]
    fn repeated_symbols_consolidate() {
        assert_eq!(library_key("m\u{2022}m").unwrap(), "m^2");
    }

    #[test]
    fn same_symbol_across_fraction_does_not_cancel() {
        assert_eq!(library_key("m/m").unwrap(), "m/m");
        assert_eq!(library_key("kg\u{2022}m/kg").unwrap(), "kg\u{2022}m/kg");
    }

    #[test]
    fn numerator_alphabetical_denominator_by_magnitude_then_alphabetical() {
        assert_eq!(library_key("s\u{2022}kg/m").unwrap(), "kg\u{2022}s/m");
        assert_eq!(library_key("1/(s^2\u{2022}m)").unwrap(), "1/(m\u{2022}s^2)");
    }

    #[test]
    fn denominator_parenthesized_only_when_multi_term() {
        assert_eq!(library_key("kg/m").unwrap(), "kg/m");
        assert_eq!(library_key("kg/(m\u{2022}s)").unwrap(), "kg/(m\u{2022}s)");
    }

    #[test]
    fn reordered_inputs_produce_equal_keys() {
        let a = library_key("m\u{2022}kg/s^2").unwrap();
        let b = library_key("kg\u{2022}m/s^2").unwrap();
        assert_eq!(a, b);
    }
}

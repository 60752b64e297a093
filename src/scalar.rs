//! Scalar (C8): a numeric value of one of four representations (real or
//! complex, 32- or 64-bit) carrying a `Unit`.

use num_complex::Complex;

use crate::error::SIError;
use crate::unit::UnitRef;
use crate::unit_algebra;
use crate::unit_parser;
use crate::unit_registry::UnitRegistry;

/// The four numeric representations a Scalar's value may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Real32(f32),
    Real64(f64),
    Complex64(Complex<f32>),
    Complex128(Complex<f64>),
}

impl Numeric {
    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(self, Numeric::Complex64(_) | Numeric::Complex128(_))
    }

    #[must_use]
    pub fn as_c128(self) -> Complex<f64> {
        match self {
            Numeric::Real32(v) => Complex::new(f64::from(v), 0.0),
            Numeric::Real64(v) => Complex::new(v, 0.0),
            Numeric::Complex64(c) => Complex::new(f64::from(c.re), f64::from(c.im)),
            Numeric::Complex128(c) => c,
        }
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Real32(v) => f64::from(v),
            Numeric::Real64(v) => v,
            Numeric::Complex64(c) => f64::from(c.re),
            Numeric::Complex128(c) => c.re,
        }
    }

    /// `NumericKind::best(a, b)` (spec §4.6): any complex operand forces a
    /// complex result; precision is the max of the two operand precisions.
    #[must_use]
    pub fn best_kind(a: Numeric, b: Numeric) -> NumericKind {
        let complex = a.is_complex() || b.is_complex();
        let wide = matches!(a, Numeric::Real64(_) | Numeric::Complex128(_)) || matches!(b, Numeric::Real64(_) | Numeric::Complex128(_));
        match (complex, wide) {
            (true, true) => NumericKind::Complex128,
            (true, false) => NumericKind::Complex64,
            (false, true) => NumericKind::Real64,
            (false, false) => NumericKind::Real32,
        }
    }

    #[must_use]
    pub fn cast_to(self, kind: NumericKind) -> Numeric {
        match kind {
            NumericKind::Real32 => Numeric::Real32(self.as_f64() as f32),
            NumericKind::Real64 => Numeric::Real64(self.as_f64()),
            NumericKind::Complex64 => {
                let c = self.as_c128();
                Numeric::Complex64(Complex::new(c.re as f32, c.im as f32))
            }
            NumericKind::Complex128 => Numeric::Complex128(self.as_c128()),
        }
    }
}

/// The tag of a `Numeric` without its payload, used to drive promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Real32,
    Real64,
    Complex64,
    Complex128,
}

/// Result of `Scalar::compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    UnequalDimensionalities,
    NoSingleValue,
}

/// A physical quantity: a numeric value attached to a `Unit`.
#[derive(Debug, Clone)]
pub struct Scalar {
    unit: UnitRef,
    value: Numeric,
}

impl Scalar {
    #[must_use]
    pub fn new(value: Numeric, unit: UnitRef) -> Self {
        Self { unit, value }
    }

    #[must_use]
    pub fn unit(&self) -> UnitRef {
        self.unit
    }

    #[must_use]
    pub fn value(&self) -> Numeric {
        self.value
    }

    /// Constructs a dimensionless Scalar attached to the underived unit.
    #[must_use]
    pub fn dimensionless(value: f64) -> Self {
        let registry = UnitRegistry::new();
        Self::new(Numeric::Real64(value), registry.dimensionless_unit())
    }

    #[must_use]
    pub fn from_seconds(value: f64) -> Self {
        let registry = UnitRegistry::new();
        Self::new(Numeric::Real64(value), registry.unit_with_symbol("s").expect("second is seeded"))
    }

    #[must_use]
    pub fn from_grams_per_mole(value: f64) -> Self {
        let registry = UnitRegistry::new();
        let gram = registry.unit_with_symbol("g").expect("gram is seeded");
        let mole = registry.unit_with_symbol("mol").expect("mole is seeded");
        let (unit, mult) = unit_algebra::divide(&registry, gram, mole);
        Self::new(Numeric::Real64(value * mult), unit)
    }

    /// Numeric value expressed in the coherent SI unit of this scalar's
    /// dimensionality, discarding any imaginary part.
    #[must_use]
    pub fn to_f64_in_coherent_si(&self) -> f64 {
        self.value.as_f64() * self.unit.scale_to_coherent_si()
    }

    /// `set_numeric_type`: widens or narrows the stored value in place.
    pub fn set_numeric_type(&mut self, kind: NumericKind) {
        self.value = self.value.cast_to(kind);
    }

    /// `convert_to_unit`: fails unless `target` shares reduced
    /// dimensionality with the current unit.
    pub fn convert_to_unit(&self, target: UnitRef) -> Result<Scalar, SIError> {
        if !std::ptr::eq(self.unit.dimensionality().reduced(), target.dimensionality().reduced()) {
            return Err(SIError::IncompatibleDimensionalities {
                lhs: self.unit.symbol().to_string(),
                rhs: target.symbol().to_string(),
            });
        }
        let ratio = self.unit.scale_to_coherent_si() / target.scale_to_coherent_si();
        let value = scale_numeric(self.value, ratio);
        Ok(Scalar::new(value, target))
    }

    pub fn convert_to_coherent_unit(&self, registry: &UnitRegistry) -> Result<Scalar, SIError> {
        let coherent = registry.coherent_unit_for_dimensionality(self.unit.dimensionality());
        self.convert_to_unit(coherent)
    }

    /// `convert_to_unit_with_string`: parses `target` as a unit expression
    /// and converts into it, as `convert_to_unit` would.
    pub fn convert_to_unit_with_string(&self, registry: &UnitRegistry, target: &str) -> Result<Scalar, SIError> {
        let (unit, mult) = unit_parser::unit_from_expression(registry, target)?;
        let converted = self.convert_to_unit(unit)?;
        Ok(Scalar::new(scale_numeric(converted.value, 1.0 / mult), unit))
    }

    /// `reduce_unit`: replaces the unit with the reduced-dimensionality
    /// equivalent, scaling the value by the ratio of old and new scales.
    pub fn reduce_unit(&self, registry: &UnitRegistry) -> Scalar {
        let reduced = unit_algebra::reduce(registry, self.unit);
        let ratio = self.unit.scale_to_coherent_si() / reduced.scale_to_coherent_si();
        Scalar::new(scale_numeric(self.value, ratio), reduced)
    }

    fn require_same_reduced_dimensionality(&self, other: &Scalar) -> Result<(), SIError> {
        if std::ptr::eq(self.unit.dimensionality().reduced(), other.unit.dimensionality().reduced()) {
            Ok(())
        } else {
            Err(SIError::IncompatibleDimensionalities {
                lhs: self.unit.symbol().to_string(),
                rhs: other.unit.symbol().to_string(),
            })
        }
    }

    pub fn add(&self, other: &Scalar) -> Result<Scalar, SIError> {
        self.require_same_reduced_dimensionality(other)?;
        let converted = other.convert_to_unit(self.unit)?;
        let kind = Numeric::best_kind(self.value, converted.value);
        let value = numeric_binop(self.value.cast_to(kind), converted.value.cast_to(kind), |a, b| a + b);
        Ok(Scalar::new(value, self.unit))
    }

    pub fn subtract(&self, other: &Scalar) -> Result<Scalar, SIError> {
        self.require_same_reduced_dimensionality(other)?;
        let converted = other.convert_to_unit(self.unit)?;
        let kind = Numeric::best_kind(self.value, converted.value);
        let value = numeric_binop(self.value.cast_to(kind), converted.value.cast_to(kind), |a, b| a - b);
        Ok(Scalar::new(value, self.unit))
    }

    pub fn multiply_without_reducing(&self, registry: &UnitRegistry, other: &Scalar) -> Scalar {
        let (unit, mult) = unit_algebra::multiply_without_reducing(registry, self.unit, other.unit);
        let kind = Numeric::best_kind(self.value, other.value);
        let raw = numeric_binop(self.value.cast_to(kind), other.value.cast_to(kind), multiply_with_infinity_policy);
        Scalar::new(scale_numeric(raw, mult), unit)
    }

    pub fn multiply(&self, registry: &UnitRegistry, other: &Scalar) -> Scalar {
        let (unit, mult) = unit_algebra::multiply(registry, self.unit, other.unit);
        let kind = Numeric::best_kind(self.value, other.value);
        let raw = numeric_binop(self.value.cast_to(kind), other.value.cast_to(kind), multiply_with_infinity_policy);
        Scalar::new(scale_numeric(raw, mult), unit)
    }

    pub fn divide_without_reducing(&self, registry: &UnitRegistry, other: &Scalar) -> Scalar {
        let (unit, mult) = unit_algebra::divide_without_reducing(registry, self.unit, other.unit);
        let kind = Numeric::best_kind(self.value, other.value);
        let raw = numeric_binop(self.value.cast_to(kind), other.value.cast_to(kind), divide_with_infinity_policy);
        Scalar::new(scale_numeric(raw, mult), unit)
    }

    pub fn divide(&self, registry: &UnitRegistry, other: &Scalar) -> Scalar {
        let (unit, mult) = unit_algebra::divide(registry, self.unit, other.unit);
        let kind = Numeric::best_kind(self.value, other.value);
        let raw = numeric_binop(self.value.cast_to(kind), other.value.cast_to(kind), divide_with_infinity_policy);
        Scalar::new(scale_numeric(raw, mult), unit)
    }

    pub fn raise_to_power_without_reducing(&self, registry: &UnitRegistry, n: i32) -> Scalar {
        let (unit, mult) = unit_algebra::power_without_reducing(registry, self.unit, n);
        let value = scale_numeric(numeric_powi(self.value, n), mult);
        Scalar::new(value, unit)
    }

    pub fn raise_to_power(&self, registry: &UnitRegistry, n: i32) -> Scalar {
        let (unit, mult) = unit_algebra::power(registry, self.unit, n);
        let value = scale_numeric(numeric_powi(self.value, n), mult);
        Scalar::new(value, unit)
    }

    pub fn nth_root(&self, registry: &UnitRegistry, n: i32) -> Result<Scalar, SIError> {
        let (unit, mult) = unit_algebra::nth_root(registry, self.unit, n)?;
        let root = self.value.as_c128().powf(1.0 / f64::from(n));
        let value = scale_numeric(Numeric::Complex128(root), mult);
        let value = if self.value.is_complex() { value } else { value.cast_to(Numeric::best_kind(self.value, self.value)) };
        Ok(Scalar::new(value, unit))
    }

    #[must_use]
    pub fn absolute_value(&self) -> Scalar {
        let magnitude = self.value.as_c128().norm();
        Scalar::new(Numeric::Real64(magnitude), self.unit)
    }

    #[must_use]
    pub fn conjugate(&self) -> Scalar {
        let value = match self.value {
            Numeric::Complex64(c) => Numeric::Complex64(c.conj()),
            Numeric::Complex128(c) => Numeric::Complex128(c.conj()),
            real => real,
        };
        Scalar::new(value, self.unit)
    }

    /// `take_complex_part`: `kind` is one of `real`/`imaginary`/`magnitude`/
    /// `argument`. The first three narrow to a real numeric type and keep
    /// the unit; `argument` narrows to real and switches to radians.
    pub fn take_complex_part(&self, registry: &UnitRegistry, kind: &str) -> Result<Scalar, SIError> {
        let c = self.value.as_c128();
        match kind {
            "real" => Ok(Scalar::new(Numeric::Real64(c.re), self.unit)),
            "imaginary" => Ok(Scalar::new(Numeric::Real64(c.im), self.unit)),
            "magnitude" => Ok(Scalar::new(Numeric::Real64(c.norm()), self.unit)),
            "argument" => {
                let radian = registry.unit_with_symbol("rad").unwrap_or_else(|| registry.dimensionless_unit());
                Ok(Scalar::new(Numeric::Real64(c.arg()), radian))
            }
            other => Err(SIError::InvalidArgument(format!("unknown complex part: {other}"))),
        }
    }

    /// `gamma_function_without_reducing`: argument must be dimensionless or
    /// a real nonnegative integer.
    pub fn gamma_function_without_reducing(&self, registry: &UnitRegistry) -> Result<Scalar, SIError> {
        if !self.unit.dimensionality().is_dimensionless() {
            return Err(SIError::Domain("gamma function requires a dimensionless argument".into()));
        }
        let x = self.value.as_f64();
        if x < 0.0 && x.fract() == 0.0 {
            return Err(SIError::Domain("gamma function is undefined at nonpositive integers".into()));
        }
        Ok(Scalar::new(Numeric::Real64(gamma(x)), registry.dimensionless_unit()))
    }

    /// Factorial, extended via the gamma function: `n! = gamma(n + 1)`.
    /// Domain restriction matches `gamma_function_without_reducing`.
    pub fn factorial(&self, registry: &UnitRegistry) -> Result<Scalar, SIError> {
        let shifted = Scalar::new(Numeric::Real64(self.value.as_f64() + 1.0), self.unit);
        shifted.gamma_function_without_reducing(registry)
    }

    /// `compare`: requires same reduced dimensionality; converts `other`
    /// into `self`'s unit, then compares real (and, for complex, imaginary)
    /// parts.
    pub fn compare(&self, other: &Scalar) -> Comparison {
        if !std::ptr::eq(self.unit.dimensionality().reduced(), other.unit.dimensionality().reduced()) {
            return Comparison::UnequalDimensionalities;
        }
        let Ok(converted) = other.convert_to_unit(self.unit) else {
            return Comparison::UnequalDimensionalities;
        };
        let a = self.value.as_c128();
        let b = converted.value.as_c128();
        let mixed_complex = self.value.is_complex() != converted.value.is_complex();
        if mixed_complex && (a.im != 0.0 || b.im != 0.0) {
            return Comparison::NoSingleValue;
        }
        if (a.im - b.im).abs() > f64::EPSILON {
            return Comparison::NoSingleValue;
        }
        if a.re < b.re {
            Comparison::Less
        } else if a.re > b.re {
            Comparison::Greater
        } else {
            Comparison::Equal
        }
    }

    /// Loose comparison within a relative tolerance.
    #[must_use]
    pub fn compare_loose(&self, other: &Scalar, relative_tolerance: f64) -> Comparison {
        if !std::ptr::eq(self.unit.dimensionality().reduced(), other.unit.dimensionality().reduced()) {
            return Comparison::UnequalDimensionalities;
        }
        let Ok(converted) = other.convert_to_unit(self.unit) else {
            return Comparison::UnequalDimensionalities;
        };
        let a = self.value.as_f64();
        let b = converted.value.as_f64();
        let tol = relative_tolerance * a.abs().max(b.abs()).max(1.0);
        if (a - b).abs() <= tol {
            Comparison::Equal
        } else if a < b {
            Comparison::Less
        } else {
            Comparison::Greater
        }
    }

    /// `compare_reduced`: reduces both units before comparing.
    pub fn compare_reduced(&self, registry: &UnitRegistry, other: &Scalar) -> Comparison {
        self.reduce_unit(registry).compare(&other.reduce_unit(registry))
    }

    /// "Best for quantity": among `candidates` (same dimensionality),
    /// returns the converted Scalar whose magnitude is closest to the
    /// middle of `[1, 1000)` on a log scale, or `self` unchanged if none
    /// qualify.
    #[must_use]
    pub fn best_conversion_for_quantity(&self, candidates: &[UnitRef]) -> Scalar {
        let mut best: Option<(Scalar, f64)> = None;
        for &unit in candidates {
            let Ok(converted) = self.convert_to_unit(unit) else { continue };
            let magnitude = converted.value.as_f64().abs();
            if !(1.0..1000.0).contains(&magnitude) {
                continue;
            }
            let score = magnitude.log10().abs();
            let better = match &best {
                Some((_, best_score)) => score < *best_score,
                None => true,
            };
            if better {
                best = Some((converted, score));
            }
        }
        best.map_or_else(|| self.clone(), |(scalar, _)| scalar)
    }
}

fn scale_numeric(value: Numeric, factor: f64) -> Numeric {
    match value {
        Numeric::Real32(v) => Numeric::Real32(v * factor as f32),
        Numeric::Real64(v) => Numeric::Real64(v * factor),
        Numeric::Complex64(c) => Numeric::Complex64(c * factor as f32),
        Numeric::Complex128(c) => Numeric::Complex128(c * factor),
    }
}

fn numeric_binop(a: Numeric, b: Numeric, op: impl Fn(Complex<f64>, Complex<f64>) -> Complex<f64>) -> Numeric {
    match (a, b) {
        (Numeric::Real32(x), Numeric::Real32(y)) => Numeric::Real32(op(Complex::new(f64::from(x), 0.0), Complex::new(f64::from(y), 0.0)).re as f32),
        (Numeric::Real64(x), Numeric::Real64(y)) => Numeric::Real64(op(Complex::new(x, 0.0), Complex::new(y, 0.0)).re),
        (Numeric::Complex64(x), Numeric::Complex64(y)) => {
            let r = op(Complex::new(f64::from(x.re), f64::from(x.im)), Complex::new(f64::from(y.re), f64::from(y.im)));
            Numeric::Complex64(Complex::new(r.re as f32, r.im as f32))
        }
        (x, y) => Numeric::Complex128(op(x.as_c128(), y.as_c128())),
    }
}

/// Division infinity/zero policy (spec §4.6): `x/0 -> signed infinity`,
/// `x/inf -> 0`, `0/0` and `inf/inf` remain NaN (undefined by the policy).
fn divide_with_infinity_policy(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    if b.re == 0.0 && b.im == 0.0 && !(a.re == 0.0 && a.im == 0.0) {
        let sign = if a.re != 0.0 { a.re.signum() } else { a.im.signum() };
        return Complex::new(sign * f64::INFINITY, 0.0);
    }
    a / b
}

/// Multiplication infinity/zero policy (spec §4.6, §8 boundary: `0 × ∞`
/// produces ∞ rather than `NaN`): when one operand is zero and the
/// other infinite, the result is signed infinity; otherwise ordinary complex
/// multiplication applies.
fn multiply_with_infinity_policy(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    let a_zero = a.re == 0.0 && a.im == 0.0;
    let b_zero = b.re == 0.0 && b.im == 0.0;
    let a_inf = a.re.is_infinite() || a.im.is_infinite();
    let b_inf = b.re.is_infinite() || b.im.is_infinite();
    if a_zero && b_inf {
        let inf_sign = if b.re.is_infinite() { b.re.signum() } else { b.im.signum() };
        return Complex::new(inf_sign * a.re.signum() * f64::INFINITY, 0.0);
    }
    if b_zero && a_inf {
        let inf_sign = if a.re.is_infinite() { a.re.signum() } else { a.im.signum() };
        return Complex::new(inf_sign * b.re.signum() * f64::INFINITY, 0.0);
    }
    a * b
}

fn numeric_powi(value: Numeric, n: i32) -> Numeric {
    match value {
        Numeric::Real32(v) => Numeric::Real32(v.powi(n)),
        Numeric::Real64(v) => Numeric::Real64(v.powi(n)),
        Numeric::Complex64(c) => Numeric::Complex64(c.powi(n)),
        Numeric::Complex128(c) => Numeric::Complex128(c.powi(n)),
    }
}

/// Lanczos approximation, sufficient precision for the domain this crate
/// exposes gamma through (real, nonnegative-or-dimensionless arguments).
fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut a = COEFFICIENTS[0];
        let t = x + G + 0.5;
        for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
            a += c / (x + i as f64);
        }
        (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_parser::unit_from_expression;

    #[test]
    fn numeric_promotion_prefers_complex_and_widest_precision() {
        let a = Numeric::Real32(1.0);
        let b = Numeric::Complex128(Complex::new(1.0, 0.0));
        assert_eq!(Numeric::best_kind(a, b), NumericKind::Complex128);
        assert_eq!(Numeric::best_kind(Numeric::Real64(1.0), Numeric::Real64(2.0)), NumericKind::Real64);
    }

    #[test]
    fn conversion_round_trips_within_tolerance() {
        let registry = UnitRegistry::new();
        let (metre, _) = unit_from_expression(&registry, "m").unwrap();
        let (km, _) = unit_from_expression(&registry, "km").unwrap();
        let original = Scalar::new(Numeric::Real64(5.0), metre);
        let converted = original.convert_to_unit(km).unwrap();
        let back = converted.convert_to_unit(metre).unwrap();
        assert!((back.value().as_f64() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn incompatible_dimensionalities_fail_addition() {
        let registry = UnitRegistry::new();
        let (metre, _) = unit_from_expression(&registry, "m").unwrap();
        let (second, _) = unit_from_expression(&registry, "s").unwrap();
        let a = Scalar::new(Numeric::Real64(1.0), metre);
        let b = Scalar::new(Numeric::Real64(1.0), second);
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn division_by_zero_yields_signed_infinity() {
        let registry = UnitRegistry::new();
        let (metre, _) = unit_from_expression(&registry, "m").unwrap();
        let a = Scalar::new(Numeric::Real64(5.0), metre);
        let zero = Scalar::new(Numeric::Real64(0.0), registry.dimensionless_unit());
        let result = a.divide(&registry, &zero);
        assert!(result.value().as_f64().is_infinite());
    }

    #[test]
    fn multiply_by_infinity_with_zero_yields_signed_infinity() {
        let registry = UnitRegistry::new();
        let (metre, _) = unit_from_expression(&registry, "m").unwrap();
        let zero = Scalar::new(Numeric::Real64(0.0), registry.dimensionless_unit());
        let one = Scalar::new(Numeric::Real64(1.0), metre);
        let inf = one.divide(&registry, &zero);

        let result = zero.multiply(&registry, &inf);
        assert!(result.value().as_f64().is_infinite());
        assert!(result.value().as_f64() > 0.0);

        let neg_zero = Scalar::new(Numeric::Real64(-0.0), registry.dimensionless_unit());
        let flipped = neg_zero.multiply(&registry, &inf);
        assert!(flipped.value().as_f64().is_infinite());
        assert!(flipped.value().as_f64() < 0.0);
    }

    #[test]
    fn convert_to_unit_with_string_matches_convert_to_unit() {
        let registry = UnitRegistry::new();
        let (metre, _) = unit_from_expression(&registry, "m").unwrap();
        let original = Scalar::new(Numeric::Real64(12.0), metre);

        let by_unit = original.convert_to_unit(registry.unit_with_symbol("km").unwrap()).unwrap();
        let by_string = original.convert_to_unit_with_string(&registry, "km").unwrap();

        assert!((by_unit.value().as_f64() - by_string.value().as_f64()).abs() < 1e-12);
    }

    #[test]
    fn gamma_of_positive_integer_matches_factorial() {
        let registry = UnitRegistry::new();
        let five = Scalar::dimensionless(5.0);
        let result = five.gamma_function_without_reducing(&registry).unwrap();
        assert!((result.value().as_f64() - 24.0).abs() < 1e-6);
    }
}

//! Seven-base-dimension algebra (length, mass, time, current, temperature,
//! amount, luminous intensity) and the named-quantity registry built on top
//! of it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use crate::error::SIError;

/// Index of each base dimension within the `num_exp`/`den_exp` arrays.
pub const BASE_SYMBOLS: [&str; 7] = ["L", "M", "T", "I", "\u{0398}", "N", "J"];

/// A rational product of the seven SI base dimensions.
///
/// `num_exp[i]` and `den_exp[i]` are both non-negative; the signed exponent
/// of base `i` is `num_exp[i] - den_exp[i]`. Keeping both sides distinguishes
/// the unreduced form produced by raw multiplication (which may have a
/// nonzero entry on both sides of the same index) from the reduced form
/// (at most one side nonzero per index).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimensionality {
    num_exp: [u8; 7],
    den_exp: [u8; 7],
    symbol: String,
}

/// Process-lifetime handle to an interned `Dimensionality`.
pub type DimensionalityRef = &'static Dimensionality;

impl Dimensionality {
    fn build(num_exp: [u8; 7], den_exp: [u8; 7]) -> Self {
        let symbol = Self::build_symbol(&num_exp, &den_exp);
        Self { num_exp, den_exp, symbol }
    }

    /// Signed exponent of base `i` (0 = L, 1 = M, 2 = T, 3 = I, 4 = Theta,
    /// 5 = N, 6 = J).
    #[must_use]
    pub fn signed_exponent(&self, i: usize) -> i32 {
        i32::from(self.num_exp[i]) - i32::from(self.den_exp[i])
    }

    #[must_use]
    pub fn num_exp(&self) -> [u8; 7] {
        self.num_exp
    }

    #[must_use]
    pub fn den_exp(&self) -> [u8; 7] {
        self.den_exp
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.num_exp == [0; 7] && self.den_exp == [0; 7]
    }

    /// Whether this instance is already in reduced form: at most one of
    /// `num_exp[i]`/`den_exp[i]` nonzero, for every `i`.
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        (0..7).all(|i| self.num_exp[i] == 0 || self.den_exp[i] == 0)
    }

    /// Returns the reduced form (signed exponents folded onto one side).
    #[must_use]
    pub fn reduced(&self) -> DimensionalityRef {
        let mut num = [0u8; 7];
        let mut den = [0u8; 7];
        for i in 0..7 {
            let signed = self.signed_exponent(i);
            if signed > 0 {
                num[i] = signed as u8;
            } else if signed < 0 {
                den[i] = (-signed) as u8;
            }
        }
        intern(num, den)
    }

    /// Product of two dimensionalities without reducing exponents that
    /// appear on opposite sides.
    #[must_use]
    pub fn multiply_without_reducing(a: DimensionalityRef, b: DimensionalityRef) -> DimensionalityRef {
        let mut num = [0u8; 7];
        let mut den = [0u8; 7];
        for i in 0..7 {
            num[i] = a.num_exp[i].saturating_add(b.num_exp[i]);
            den[i] = a.den_exp[i].saturating_add(b.den_exp[i]);
        }
        intern(num, den)
    }

    #[must_use]
    pub fn multiply(a: DimensionalityRef, b: DimensionalityRef) -> DimensionalityRef {
        Self::multiply_without_reducing(a, b).reduced()
    }

    #[must_use]
    pub fn divide_without_reducing(a: DimensionalityRef, b: DimensionalityRef) -> DimensionalityRef {
        let mut num = [0u8; 7];
        let mut den = [0u8; 7];
        for i in 0..7 {
            num[i] = a.num_exp[i].saturating_add(b.den_exp[i]);
            den[i] = a.den_exp[i].saturating_add(b.num_exp[i]);
        }
        intern(num, den)
    }

    #[must_use]
    pub fn divide(a: DimensionalityRef, b: DimensionalityRef) -> DimensionalityRef {
        Self::divide_without_reducing(a, b).reduced()
    }

    /// Raises to an integer power without reducing; `n` may be negative.
    pub fn power_without_reducing(a: DimensionalityRef, n: i32) -> DimensionalityRef {
        let mut num = [0u8; 7];
        let mut den = [0u8; 7];
        for i in 0..7 {
            let signed = a.signed_exponent(i) * n;
            if signed >= 0 {
                num[i] = signed as u8;
            } else {
                den[i] = (-signed) as u8;
            }
        }
        intern(num, den)
    }

    #[must_use]
    pub fn power(a: DimensionalityRef, n: i32) -> DimensionalityRef {
        Self::power_without_reducing(a, n).reduced()
    }

    /// Takes the `n`th root. Fails with `NonIntegerPower` unless every
    /// signed exponent is evenly divisible by `n`.
    /// Divisibility is checked against the reduced (signed) exponent, but
    /// the division itself is applied to `num_exp`/`den_exp` independently
    /// so an unreduced operand's num/den structure survives the root.
    pub fn nth_root(a: DimensionalityRef, n: i32) -> Result<DimensionalityRef, SIError> {
        if n == 0 {
            return Err(SIError::Domain("0th root of a dimensionality".into()));
        }
        let mut num = [0u8; 7];
        let mut den = [0u8; 7];
        for i in 0..7 {
            if a.signed_exponent(i) % n != 0 {
                return Err(SIError::NonIntegerPower {
                    dimensionality: a.symbol.clone(),
                    power: 1.0 / f64::from(n),
                });
            }
            place(&mut num[i], &mut den[i], i32::from(a.num_exp[i]) / n);
            place(&mut den[i], &mut num[i], i32::from(a.den_exp[i]) / n);
        }
        Ok(intern(num, den))
    }

    fn build_symbol(num_exp: &[u8; 7], den_exp: &[u8; 7]) -> String {
        let num_frag = Self::fragment(num_exp);
        let den_frag = Self::fragment(den_exp);
        match (num_frag.is_empty(), den_frag.is_empty()) {
            (true, true) => "1".to_string(),
            (false, true) => num_frag,
            (true, false) => {
                if den_exp.iter().filter(|&&e| e > 0).count() > 1 {
                    format!("(1/({den_frag}))")
                } else {
                    format!("(1/{den_frag})")
                }
            }
            (false, false) => {
                if den_exp.iter().filter(|&&e| e > 0).count() > 1 {
                    format!("{num_frag}/({den_frag})")
                } else {
                    format!("{num_frag}/{den_frag}")
                }
            }
        }
    }

    fn fragment(exp: &[u8; 7]) -> String {
        let mut terms = Vec::new();
        for (i, &e) in exp.iter().enumerate() {
            if e == 0 {
                continue;
            }
            if e == 1 {
                terms.push(BASE_SYMBOLS[i].to_string());
            } else {
                terms.push(format!("{}^{}", BASE_SYMBOLS[i], e));
            }
        }
        terms.join("\u{2022}")
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Adds a signed exponent to `same_side`, or its negation to `other_side`
/// if it's negative.
fn place(same_side: &mut u8, other_side: &mut u8, signed: i32) {
    if signed >= 0 {
        *same_side += signed as u8;
    } else {
        *other_side += (-signed) as u8;
    }
}

fn arena() -> &'static RwLock<HashMap<String, DimensionalityRef>> {
    static ARENA: OnceLock<RwLock<HashMap<String, DimensionalityRef>>> = OnceLock::new();
    ARENA.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Interns a `Dimensionality` by its canonical symbol, building it on first
/// request and reusing the stored instance afterward.
fn intern(num_exp: [u8; 7], den_exp: [u8; 7]) -> DimensionalityRef {
    let candidate = Dimensionality::build(num_exp, den_exp);
    let key = candidate.symbol.clone();

    if let Some(existing) = arena().read().expect("dimensionality arena poisoned").get(&key) {
        return existing;
    }

    let mut guard = arena().write().expect("dimensionality arena poisoned");
    if let Some(existing) = guard.get(&key) {
        return existing;
    }
    let leaked: DimensionalityRef = Box::leak(Box::new(candidate));
    guard.insert(key, leaked);
    leaked
}

/// Returns (and interns, if not already present) the dimensionless
/// dimensionality.
#[must_use]
pub fn dimensionless() -> DimensionalityRef {
    intern([0; 7], [0; 7])
}

/// Parses a dimensionality's own canonical symbol (e.g. `"L\u{2022}M/T^2"`)
/// back into the interned `Dimensionality` it denotes. The grammar is the
/// same symbol^exponent product/quotient shared with unit expressions;
/// base-dimension letters stand in for registered unit symbols.
pub fn from_symbol(s: &str) -> Result<DimensionalityRef, SIError> {
    let terms = crate::canonicalize::parse_signed_terms(s)?;
    let mut exponents = [0i32; 7];
    for (symbol, exponent) in terms {
        let idx = BASE_SYMBOLS
            .iter()
            .position(|&b| b == symbol)
            .ok_or_else(|| SIError::ParseError {
                position: 0,
                message: format!("unknown base dimension symbol '{symbol}'"),
                fragment: s.to_string(),
            })?;
        exponents[idx] = exponent as i32;
    }
    Ok(from_signed_exponents(exponents))
}

/// Builds (and interns) a dimensionality directly from signed exponents, in
/// base order `[L, M, T, I, Theta, N, J]`.
#[must_use]
pub fn from_signed_exponents(exponents: [i32; 7]) -> DimensionalityRef {
    let mut num = [0u8; 7];
    let mut den = [0u8; 7];
    for i in 0..7 {
        if exponents[i] >= 0 {
            num[i] = exponents[i] as u8;
        } else {
            den[i] = (-exponents[i]) as u8;
        }
    }
    intern(num, den)
}

fn registry() -> &'static HashMap<&'static str, DimensionalityRef> {
    static REGISTRY: OnceLock<HashMap<&'static str, DimensionalityRef>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut m = HashMap::new();
        let mut add = |name: &'static str, exps: [i32; 7]| {
            m.insert(name, from_signed_exponents(exps));
        };

        // Base quantities.
        add("dimensionless", [0, 0, 0, 0, 0, 0, 0]);
        add("length", [1, 0, 0, 0, 0, 0, 0]);
        add("mass", [0, 1, 0, 0, 0, 0, 0]);
        add("time", [0, 0, 1, 0, 0, 0, 0]);
        add("current", [0, 0, 0, 1, 0, 0, 0]);
        add("temperature", [0, 0, 0, 0, 1, 0, 0]);
        add("amount", [0, 0, 0, 0, 0, 1, 0]);
        add("luminous intensity", [0, 0, 0, 0, 0, 0, 1]);

        // Common derived quantities.
        add("area", [2, 0, 0, 0, 0, 0, 0]);
        add("volume", [3, 0, 0, 0, 0, 0, 0]);
        add("velocity", [1, 0, -1, 0, 0, 0, 0]);
        add("acceleration", [1, 0, -2, 0, 0, 0, 0]);
        add("frequency", [0, 0, -1, 0, 0, 0, 0]);
        add("force", [1, 1, -2, 0, 0, 0, 0]);
        add("pressure", [-1, 1, -2, 0, 0, 0, 0]);
        add("stress", [-1, 1, -2, 0, 0, 0, 0]);
        add("elastic modulus", [-1, 1, -2, 0, 0, 0, 0]);
        add("energy", [2, 1, -2, 0, 0, 0, 0]);
        add("work", [2, 1, -2, 0, 0, 0, 0]);
        add("torque", [2, 1, -2, 0, 0, 0, 0]);
        add("power", [2, 1, -3, 0, 0, 0, 0]);
        add("charge", [0, 0, 1, 1, 0, 0, 0]);
        add("voltage", [2, 1, -3, -1, 0, 0, 0]);
        add("electric potential difference", [2, 1, -3, -1, 0, 0, 0]);
        add("capacitance", [-2, -1, 4, 2, 0, 0, 0]);
        add("resistance", [2, 1, -3, -2, 0, 0, 0]);
        add("conductance", [-2, -1, 3, 2, 0, 0, 0]);
        add("magnetic flux", [2, 1, -2, -1, 0, 0, 0]);
        add("magnetic flux density", [0, 1, -2, -1, 0, 0, 0]);
        add("inductance", [2, 1, -2, -2, 0, 0, 0]);
        add("luminous flux", [0, 0, 0, 0, 0, 0, 1]);
        add("illuminance", [-2, 0, 0, 0, 0, 0, 1]);
        add("radioactivity", [0, 0, -1, 0, 0, 0, 0]);
        add("absorbed dose", [2, 0, -2, 0, 0, 0, 0]);
        add("dose equivalent", [2, 0, -2, 0, 0, 0, 0]);
        add("catalytic activity", [0, 0, -1, 0, 0, 1, 0]);
        add("density", [-3, 1, 0, 0, 0, 0, 0]);
        add("molar mass", [0, 1, 0, 0, 0, -1, 0]);
        add("molar volume", [3, 0, 0, 0, 0, -1, 0]);
        add("specific heat capacity", [2, 0, -2, 0, -1, 0, 0]);
        add("thermal conductivity", [1, 1, -3, 0, -1, 0, 0]);
        add("dynamic viscosity", [-1, 1, -1, 0, 0, 0, 0]);
        add("kinematic viscosity", [2, 0, -1, 0, 0, 0, 0]);
        add("surface tension", [0, 1, -2, 0, 0, 0, 0]);
        add("angular velocity", [0, 0, -1, 0, 0, 0, 0]);
        add("angular acceleration", [0, 0, -2, 0, 0, 0, 0]);
        add("momentum", [1, 1, -1, 0, 0, 0, 0]);
        add("angular momentum", [2, 1, -1, 0, 0, 0, 0]);
        add("action", [2, 1, -1, 0, 0, 0, 0]);
        add("planck constant", [2, 1, -1, 0, 0, 0, 0]);
        add("gravitational constant", [3, -1, -2, 0, 0, 0, 0]);
        add("boltzmann constant", [2, 1, -2, 0, -1, 0, 0]);
        add("gas constant", [2, 1, -2, 0, -1, -1, 0]);
        add("stefan-boltzmann constant", [0, 1, -3, 0, -4, 0, 0]);
        add("gyromagnetic ratio", [0, 0, 1, 1, 0, 0, 0]);
        add("permittivity", [-3, -1, 4, 2, 0, 0, 0]);
        add("permeability", [1, 1, -2, -2, 0, 0, 0]);
        add("electric field strength", [1, 1, -3, -1, 0, 0, 0]);
        add("magnetic field strength", [-1, 0, 0, 1, 0, 0, 0]);
        add("electric dipole moment", [1, 0, 1, 1, 0, 0, 0]);
        add("magnetic dipole moment", [2, 0, 0, 1, 0, 0, 0]);
        add("entropy", [2, 1, -2, 0, -1, 0, 0]);
        add("molar entropy", [2, 1, -2, 0, -1, -1, 0]);
        add("thermal expansion coefficient", [0, 0, 0, 0, -1, 0, 0]);
        add("wave number", [-1, 0, 0, 0, 0, 0, 0]);

        m
    })
}

/// Looks up a named quantity tag (e.g. `"pressure"`). Lookup is
/// case-sensitive and uses the tag exactly as seeded.
#[must_use]
pub fn dimensionality_for_quantity(name: &str) -> Option<DimensionalityRef> {
    registry().get(name).copied()
}

/// Number of quantity tags currently seeded; present mainly for diagnostics
/// and tests.
#[must_use]
pub fn quantity_count() -> usize {
    registry().len()
}

/// Every seeded quantity tag sharing the given (already-reduced)
/// dimensionality, sorted for stable diagnostic output.
#[must_use]
pub fn quantities_for_dimensionality(dim: DimensionalityRef) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry()
        .iter()
        .filter(|(_, d)| std::ptr::eq(**d, dim))
        .map(|(name, _)| *name)
        .collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensionless_symbol_is_one() {
        assert_eq!(dimensionless().symbol(), "1");
    }

    #[test]
    fn simple_symbol_construction() {
        let force = from_signed_exponents([1, 1, -2, 0, 0, 0, 0]);
        assert_eq!(force.symbol(), "L\u{2022}M/T^2");
    }

    #[test]
    fn denominator_only_is_parenthesized_when_multi_term() {
        let per_time_temp = from_signed_exponents([0, 0, -1, 0, -1, 0, 0]);
        assert_eq!(per_time_temp.symbol(), "(1/(T\u{2022}\u{0398}))");
    }

    #[test]
    fn interning_returns_same_pointer() {
        let a = from_signed_exponents([1, 0, 0, 0, 0, 0, 0]);
        let b = from_signed_exponents([1, 0, 0, 0, 0, 0, 0]);
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn multiply_then_reduce_cancels_opposite_signs() {
        let length = from_signed_exponents([1, 0, 0, 0, 0, 0, 0]);
        let per_length = from_signed_exponents([-1, 0, 0, 0, 0, 0, 0]);
        let unreduced = Dimensionality::multiply_without_reducing(length, per_length);
        assert!(!unreduced.is_reduced() || unreduced.is_dimensionless());
        assert!(unreduced.reduced().is_dimensionless());
    }

    #[test]
    fn nth_root_rejects_non_divisible_exponents() {
        let area = from_signed_exponents([2, 0, 0, 0, 0, 0, 0]);
        assert!(Dimensionality::nth_root(area, 3).is_err());
        assert!(Dimensionality::nth_root(area, 2).is_ok());
    }

    #[test]
    fn nth_root_of_unreduced_operand_preserves_num_den_structure() {
        let length4 = from_signed_exponents([4, 0, 0, 0, 0, 0, 0]);
        let per_length2 = from_signed_exponents([-2, 0, 0, 0, 0, 0, 0]);
        let unreduced = Dimensionality::multiply_without_reducing(length4, per_length2);

        let rooted = Dimensionality::nth_root(unreduced, 2).unwrap();

        assert_eq!(rooted.num_exp()[0], 2);
        assert_eq!(rooted.den_exp()[0], 1);
        assert_eq!(rooted.signed_exponent(0), 1);
    }

    #[test]
    fn quantity_registry_is_seeded() {
        assert!(quantity_count() > 40);
        assert_eq!(
            dimensionality_for_quantity("pressure"),
            dimensionality_for_quantity("stress")
        );
    }

    #[test]
    fn from_symbol_round_trips_through_symbol() {
        let force = from_signed_exponents([1, 1, -2, 0, 0, 0, 0]);
        let parsed = from_symbol(force.symbol()).unwrap();
        assert!(std::ptr::eq(force, parsed));
    }

    #[test]
    fn quantities_for_dimensionality_groups_synonyms() {
        let pressure = dimensionality_for_quantity("pressure").unwrap();
        let names = quantities_for_dimensionality(pressure);
        assert!(names.contains(&"pressure"));
        assert!(names.contains(&"stress"));
        assert!(names.contains(&"elastic modulus"));
    }
}

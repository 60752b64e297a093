//! Periodic-table constant provider: the external collaborator consumed by
//! the scalar expression parser's `const_func[identifier]` primaries
//! (`aw[X]`, `fw[H2O]`, `abundance[13C]`, ...).
//!
//! This is specified as an out-of-scope external collaborator: the real
//! provider (a full isotope/element database) is not part of this crate.
//! `BuiltinPeriodicTable` below is a small fixture sufficient to exercise
//! the parser's constant-function grammar end to end.

use crate::scalar::Scalar;

/// Functions that, given an element or isotope identifier string, return a
/// `Scalar` carrying the requested physical property. Implementations
/// should return `None` when the identifier is unrecognized; the parser
/// turns that into `SIError::UnknownConstant`.
pub trait PeriodicTable {
    /// Atomic weight of an element, e.g. `aw["H"]`.
    fn atomic_weight(&self, identifier: &str) -> Option<Scalar>;
    /// Formula mass of a compound, e.g. `fw["H2O"]`.
    fn formula_mass(&self, identifier: &str) -> Option<Scalar>;
    /// Natural isotopic abundance, e.g. `abundance["13C"]`.
    fn isotope_abundance(&self, identifier: &str) -> Option<Scalar>;
    /// Nuclear spin quantum number.
    fn isotope_spin(&self, identifier: &str) -> Option<Scalar>;
    /// Half-life of a radioactive isotope.
    fn isotope_half_life(&self, identifier: &str) -> Option<Scalar>;
    /// Gyromagnetic ratio.
    fn isotope_gyromagnetic_ratio(&self, identifier: &str) -> Option<Scalar>;
    /// Nuclear magnetic dipole moment.
    fn isotope_magnetic_dipole_moment(&self, identifier: &str) -> Option<Scalar>;
    /// Nuclear electric quadrupole moment.
    fn isotope_electric_quadrupole_moment(&self, identifier: &str) -> Option<Scalar>;
    /// NMR frequency per unit field for the given isotope.
    fn nmr_frequency(&self, identifier: &str) -> Option<Scalar>;
}

struct ElementFixture {
    symbol: &'static str,
    atomic_weight: f64,
}

const ELEMENTS: &[ElementFixture] = &[
    ElementFixture { symbol: "H", atomic_weight: 1.008 },
    ElementFixture { symbol: "C", atomic_weight: 12.011 },
    ElementFixture { symbol: "N", atomic_weight: 14.007 },
    ElementFixture { symbol: "O", atomic_weight: 15.999 },
];

struct IsotopeFixture {
    identifier: &'static str,
    abundance: f64,
    spin: f64,
    half_life_seconds: f64,
    gyromagnetic_ratio: f64,
}

const ISOTOPES: &[IsotopeFixture] = &[
    IsotopeFixture { identifier: "1H", abundance: 0.999_885, spin: 0.5, half_life_seconds: f64::INFINITY, gyromagnetic_ratio: 2.675_222e8 },
    IsotopeFixture { identifier: "13C", abundance: 0.0107, spin: 0.5, half_life_seconds: f64::INFINITY, gyromagnetic_ratio: 6.728_284e7 },
    IsotopeFixture { identifier: "14C", abundance: 0.0, spin: 0.0, half_life_seconds: 1.807e11, gyromagnetic_ratio: 0.0 },
];

fn find_element(identifier: &str) -> Option<&'static ElementFixture> {
    ELEMENTS.iter().find(|e| e.symbol == identifier)
}

fn find_isotope(identifier: &str) -> Option<&'static IsotopeFixture> {
    ISOTOPES.iter().find(|i| i.identifier == identifier)
}

/// A minimal, in-memory fixture covering four elements and three isotopes.
/// Not a substitute for a real periodic-table provider; exists only so the
/// `const_func[...]` parser grammar can be exercised and tested without an
/// external dependency.
#[derive(Debug, Default)]
pub struct BuiltinPeriodicTable;

impl PeriodicTable for BuiltinPeriodicTable {
    fn atomic_weight(&self, identifier: &str) -> Option<Scalar> {
        let element = find_element(identifier)?;
        Some(Scalar::from_grams_per_mole(element.atomic_weight))
    }

    fn formula_mass(&self, identifier: &str) -> Option<Scalar> {
        // Minimal formula parser: consecutive Element+optional-count tokens,
        // e.g. "H2O" -> 2*H + 1*O.
        let mut total = 0.0;
        let mut chars = identifier.chars().peekable();
        let mut any = false;
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let mut symbol = String::new();
            symbol.push(c);
            chars.next();
            if let Some(&lower) = chars.peek() {
                if lower.is_ascii_lowercase() {
                    symbol.push(lower);
                    chars.next();
                }
            }
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let count: f64 = if digits.is_empty() { 1.0 } else { digits.parse().ok()? };
            let element = find_element(&symbol)?;
            total += element.atomic_weight * count;
            any = true;
        }
        if any {
            Some(Scalar::from_grams_per_mole(total))
        } else {
            None
        }
    }

    fn isotope_abundance(&self, identifier: &str) -> Option<Scalar> {
        find_isotope(identifier).map(|i| Scalar::dimensionless(i.abundance))
    }

    fn isotope_spin(&self, identifier: &str) -> Option<Scalar> {
        find_isotope(identifier).map(|i| Scalar::dimensionless(i.spin))
    }

    fn isotope_half_life(&self, identifier: &str) -> Option<Scalar> {
        find_isotope(identifier).map(|i| Scalar::from_seconds(i.half_life_seconds))
    }

    fn isotope_gyromagnetic_ratio(&self, identifier: &str) -> Option<Scalar> {
        find_isotope(identifier).map(|i| Scalar::dimensionless(i.gyromagnetic_ratio))
    }

    fn isotope_magnetic_dipole_moment(&self, _identifier: &str) -> Option<Scalar> {
        None
    }

    fn isotope_electric_quadrupole_moment(&self, _identifier: &str) -> Option<Scalar> {
        None
    }

    fn nmr_frequency(&self, _identifier: &str) -> Option<Scalar> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_weight_resolves_known_element() {
        let table = BuiltinPeriodicTable;
        assert!(table.atomic_weight("H").is_some());
        assert!(table.atomic_weight("Xx").is_none());
    }

    #[test]
    fn formula_mass_sums_constituents() {
        let table = BuiltinPeriodicTable;
        let water = table.formula_mass("H2O").unwrap();
        let expected = 2.0 * 1.008 + 15.999;
        assert!((water.to_f64_in_coherent_si() - expected / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn isotope_abundance_resolves_known_isotope() {
        let table = BuiltinPeriodicTable;
        assert!(table.isotope_abundance("13C").is_some());
        assert!(table.isotope_abundance("99Zz").is_none());
    }
}

//! Unit registry (C4): the seeded catalog of named/prefixed units and the
//! three lookup tables (symbol -> Unit, quantity -> Units, dimensionality
//! symbol -> Units), all process-wide and append-only after first use.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use log::debug;

use crate::canonicalize::library_key;
use crate::dimensionality::{self, DimensionalityRef};
use crate::unit::{Unit, UnitRef};

/// Locale-sensitive seeding flag (spec's "locale flag" design note):
/// controls which gallon/pint/ounce family is seeded for volume units,
/// rather than reading process or OS locale state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeUnitSystem {
    Imperial,
    UsCustomary,
}

struct Tables {
    by_symbol: HashMap<String, UnitRef>,
    by_quantity: HashMap<&'static str, Vec<UnitRef>>,
    by_dimensionality_symbol: HashMap<String, Vec<UnitRef>>,
}

fn tables(volume_system: VolumeUnitSystem) -> &'static RwLock<Tables> {
    static TABLES: OnceLock<RwLock<Tables>> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut t = Tables {
            by_symbol: HashMap::new(),
            by_quantity: HashMap::new(),
            by_dimensionality_symbol: HashMap::new(),
        };
        seed(&mut t, volume_system);
        debug!(
            "unit registry seeded: {} symbols, {} quantities",
            t.by_symbol.len(),
            t.by_quantity.len()
        );
        RwLock::new(t)
    })
}

fn intern_unit(t: &mut Tables, unit: Unit) -> UnitRef {
    let key = unit.symbol().to_string();
    if let Some(existing) = t.by_symbol.get(&key) {
        return existing;
    }
    let leaked: UnitRef = Box::leak(Box::new(unit));
    t.by_symbol.insert(key, leaked);
    leaked
}

fn register(
    t: &mut Tables,
    quantity: &'static str,
    dim: DimensionalityRef,
    scale: f64,
    symbol: &str,
    name: Option<&str>,
    plural: Option<&str>,
) -> UnitRef {
    let unit = Unit::new(dim, scale, symbol, name.map(str::to_string), plural.map(str::to_string));
    let interned = intern_unit(t, unit);
    t.by_quantity.entry(quantity).or_default().push(interned);
    t.by_dimensionality_symbol.entry(dim.symbol().to_string()).or_default().push(interned);
    interned
}

const SI_PREFIXES: &[(&str, f64)] = &[
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("da", 1e1),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("\u{00B5}", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("z", 1e-21),
    ("y", 1e-24),
];

/// Registers `base_symbol` (scale 1, i.e. coherent SI) plus all twenty
/// decimal-prefixed variants for `quantity`/`dim`.
fn register_with_si_prefixes(t: &mut Tables, quantity: &'static str, dim: DimensionalityRef, base_symbol: &str, name: &str, plural: &str) {
    register(t, quantity, dim, 1.0, base_symbol, Some(name), Some(plural));
    for (prefix, factor) in SI_PREFIXES {
        let symbol = format!("{prefix}{base_symbol}");
        let prefixed_name = format!("{}{}", prefix_name(prefix), name);
        let prefixed_plural = format!("{}{}", prefix_name(prefix), plural);
        register(t, quantity, dim, *factor, &symbol, Some(&prefixed_name), Some(&prefixed_plural));
    }
}

fn prefix_name(prefix: &str) -> &'static str {
    match prefix {
        "Y" => "yotta",
        "Z" => "zetta",
        "E" => "exa",
        "P" => "peta",
        "T" => "tera",
        "G" => "giga",
        "M" => "mega",
        "k" => "kilo",
        "h" => "hecto",
        "da" => "deca",
        "d" => "deci",
        "c" => "centi",
        "m" => "milli",
        "\u{00B5}" => "micro",
        "n" => "nano",
        "p" => "pico",
        "f" => "femto",
        "a" => "atto",
        "z" => "zepto",
        "y" => "yocto",
        _ => "",
    }
}

fn seed(t: &mut Tables, volume_system: VolumeUnitSystem) {
    let q = dimensionality::dimensionality_for_quantity;
    let length = q("length").expect("length dimensionality seeded");
    let mass = q("mass").expect("mass dimensionality seeded");
    let time = q("time").expect("time dimensionality seeded");
    let current = q("current").expect("current dimensionality seeded");
    let temperature = q("temperature").expect("temperature dimensionality seeded");
    let amount = q("amount").expect("amount dimensionality seeded");
    let luminous = q("luminous intensity").expect("luminous dimensionality seeded");
    let dimensionless = dimensionality::dimensionless();

    // Dimensionless underived unit: must be the unit with symbol "1".
    register(t, "dimensionless", dimensionless, 1.0, "1", Some("unit"), Some("units"));
    register(t, "angle", dimensionless, 1.0, "rad", Some("radian"), Some("radians"));
    register(t, "angle", dimensionless, std::f64::consts::PI / 180.0, "deg", Some("degree"), Some("degrees"));

    // SI base units, with decimal prefixes.
    register_with_si_prefixes(t, "length", length, "m", "meter", "meters");
    // Gram, not kilogram, is the prefix root; kilogram itself is the coherent unit.
    register(t, "mass", mass, 1.0, "kg", Some("kilogram"), Some("kilograms"));
    register_with_si_prefixes(t, "mass", mass, "g", "gram", "grams");
    register_with_si_prefixes(t, "time", time, "s", "second", "seconds");
    register_with_si_prefixes(t, "current", current, "A", "ampere", "amperes");
    register_with_si_prefixes(t, "temperature", temperature, "K", "kelvin", "kelvins");
    register_with_si_prefixes(t, "amount", amount, "mol", "mole", "moles");
    register_with_si_prefixes(t, "luminous intensity", luminous, "cd", "candela", "candelas");

    // Named SI-derived units with prefixes.
    register_with_si_prefixes(t, "frequency", q("frequency").unwrap(), "Hz", "hertz", "hertz");
    register_with_si_prefixes(t, "force", q("force").unwrap(), "N", "newton", "newtons");
    register_with_si_prefixes(t, "pressure", q("pressure").unwrap(), "Pa", "pascal", "pascals");
    register_with_si_prefixes(t, "energy", q("energy").unwrap(), "J", "joule", "joules");
    register_with_si_prefixes(t, "power", q("power").unwrap(), "W", "watt", "watts");
    register_with_si_prefixes(t, "charge", q("charge").unwrap(), "C", "coulomb", "coulombs");
    register_with_si_prefixes(t, "voltage", q("voltage").unwrap(), "V", "volt", "volts");
    register_with_si_prefixes(t, "resistance", q("resistance").unwrap(), "\u{03A9}", "ohm", "ohms");
    register_with_si_prefixes(t, "conductance", q("conductance").unwrap(), "S", "siemens", "siemens");
    register_with_si_prefixes(t, "capacitance", q("capacitance").unwrap(), "F", "farad", "farads");
    register_with_si_prefixes(t, "magnetic flux", q("magnetic flux").unwrap(), "Wb", "weber", "webers");
    register_with_si_prefixes(t, "magnetic flux density", q("magnetic flux density").unwrap(), "T", "tesla", "teslas");
    register_with_si_prefixes(t, "inductance", q("inductance").unwrap(), "H", "henry", "henries");
    register_with_si_prefixes(t, "luminous flux", q("luminous flux").unwrap(), "lm", "lumen", "lumens");
    register_with_si_prefixes(t, "illuminance", q("illuminance").unwrap(), "lx", "lux", "lux");
    register_with_si_prefixes(t, "radioactivity", q("radioactivity").unwrap(), "Bq", "becquerel", "becquerels");
    register_with_si_prefixes(t, "absorbed dose", q("absorbed dose").unwrap(), "Gy", "gray", "grays");
    register_with_si_prefixes(t, "dose equivalent", q("dose equivalent").unwrap(), "Sv", "sievert", "sieverts");
    register_with_si_prefixes(t, "catalytic activity", q("catalytic activity").unwrap(), "kat", "katal", "katals");

    // Dimensionless pseudo-units (original source: kSIQuantityDimensionless block).
    register(t, "dimensionless", dimensionless, 1e-2, "%", Some("percent"), Some("percent"));
    register(t, "dimensionless", dimensionless, 1e-3, "\u{2030}", Some("permille"), Some("permille"));
    register(t, "dimensionless", dimensionless, 1e-4, "\u{2031}", Some("permyriad"), Some("permyriad"));
    register(t, "dimensionless", dimensionless, 1e-6, "ppm", Some("part per million"), Some("parts per million"));
    register(t, "dimensionless", dimensionless, 1e-9, "ppb", Some("part per billion"), Some("parts per billion"));
    register(t, "dimensionless", dimensionless, 1e-12, "ppt", Some("part per trillion"), Some("parts per trillion"));
    register(t, "dimensionless", dimensionless, 1e-15, "ppq", Some("part per quadrillion"), Some("parts per quadrillion"));
    register(t, "dimensionless", dimensionless, std::f64::consts::E, "e", Some("euler's number"), None);

    // Calendar time units, used chiefly by the split-by-units formatter.
    register(t, "time", time, 60.0, "min", Some("minute"), Some("minutes"));
    register(t, "time", time, 3600.0, "h", Some("hour"), Some("hours"));
    register(t, "time", time, 86400.0, "d", Some("day"), Some("days"));
    register(t, "time", time, 604_800.0, "wk", Some("week"), Some("weeks"));
    register(t, "time", time, 2_629_800.0, "mo", Some("month"), Some("months"));
    register(t, "time", time, 31_557_600.0, "yr", Some("year"), Some("years"));

    // Imperial / customary length, mass, and derived units.
    register(t, "length", length, 0.0254, "in", Some("inch"), Some("inches"));
    register(t, "length", length, 0.3048, "ft", Some("foot"), Some("feet"));
    register(t, "length", length, 0.9144, "yd", Some("yard"), Some("yards"));
    register(t, "length", length, 1609.344, "mi", Some("mile"), Some("miles"));
    register(t, "mass", mass, 0.453_592_37, "lb", Some("pound"), Some("pounds"));
    register(t, "mass", mass, 0.028_349_523_125, "oz", Some("ounce"), Some("ounces"));
    register(t, "mass", mass, 907.184_74, "ton", Some("short ton"), Some("short tons"));
    register(t, "force", q("force").unwrap(), 4.448_221_615_260_5, "lbf", Some("pound-force"), Some("pounds-force"));
    register(t, "energy", q("energy").unwrap(), 1.602_176_634e-19, "eV", Some("electronvolt"), Some("electronvolts"));
    register(t, "pressure", q("pressure").unwrap(), 6894.757_293_168_361, "psi", Some("pound per square inch"), Some("pounds per square inch"));
    register(t, "energy", q("energy").unwrap(), 1055.055_852_62, "Btu", Some("British thermal unit"), Some("British thermal units"));
    register(t, "power", q("power").unwrap(), 745.699_871_582_270_2, "hp", Some("horsepower"), Some("horsepower"));

    let (gallon_l, pint_l) = match volume_system {
        VolumeUnitSystem::Imperial => (4.546_09e-3, 5.682_612_5e-4),
        VolumeUnitSystem::UsCustomary => (3.785_411_784e-3, 4.731_764_73e-4),
    };
    register(t, "volume", q("volume").unwrap(), 1e-3, "L", Some("liter"), Some("liters"));
    register(t, "volume", q("volume").unwrap(), 1e-6, "mL", Some("milliliter"), Some("milliliters"));
    register(t, "volume", q("volume").unwrap(), gallon_l, "gal", Some("gallon"), Some("gallons"));
    register(t, "volume", q("volume").unwrap(), pint_l, "pt", Some("pint"), Some("pints"));
    register(t, "volume", q("volume").unwrap(), pint_l / 2.0, "qt", Some("quart"), Some("quarts"));
    register(t, "temperature", temperature, 5.0 / 9.0, "degR", Some("degree Rankine"), Some("degrees Rankine"));

    // CGS units.
    register(t, "energy", q("energy").unwrap(), 1e-7, "erg", Some("erg"), Some("ergs"));
    register(t, "force", q("force").unwrap(), 1e-5, "dyn", Some("dyne"), Some("dynes"));
    register(t, "dynamic viscosity", q("dynamic viscosity").unwrap(), 0.1, "P", Some("poise"), Some("poise"));
    register(t, "kinematic viscosity", q("kinematic viscosity").unwrap(), 1e-4, "St", Some("stokes"), Some("stokes"));
    register(t, "magnetic flux density", q("magnetic flux density").unwrap(), 1e-4, "G", Some("gauss"), Some("gauss"));
    register(t, "magnetic field strength", q("magnetic field strength").unwrap(), 79.577_471_545_947_67, "Oe", Some("oersted"), Some("oersteds"));

    // Atomic and Planck units, and named physical constants treated as units.
    register(t, "length", length, 5.291_772_109_03e-11, "a0", Some("bohr radius"), None);
    register(t, "energy", q("energy").unwrap(), 4.359_744_650e-18, "Eh", Some("hartree energy"), None);
    register(t, "charge", q("charge").unwrap(), 1.602_176_634e-19, "qe", Some("elementary charge"), None);
    register(t, "action", q("action").unwrap(), 1.054_571_817e-34, "hbar", Some("reduced planck constant"), None);
    register(t, "mass", mass, 9.109_383_701_5e-31, "me", Some("electron mass"), None);
    register(t, "mass", mass, 1.672_621_923_69e-27, "mp", Some("proton mass"), None);
    register(t, "mass", mass, 1.674_927_498_04e-27, "mn", Some("neutron mass"), None);
    register(t, "mass", mass, 6.644_657_330e-27, "malpha", Some("alpha particle mass"), None);
    register(t, "length", length, 1.616_255e-35, "lP", Some("planck length"), None);
    register(t, "time", time, 5.391_247e-44, "tP", Some("planck time"), None);
    register(t, "mass", mass, 2.176_434e-8, "mP", Some("planck mass"), None);
    register(t, "temperature", temperature, 1.416_784e32, "TP", Some("planck temperature"), None);
    register(t, "action", q("action").unwrap(), 6.626_070_15e-34, "hP", Some("planck constant"), None);
    register(t, "amount", amount, 1.0 / 6.022_140_76e23, "NAinv", Some("inverse avogadro constant"), None);
    register(t, "entropy", q("entropy").unwrap(), 1.380_649e-23, "kB", Some("boltzmann constant"), None);
    register(t, "gas constant", q("gas constant").unwrap(), 8.314_462_618, "R", Some("molar gas constant"), None);
    register(t, "permittivity", q("permittivity").unwrap(), 8.854_187_8128e-12, "eps0", Some("vacuum electric permittivity"), None);
    register(t, "permeability", q("permeability").unwrap(), 1.256_637_062_12e-6, "mu0", Some("vacuum magnetic permeability"), None);
    register(t, "velocity", q("velocity").unwrap(), 299_792_458.0, "c0", Some("speed of light in vacuum"), None);
    register(t, "acceleration", q("acceleration").unwrap(), 9.806_65, "g0", Some("standard gravity"), None);
    register(t, "stefan-boltzmann constant", q("stefan-boltzmann constant").unwrap(), 5.670_374_419e-8, "sigmaSB", Some("stefan-boltzmann constant"), None);
    register(t, "wave number", q("wave number").unwrap(), 10_973_731.568_160, "Rinf", Some("rydberg constant"), None);
    register(t, "magnetic flux", q("magnetic flux").unwrap(), 2.067_833_848e-15, "Phi0", Some("magnetic flux quantum"), None);
    register(t, "conductance", q("conductance").unwrap(), 7.748_091_729e-5, "G0", Some("conductance quantum"), None);
}

/// Facade over the process-wide unit tables. Construction is cheap: all real
/// state lives in the lazily-initialized statics above, so multiple
/// `UnitRegistry` handles observe the same catalog.
pub struct UnitRegistry {
    volume_system: VolumeUnitSystem,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_volume_system(VolumeUnitSystem::Imperial)
    }

    #[must_use]
    pub fn with_volume_system(volume_system: VolumeUnitSystem) -> Self {
        // Force seeding now so callers observe a populated registry.
        let _ = tables(volume_system);
        Self { volume_system }
    }

    #[must_use]
    pub fn unit_with_symbol(&self, symbol: &str) -> Option<UnitRef> {
        tables(self.volume_system).read().expect("unit registry poisoned").by_symbol.get(symbol).copied()
    }

    #[must_use]
    pub fn units_for_quantity(&self, quantity: &str) -> Vec<UnitRef> {
        tables(self.volume_system)
            .read()
            .expect("unit registry poisoned")
            .by_quantity
            .get(quantity)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn units_for_dimensionality(&self, dim: DimensionalityRef) -> Vec<UnitRef> {
        tables(self.volume_system)
            .read()
            .expect("unit registry poisoned")
            .by_dimensionality_symbol
            .get(dim.symbol())
            .cloned()
            .unwrap_or_default()
    }

    /// The unique registered unit with scale 1 for `dim`, constructing and
    /// interning it on demand by substituting base SI symbols into `dim`'s
    /// canonical form.
    #[must_use]
    pub fn coherent_unit_for_dimensionality(&self, dim: DimensionalityRef) -> UnitRef {
        if let Some(existing) = self.units_for_dimensionality(dim).into_iter().find(|u| u.is_coherent_si()) {
            return existing;
        }
        let symbol = coherent_symbol(dim);
        let mut guard = tables(self.volume_system).write().expect("unit registry poisoned");
        register(&mut guard, "derived", dim, 1.0, &symbol, None, None)
    }

    #[must_use]
    pub fn dimensionless_unit(&self) -> UnitRef {
        self.unit_with_symbol("1").expect("dimensionless unit always seeded")
    }

    /// Looks up the best existing match for `(dim, scale)` (same reduced
    /// dimensionality, scale within 1% relative tolerance, shortest symbol,
    /// then insertion order), synthesizing and interning a fresh Unit under
    /// `synthesized_symbol` (passed through `library_key`) if none matches.
    #[must_use]
    pub fn best_match_or_synthesize(&self, dim: DimensionalityRef, scale: f64, synthesized_symbol: &str) -> UnitRef {
        let candidates = self.units_for_dimensionality(dim.reduced());
        let best = candidates
            .iter()
            .filter(|u| {
                let tol = 1e-2 * scale.abs().max(f64::MIN_POSITIVE);
                (u.scale_to_coherent_si() - scale).abs() <= tol
            })
            .min_by(|a, b| a.symbol().len().cmp(&b.symbol().len()));

        if let Some(existing) = best {
            return existing;
        }

        let key = library_key(synthesized_symbol).unwrap_or_else(|_| synthesized_symbol.to_string());
        if let Some(existing) = self.unit_with_symbol(&key) {
            return existing;
        }
        let mut guard = tables(self.volume_system).write().expect("unit registry poisoned");
        register(&mut guard, "derived", dim, scale, &key, None, None)
    }
}

fn coherent_symbol(dim: DimensionalityRef) -> String {
    const BASE_SI: [&str; 7] = ["m", "kg", "s", "A", "K", "mol", "cd"];
    let num: Vec<String> = (0..7)
        .filter(|&i| dim.signed_exponent(i) > 0)
        .map(|i| {
            let e = dim.signed_exponent(i);
            if e == 1 { BASE_SI[i].to_string() } else { format!("{}^{}", BASE_SI[i], e) }
        })
        .collect();
    let den: Vec<String> = (0..7)
        .filter(|&i| dim.signed_exponent(i) < 0)
        .map(|i| {
            let e = -dim.signed_exponent(i);
            if e == 1 { BASE_SI[i].to_string() } else { format!("{}^{}", BASE_SI[i], e) }
        })
        .collect();
    match (num.is_empty(), den.is_empty()) {
        (true, true) => "1".to_string(),
        (false, true) => num.join("\u{2022}"),
        (true, false) if den.len() > 1 => format!("1/({})", den.join("\u{2022}")),
        (true, false) => format!("1/{}", den.join("\u{2022}")),
        (false, false) if den.len() > 1 => format!("{}/({})", num.join("\u{2022}"), den.join("\u{2022}")),
        (false, false) => format!("{}/{}", num.join("\u{2022}"), den.join("\u{2022}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_base_units_with_prefixes() {
        let registry = UnitRegistry::new();
        assert!(registry.unit_with_symbol("m").is_some());
        assert!(registry.unit_with_symbol("km").is_some());
        assert!(registry.unit_with_symbol("\u{00B5}m").is_some());
    }

    #[test]
    fn coherent_unit_has_scale_one() {
        let registry = UnitRegistry::new();
        let pressure = dimensionality::dimensionality_for_quantity("pressure").unwrap();
        let coherent = registry.coherent_unit_for_dimensionality(pressure);
        assert!(coherent.is_coherent_si());
    }

    #[test]
    fn units_for_quantity_includes_seeded_units() {
        let registry = UnitRegistry::new();
        let lengths = registry.units_for_quantity("length");
        assert!(lengths.iter().any(|u| u.symbol() == "m"));
        assert!(lengths.iter().any(|u| u.symbol() == "in"));
    }

    #[test]
    fn best_match_reuses_existing_unit_within_tolerance() {
        let registry = UnitRegistry::new();
        let joule = registry.unit_with_symbol("J").unwrap();
        let dim = joule.dimensionality();
        let synthesized = registry.best_match_or_synthesize(dim, joule.scale_to_coherent_si() * 1.001, "J_alias");
        assert!(std::ptr::eq(synthesized, joule));
    }
}

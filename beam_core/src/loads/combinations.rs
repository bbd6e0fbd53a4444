//! ASCE 7 Load Combinations
//!
//! Static factor tables for the combination sets the superposer can run:
//!
//! - `service` - a single unit-factor pass over every load type
//! - `asce7-asd` - Allowable Stress Design (Section 2.4.1)
//! - `asce7-lrfd` - Strength Design (Section 2.3.1)
//!
//! Each row carries a presence condition and a factor vector. A row is
//! skipped for a given beam when none of its variable (non-dead) load types
//! are present, so a dead-plus-live beam never runs the snow or rain rows.
//!
//! ## Wind Load Sign Convention
//!
//! Wind (W) is entered as a signed magnitude. The tables include both +W and
//! -W variants so that uplift governs minimum reactions and reversed moments
//! without the user entering a second wind load.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::load_types::{LoadTable, LoadType, NUM_LOAD_SLOTS};
use crate::errors::{CalcError, CalcResult};

/// Name of the single unit-factor combination set
pub const SERVICE_SET: &str = "service";

/// Name of the ASCE 7 ASD combination set
pub const ASD_SET: &str = "asce7-asd";

/// Name of the ASCE 7 LRFD combination set
pub const LRFD_SET: &str = "asce7-lrfd";

/// A load combination with factors for each load type
///
/// # Example
/// ```
/// use beam_core::loads::{LoadCombination, LoadType};
///
/// let combo = LoadCombination::new("ASD-2", "D + L")
///     .with_factor(LoadType::Dead, 1.0)
///     .with_factor(LoadType::Live, 1.0);
///
/// let mut present = [false; 10];
/// present[LoadType::Dead.slot()] = true;
/// assert!(!combo.applies_to(&present));
///
/// present[LoadType::Live.slot()] = true;
/// assert!(combo.applies_to(&present));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    /// Combination identifier (e.g., "ASD-1", "LRFD-2a")
    pub name: String,

    /// Human-readable equation for display (e.g., "D + L", "1.2D + 1.6L")
    pub equation: String,

    /// Load factors keyed by load type
    pub factors: HashMap<LoadType, f64>,
}

impl LoadCombination {
    /// Create a new load combination
    pub fn new(name: impl Into<String>, equation: impl Into<String>) -> Self {
        LoadCombination {
            name: name.into(),
            equation: equation.into(),
            factors: HashMap::new(),
        }
    }

    /// Add a load factor (builder pattern)
    pub fn with_factor(mut self, load_type: LoadType, factor: f64) -> Self {
        self.factors.insert(load_type, factor);
        self
    }

    /// Get the factor for a specific load type (0.0 if not in combination)
    pub fn get_factor(&self, load_type: LoadType) -> f64 {
        self.factors.get(&load_type).copied().unwrap_or(0.0)
    }

    /// Factors laid out per load slot (the aggregate slot is always 0.0)
    pub fn factor_table(&self) -> LoadTable {
        let mut table = [0.0; NUM_LOAD_SLOTS];
        for (load_type, factor) in &self.factors {
            table[load_type.slot()] = *factor;
        }
        table
    }

    /// Variable load types this row exists for: every factored type other
    /// than dead, fluid and lateral earth pressure
    pub fn primary_types(&self) -> Vec<LoadType> {
        let mut types: Vec<LoadType> = self
            .factors
            .iter()
            .filter(|(t, f)| {
                **f != 0.0
                    && !matches!(t, LoadType::Dead | LoadType::Fluid | LoadType::Horizontal)
            })
            .map(|(t, _)| *t)
            .collect();
        types.sort();
        types
    }

    /// Whether this row is worth running for a beam with the given
    /// per-slot presence flags.
    pub fn applies_to(&self, present: &[bool; NUM_LOAD_SLOTS]) -> bool {
        let primary = self.primary_types();
        primary.is_empty() || primary.iter().any(|t| present[t.slot()])
    }
}

/// Unit-factor combination over every load type
pub fn service_combinations() -> Vec<LoadCombination> {
    let combo = LoadType::ALL
        .iter()
        .fold(LoadCombination::new("Service", "D + F + L + H + Lr + S + R + W + E"), |c, t| {
            c.with_factor(*t, 1.0)
        });
    vec![combo]
}

/// Dead + fluid + lateral earth at the given factors (shared by most rows)
fn permanent(name: &str, equation: &str, dead: f64, fluid: f64, horizontal: f64) -> LoadCombination {
    let mut combo = LoadCombination::new(name, equation).with_factor(LoadType::Dead, dead);
    if fluid != 0.0 {
        combo = combo.with_factor(LoadType::Fluid, fluid);
    }
    if horizontal != 0.0 {
        combo = combo.with_factor(LoadType::Horizontal, horizontal);
    }
    combo
}

/// ASCE 7 ASD load combinations (Section 2.4.1)
///
/// # Example
/// ```
/// use beam_core::loads::asce7_asd_combinations;
///
/// let combos = asce7_asd_combinations();
/// assert_eq!(combos.len(), 21);
/// ```
pub fn asce7_asd_combinations() -> Vec<LoadCombination> {
    vec![
        // 1. D + F
        permanent("ASD-1", "D + F", 1.0, 1.0, 0.0),

        // 2. D + F + H + L
        permanent("ASD-2", "D + F + H + L", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 1.0),

        // 3. D + F + H + (Lr or S or R)
        permanent("ASD-3a", "D + F + H + Lr", 1.0, 1.0, 1.0)
            .with_factor(LoadType::RoofLive, 1.0),
        permanent("ASD-3b", "D + F + H + S", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Snow, 1.0),
        permanent("ASD-3c", "D + F + H + R", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Rain, 1.0),

        // 4. D + F + H + 0.75L + 0.75(Lr or S or R)
        permanent("ASD-4a", "D + F + H + 0.75L + 0.75Lr", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::RoofLive, 0.75),
        permanent("ASD-4b", "D + F + H + 0.75L + 0.75S", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Snow, 0.75),
        permanent("ASD-4c", "D + F + H + 0.75L + 0.75R", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Rain, 0.75),

        // 5. D + F + H + (0.6W or 0.7E)
        permanent("ASD-5a", "D + F + H + 0.6W", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Wind, 0.6),
        permanent("ASD-5a'", "D + F + H - 0.6W", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Wind, -0.6),
        permanent("ASD-5b", "D + F + H + 0.7E", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Seismic, 0.7),

        // 6a. D + F + H + 0.75(0.6W) + 0.75L + 0.75(Lr or S or R)
        permanent("ASD-6a", "D + F + H + 0.75L + 0.45W + 0.75Lr", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, 0.45)
            .with_factor(LoadType::RoofLive, 0.75),
        permanent("ASD-6a'", "D + F + H + 0.75L - 0.45W + 0.75Lr", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, -0.45)
            .with_factor(LoadType::RoofLive, 0.75),
        permanent("ASD-6b", "D + F + H + 0.75L + 0.45W + 0.75S", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, 0.45)
            .with_factor(LoadType::Snow, 0.75),
        permanent("ASD-6b'", "D + F + H + 0.75L - 0.45W + 0.75S", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, -0.45)
            .with_factor(LoadType::Snow, 0.75),
        permanent("ASD-6c", "D + F + H + 0.75L + 0.45W + 0.75R", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, 0.45)
            .with_factor(LoadType::Rain, 0.75),
        permanent("ASD-6c'", "D + F + H + 0.75L - 0.45W + 0.75R", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Wind, -0.45)
            .with_factor(LoadType::Rain, 0.75),

        // 6b. D + F + H + 0.75(0.7E) + 0.75L + 0.75S
        permanent("ASD-6d", "D + F + H + 0.75L + 0.525E + 0.75S", 1.0, 1.0, 1.0)
            .with_factor(LoadType::Live, 0.75)
            .with_factor(LoadType::Seismic, 0.525)
            .with_factor(LoadType::Snow, 0.75),

        // 7. 0.6D + 0.6W + H
        permanent("ASD-7", "0.6D + 0.6W + H", 0.6, 0.0, 1.0)
            .with_factor(LoadType::Wind, 0.6),
        permanent("ASD-7'", "0.6D - 0.6W + H", 0.6, 0.0, 1.0)
            .with_factor(LoadType::Wind, -0.6),

        // 8. 0.6(D + F) + 0.7E + H
        permanent("ASD-8", "0.6D + 0.6F + 0.7E + H", 0.6, 0.6, 1.0)
            .with_factor(LoadType::Seismic, 0.7),
    ]
}

/// ASCE 7 LRFD load combinations (Section 2.3.1)
///
/// # Example
/// ```
/// use beam_core::loads::{asce7_lrfd_combinations, LoadType};
///
/// let combos = asce7_lrfd_combinations();
/// let lrfd1 = combos.iter().find(|c| c.name == "LRFD-1").unwrap();
/// assert_eq!(lrfd1.get_factor(LoadType::Dead), 1.4);
/// ```
pub fn asce7_lrfd_combinations() -> Vec<LoadCombination> {
    vec![
        // 1. 1.4(D + F)
        permanent("LRFD-1", "1.4D + 1.4F", 1.4, 1.4, 0.0),

        // 2. 1.2(D + F) + 1.6(L + H) + 0.5(Lr or S or R)
        permanent("LRFD-2a", "1.2D + 1.2F + 1.6L + 1.6H + 0.5Lr", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Live, 1.6)
            .with_factor(LoadType::RoofLive, 0.5),
        permanent("LRFD-2b", "1.2D + 1.2F + 1.6L + 1.6H + 0.5S", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Live, 1.6)
            .with_factor(LoadType::Snow, 0.5),
        permanent("LRFD-2c", "1.2D + 1.2F + 1.6L + 1.6H + 0.5R", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Live, 1.6)
            .with_factor(LoadType::Rain, 0.5),

        // 3. 1.2(D + F) + 1.6(Lr or S or R) + 1.6H + (L or 0.5W)
        permanent("LRFD-3a", "1.2D + 1.2F + 1.6Lr + 1.6H + L", 1.2, 1.2, 1.6)
            .with_factor(LoadType::RoofLive, 1.6)
            .with_factor(LoadType::Live, 1.0),
        permanent("LRFD-3b", "1.2D + 1.2F + 1.6Lr + 1.6H + 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::RoofLive, 1.6)
            .with_factor(LoadType::Wind, 0.5),
        permanent("LRFD-3b'", "1.2D + 1.2F + 1.6Lr + 1.6H - 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::RoofLive, 1.6)
            .with_factor(LoadType::Wind, -0.5),
        permanent("LRFD-3c", "1.2D + 1.2F + 1.6S + 1.6H + L", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Snow, 1.6)
            .with_factor(LoadType::Live, 1.0),
        permanent("LRFD-3d", "1.2D + 1.2F + 1.6S + 1.6H + 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Snow, 1.6)
            .with_factor(LoadType::Wind, 0.5),
        permanent("LRFD-3d'", "1.2D + 1.2F + 1.6S + 1.6H - 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Snow, 1.6)
            .with_factor(LoadType::Wind, -0.5),
        permanent("LRFD-3e", "1.2D + 1.2F + 1.6R + 1.6H + L", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Rain, 1.6)
            .with_factor(LoadType::Live, 1.0),
        permanent("LRFD-3f", "1.2D + 1.2F + 1.6R + 1.6H + 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Rain, 1.6)
            .with_factor(LoadType::Wind, 0.5),
        permanent("LRFD-3f'", "1.2D + 1.2F + 1.6R + 1.6H - 0.5W", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Rain, 1.6)
            .with_factor(LoadType::Wind, -0.5),

        // 4. 1.2(D + F) + 1.0W + L + 1.6H + 0.5(Lr or S or R)
        permanent("LRFD-4a", "1.2D + 1.2F + 1.0W + L + 1.6H + 0.5Lr", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, 1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::RoofLive, 0.5),
        permanent("LRFD-4a'", "1.2D + 1.2F - 1.0W + L + 1.6H + 0.5Lr", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, -1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::RoofLive, 0.5),
        permanent("LRFD-4b", "1.2D + 1.2F + 1.0W + L + 1.6H + 0.5S", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, 1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::Snow, 0.5),
        permanent("LRFD-4b'", "1.2D + 1.2F - 1.0W + L + 1.6H + 0.5S", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, -1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::Snow, 0.5),
        permanent("LRFD-4c", "1.2D + 1.2F + 1.0W + L + 1.6H + 0.5R", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, 1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::Rain, 0.5),
        permanent("LRFD-4c'", "1.2D + 1.2F - 1.0W + L + 1.6H + 0.5R", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Wind, -1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::Rain, 0.5),

        // 5. 1.2(D + F) + 1.0E + L + 0.2S + 1.6H
        permanent("LRFD-5", "1.2D + 1.2F + 1.0E + L + 0.2S + 1.6H", 1.2, 1.2, 1.6)
            .with_factor(LoadType::Seismic, 1.0)
            .with_factor(LoadType::Live, 1.0)
            .with_factor(LoadType::Snow, 0.2),

        // 6. 0.9D + 1.0W + 1.6H
        permanent("LRFD-6", "0.9D + 1.0W + 1.6H", 0.9, 0.0, 1.6)
            .with_factor(LoadType::Wind, 1.0),
        permanent("LRFD-6'", "0.9D - 1.0W + 1.6H", 0.9, 0.0, 1.6)
            .with_factor(LoadType::Wind, -1.0),

        // 7. 0.9(D + F) + 1.0E + 1.6H
        permanent("LRFD-7", "0.9D + 0.9F + 1.0E + 1.6H", 0.9, 0.9, 1.6)
            .with_factor(LoadType::Seismic, 1.0),
    ]
}

static COMBINATION_SETS: Lazy<HashMap<&'static str, Vec<LoadCombination>>> = Lazy::new(|| {
    let mut sets = HashMap::new();
    sets.insert(SERVICE_SET, service_combinations());
    sets.insert(ASD_SET, asce7_asd_combinations());
    sets.insert(LRFD_SET, asce7_lrfd_combinations());
    sets
});

/// Look up a combination set by name.
///
/// # Example
/// ```
/// use beam_core::loads::combination_set;
///
/// let rows = combination_set("asce7-lrfd").unwrap();
/// assert_eq!(rows[0].name, "LRFD-1");
/// assert!(combination_set("eurocode").is_err());
/// ```
pub fn combination_set(name: &str) -> CalcResult<&'static [LoadCombination]> {
    COMBINATION_SETS
        .get(name)
        .map(|rows| rows.as_slice())
        .ok_or_else(|| {
            CalcError::invalid_input(
                "combination_set",
                name,
                format!("Unknown combination set (expected one of: {})", combination_set_names().join(", ")),
            )
        })
}

/// Names of every registered combination set, sorted
pub fn combination_set_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMBINATION_SETS.keys().copied().collect();
    names.sort_unstable();
    names
}

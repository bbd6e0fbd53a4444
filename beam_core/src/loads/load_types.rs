//! Load type definitions
//!
//! The nine load categories of ASCE 7 that a beam carries, plus the
//! aggregate service slot. Per-type tables throughout the crate are plain
//! `[T; NUM_LOAD_SLOTS]` arrays indexed by [`LoadType::slot`], with slot
//! [`AGGREGATE_SLOT`] holding the unfactored sum of every load.

use serde::{Deserialize, Serialize};

/// Number of per-type slots (aggregate + nine load types)
pub const NUM_LOAD_SLOTS: usize = 10;

/// Slot holding the aggregate (unfactored, all types) service load
pub const AGGREGATE_SLOT: usize = 0;

/// A value per load slot
pub type LoadTable = [f64; NUM_LOAD_SLOTS];

/// Load types per ASCE 7 Section 2
///
/// # Example
/// ```
/// use beam_core::loads::LoadType;
///
/// let live = LoadType::Live;
/// assert_eq!(live.code(), "L");
/// assert_eq!(live.slot(), 3);
/// assert!(live.is_patternable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadType {
    /// D - Dead load (self-weight of structure and permanent attachments)
    Dead,
    /// F - Fluid pressure
    Fluid,
    /// L - Live load (floor live load, occupancy)
    Live,
    /// H - Lateral earth pressure, groundwater pressure
    Horizontal,
    /// Lr - Roof live load (maintenance, workers)
    RoofLive,
    /// S - Snow load
    Snow,
    /// R - Rain load
    Rain,
    /// W - Wind load
    Wind,
    /// E - Seismic (earthquake) load
    Seismic,
}

impl LoadType {
    /// All load types in slot order
    pub const ALL: [LoadType; 9] = [
        LoadType::Dead,
        LoadType::Fluid,
        LoadType::Live,
        LoadType::Horizontal,
        LoadType::RoofLive,
        LoadType::Snow,
        LoadType::Rain,
        LoadType::Wind,
        LoadType::Seismic,
    ];

    /// Load types whose effects are patterned span by span
    pub const PATTERNABLE: [LoadType; 3] = [LoadType::Live, LoadType::RoofLive, LoadType::Snow];

    /// Index into a [`LoadTable`] (1..=9; 0 is the aggregate)
    pub fn slot(&self) -> usize {
        match self {
            LoadType::Dead => 1,
            LoadType::Fluid => 2,
            LoadType::Live => 3,
            LoadType::Horizontal => 4,
            LoadType::RoofLive => 5,
            LoadType::Snow => 6,
            LoadType::Rain => 7,
            LoadType::Wind => 8,
            LoadType::Seismic => 9,
        }
    }

    /// Inverse of [`LoadType::slot`]
    pub fn from_slot(slot: usize) -> Option<LoadType> {
        LoadType::ALL.iter().copied().find(|t| t.slot() == slot)
    }

    /// Standard abbreviation code (D, F, L, H, Lr, S, R, W, E)
    ///
    /// # Example
    /// ```
    /// use beam_core::loads::LoadType;
    /// assert_eq!(LoadType::RoofLive.code(), "Lr");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            LoadType::Dead => "D",
            LoadType::Fluid => "F",
            LoadType::Live => "L",
            LoadType::Horizontal => "H",
            LoadType::RoofLive => "Lr",
            LoadType::Snow => "S",
            LoadType::Rain => "R",
            LoadType::Wind => "W",
            LoadType::Seismic => "E",
        }
    }

    /// Parse a code as written in combination equations (case-sensitive for `Lr`)
    pub fn from_code(code: &str) -> Option<LoadType> {
        LoadType::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadType::Dead => "Dead load",
            LoadType::Fluid => "Fluid pressure",
            LoadType::Live => "Live load",
            LoadType::Horizontal => "Lateral earth pressure",
            LoadType::RoofLive => "Roof live load",
            LoadType::Snow => "Snow load",
            LoadType::Rain => "Rain load",
            LoadType::Wind => "Wind load",
            LoadType::Seismic => "Seismic load",
        }
    }

    /// Whether this load is placed span by span when patterning is active
    pub fn is_patternable(&self) -> bool {
        matches!(self, LoadType::Live | LoadType::RoofLive | LoadType::Snow)
    }

    /// Whether spans next to a loaded pattern carry half of this load
    pub fn has_half_adjacent_loading(&self) -> bool {
        matches!(self, LoadType::Snow)
    }

    /// Whether this load type can act in either direction
    pub fn is_directional(&self) -> bool {
        matches!(self, LoadType::Wind | LoadType::Seismic)
    }
}

impl std::fmt::Display for LoadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_type_codes() {
        assert_eq!(LoadType::Dead.code(), "D");
        assert_eq!(LoadType::Fluid.code(), "F");
        assert_eq!(LoadType::Live.code(), "L");
        assert_eq!(LoadType::Horizontal.code(), "H");
        assert_eq!(LoadType::RoofLive.code(), "Lr");
        assert_eq!(LoadType::Snow.code(), "S");
        assert_eq!(LoadType::Rain.code(), "R");
        assert_eq!(LoadType::Wind.code(), "W");
        assert_eq!(LoadType::Seismic.code(), "E");
    }

    #[test]
    fn test_slots_are_one_based_and_unique() {
        let mut seen = [false; NUM_LOAD_SLOTS];
        for t in LoadType::ALL {
            assert_ne!(t.slot(), AGGREGATE_SLOT);
            assert!(!seen[t.slot()], "duplicate slot for {}", t);
            seen[t.slot()] = true;
            assert_eq!(LoadType::from_slot(t.slot()), Some(t));
        }
        assert_eq!(LoadType::from_slot(AGGREGATE_SLOT), None);
    }

    #[test]
    fn test_patternable() {
        for t in LoadType::ALL {
            assert_eq!(t.is_patternable(), LoadType::PATTERNABLE.contains(&t));
        }
        assert!(LoadType::Snow.has_half_adjacent_loading());
        assert!(!LoadType::Live.has_half_adjacent_loading());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(LoadType::from_code("Lr"), Some(LoadType::RoofLive));
        assert_eq!(LoadType::from_code("X"), None);
    }

    #[test]
    fn test_serialization() {
        let load = LoadType::RoofLive;
        let json = serde_json::to_string(&load).unwrap();
        assert_eq!(json, "\"RoofLive\"");

        let parsed: LoadType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LoadType::RoofLive);
    }
}

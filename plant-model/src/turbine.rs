use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Wind speed band in which a turbine is allowed to run.
///
/// Both bounds are inclusive: a turbine may operate on a day when
/// `min_kmh <= speed <= max_kmh`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./turbine.ts")]
pub struct WindBand {
    /// Cut-in speed in km/h.
    pub min_kmh: f64,
    /// Cut-out speed in km/h.
    pub max_kmh: f64,
}

impl WindBand {
    /// Create a new band with validation
    pub fn new(min_kmh: f64, max_kmh: f64) -> Result<Self, String> {
        if !min_kmh.is_finite() || !max_kmh.is_finite() {
            return Err(format!(
                "Invalid wind band: [{}, {}]. Bounds must be finite",
                min_kmh, max_kmh
            ));
        }
        if min_kmh < 0.0 || min_kmh > max_kmh {
            return Err(format!(
                "Invalid wind band: [{}, {}]. Expected 0 <= min <= max",
                min_kmh, max_kmh
            ));
        }

        Ok(WindBand { min_kmh, max_kmh })
    }

    /// Check whether a wind speed lies inside the band (inclusive)
    pub fn contains(&self, speed_kmh: f64) -> bool {
        self.min_kmh <= speed_kmh && speed_kmh <= self.max_kmh
    }
}

impl Default for WindBand {
    fn default() -> Self {
        Self {
            min_kmh: 12.6,
            max_kmh: 90.0,
        }
    }
}

/// A wind turbine of the plant.
///
/// All turbines of a plant share the same description; they only differ in the
/// wind they see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./turbine.ts")]
#[serde(default)]
pub struct WindTurbine {
    /// Maximum energy the turbine delivers in one day (MWh).
    pub max_output_mwh: f64,
    /// Maintenance cost for every day the turbine is committed to run ($).
    pub maintenance_cost: f64,
    /// Operable wind band.
    pub wind_band: WindBand,
}

impl Default for WindTurbine {
    fn default() -> Self {
        Self {
            max_output_mwh: 90.0,
            maintenance_cost: 130_000.0,
            wind_band: WindBand::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_band_bounds_are_inclusive() {
        let band = WindBand::new(12.6, 90.0).unwrap();
        assert!(band.contains(12.6));
        assert!(band.contains(90.0));
        assert!(band.contains(45.0));
        assert!(!band.contains(12.59));
        assert!(!band.contains(90.01));
    }

    #[test]
    fn test_wind_band_rejects_inverted_bounds() {
        assert!(WindBand::new(30.0, 10.0).is_err());
        assert!(WindBand::new(-1.0, 10.0).is_err());
        assert!(WindBand::new(0.0, f64::NAN).is_err());
    }
}

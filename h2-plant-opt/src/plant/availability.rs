use plant_model::turbine::WindBand;

use crate::error::{InputError, ModelError};
use crate::general::wind_data::WindTable;

/// Which turbine may run on which day.
///
/// `is_available(m, t)` holds exactly when the wind speed of turbine `m` on
/// day `t` lies in the operable band, bounds included.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityMask {
    turbines: usize,
    days: usize,
    available: Vec<bool>,
}

impl AvailabilityMask {
    /// Derive the mask from a wind table, which must cover `turbines x days`
    pub fn compute(
        wind: &WindTable,
        band: &WindBand,
        turbines: usize,
        days: usize,
    ) -> Result<Self, InputError> {
        wind.ensure_shape(turbines, days)?;

        let mut available = Vec::with_capacity(turbines * days);
        for turbine in 0..turbines {
            for day in 0..days {
                let speed = wind
                    .speed(turbine, day)
                    .ok_or(InputError::MissingSample { turbine, day })?;
                available.push(band.contains(speed));
            }
        }

        Ok(Self {
            turbines,
            days,
            available,
        })
    }

    pub fn turbines(&self) -> usize {
        self.turbines
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn is_available(&self, turbine: usize, day: usize) -> Result<bool, ModelError> {
        if turbine >= self.turbines {
            return Err(ModelError::IndexOutOfRange {
                set: "turbine",
                index: turbine,
                size: self.turbines,
            });
        }
        if day >= self.days {
            return Err(ModelError::IndexOutOfRange {
                set: "day",
                index: day,
                size: self.days,
            });
        }
        Ok(self.available[turbine * self.days + day])
    }

    /// Number of days on which a turbine may run
    pub fn available_days(&self, turbine: usize) -> usize {
        if turbine >= self.turbines {
            return 0;
        }
        self.available[turbine * self.days..(turbine + 1) * self.days]
            .iter()
            .filter(|&&a| a)
            .count()
    }

    /// Whether no turbine can run on any day
    pub fn is_never_available(&self) -> bool {
        !self.available.iter().any(|&a| a)
    }
}

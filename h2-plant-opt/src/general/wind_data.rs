use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use serde::Deserialize;

use crate::error::InputError;

/// Daily wind speed (km/h) seen by every turbine of the plant.
///
/// The table always covers the full `turbines x days` grid; it cannot be
/// constructed with holes.
#[derive(Debug, Clone, PartialEq)]
pub struct WindTable {
    turbines: usize,
    days: usize,
    speeds: Vec<f64>, // row-major, one row per turbine
}

/// A single row of a long-format wind CSV file
#[derive(Debug, Deserialize)]
struct WindRecord {
    turbine: usize,
    day: usize,
    speed_kmh: f64,
}

impl WindTable {
    /// Build a table from one row of daily speeds per turbine
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, InputError> {
        let turbines = rows.len();
        let days = rows.first().map_or(0, Vec::len);

        let mut speeds = Vec::with_capacity(turbines * days);
        for (turbine, row) in rows.into_iter().enumerate() {
            if row.len() != days {
                return Err(InputError::RaggedRow {
                    turbine,
                    days,
                    found_days: row.len(),
                });
            }
            for (day, speed) in row.into_iter().enumerate() {
                check_speed(turbine, day, speed)?;
                speeds.push(speed);
            }
        }

        Ok(Self {
            turbines,
            days,
            speeds,
        })
    }

    /// Build a table from individual `(turbine, day, speed)` samples.
    ///
    /// Every cell of the `turbines x days` grid must be given exactly once.
    pub fn from_samples<I>(turbines: usize, days: usize, samples: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut cells: Vec<Option<f64>> = vec![None; turbines * days];
        for (turbine, day, speed) in samples {
            if turbine >= turbines || day >= days {
                return Err(InputError::SampleOutOfRange {
                    turbine,
                    day,
                    turbines,
                    days,
                });
            }
            check_speed(turbine, day, speed)?;
            let cell = &mut cells[turbine * days + day];
            if cell.is_some() {
                return Err(InputError::DuplicateSample { turbine, day });
            }
            *cell = Some(speed);
        }

        let speeds = cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.ok_or(InputError::MissingSample {
                    turbine: i / days,
                    day: i % days,
                })
            })
            .collect::<Result<Vec<f64>, InputError>>()?;

        Ok(Self {
            turbines,
            days,
            speeds,
        })
    }

    /// Same speed for every turbine on every day
    pub fn uniform(turbines: usize, days: usize, speed_kmh: f64) -> Result<Self, InputError> {
        Self::from_rows(vec![vec![speed_kmh; days]; turbines])
    }

    pub fn turbines(&self) -> usize {
        self.turbines
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// Wind speed for a turbine on a day, `None` outside the table
    pub fn speed(&self, turbine: usize, day: usize) -> Option<f64> {
        if turbine < self.turbines && day < self.days {
            Some(self.speeds[turbine * self.days + day])
        } else {
            None
        }
    }

    /// Fail unless the table covers exactly the expected index sets
    pub fn ensure_shape(&self, turbines: usize, days: usize) -> Result<(), InputError> {
        if self.turbines != turbines || self.days != days {
            return Err(InputError::ShapeMismatch {
                turbines,
                days,
                found_turbines: self.turbines,
                found_days: self.days,
            });
        }
        Ok(())
    }
}

fn check_speed(turbine: usize, day: usize, speed: f64) -> Result<(), InputError> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(InputError::InvalidSpeed {
            turbine,
            day,
            speed,
        });
    }
    Ok(())
}

/// Load a wind table from a file, choosing the format from the extension.
///
/// * `.csv` - long format with a `turbine,day,speed_kmh` header
/// * `.xlsx`, `.xls`, `.ods` - first sheet, one row per day and one column per turbine
pub fn load_wind_table(path: &Path, turbines: usize, days: usize) -> Result<WindTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let table = match extension.as_deref() {
        Some("csv") => load_wind_csv(path, turbines, days)?,
        Some("xlsx" | "xls" | "ods") => load_wind_sheet(path)?,
        _ => return Err(anyhow!("Unsupported wind data file: {}", path.display())),
    };
    table.ensure_shape(turbines, days)?;

    log::info!(
        "Loaded wind speeds for {} turbines over {} days from {}",
        table.turbines(),
        table.days(),
        path.display()
    );
    Ok(table)
}

/// Load a long-format CSV file with a `turbine,day,speed_kmh` header
pub fn load_wind_csv(path: &Path, turbines: usize, days: usize) -> Result<WindTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut samples = Vec::with_capacity(turbines * days);
    for (line_num, record) in reader.deserialize::<WindRecord>().enumerate() {
        // +2 for the header and 1-based numbering
        let record = record.with_context(|| {
            format!("Failed to parse line {} of {}", line_num + 2, path.display())
        })?;
        samples.push((record.turbine, record.day, record.speed_kmh));
    }

    Ok(WindTable::from_samples(turbines, days, samples)?)
}

/// Load the first sheet of a workbook: one row per day, one column per turbine.
///
/// A first row that does not parse as numbers is treated as a header.
pub fn load_wind_sheet(path: &Path) -> Result<WindTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no sheets: {}", path.display()))?
        .with_context(|| format!("Failed to read first sheet of {}", path.display()))?;

    let mut days: Vec<Vec<f64>> = Vec::new();
    for (row_num, row) in range.rows().enumerate() {
        let parsed: Option<Vec<f64>> = row.iter().map(cell_as_f64).collect();
        match parsed {
            Some(values) => days.push(values),
            None if row_num == 0 => continue,
            None => {
                return Err(anyhow!(
                    "Non-numeric wind speed on row {} of {}",
                    row_num + 1,
                    path.display()
                ));
            }
        }
    }

    // The sheet is day-major, the table is turbine-major
    let turbines = days.first().map_or(0, Vec::len);
    let rows = (0..turbines)
        .map(|turbine| days.iter().map(|day| day.get(turbine).copied()).collect())
        .collect::<Option<Vec<Vec<f64>>>>()
        .ok_or_else(|| anyhow!("Rows of {} have different lengths", path.display()))?;

    Ok(WindTable::from_rows(rows)?)
}

fn cell_as_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_detects_missing_sample() {
        let samples = vec![(0, 0, 10.0), (0, 1, 20.0), (1, 0, 30.0)];
        let result = WindTable::from_samples(2, 2, samples);
        assert_eq!(
            result,
            Err(InputError::MissingSample { turbine: 1, day: 1 })
        );
    }

    #[test]
    fn test_from_samples_rejects_duplicates_and_out_of_range() {
        let duplicate = vec![(0, 0, 10.0), (0, 0, 11.0)];
        assert_eq!(
            WindTable::from_samples(1, 1, duplicate),
            Err(InputError::DuplicateSample { turbine: 0, day: 0 })
        );

        let out_of_range = vec![(0, 3, 10.0)];
        assert!(matches!(
            WindTable::from_samples(1, 2, out_of_range),
            Err(InputError::SampleOutOfRange { day: 3, .. })
        ));
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_negative() {
        assert_eq!(
            WindTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]]),
            Err(InputError::RaggedRow {
                turbine: 2,
                days: 2,
                found_days: 1
            })
        );
        assert!(matches!(
            WindTable::from_rows(vec![vec![1.0, -2.0]]),
            Err(InputError::InvalidSpeed { day: 1, .. })
        ));
    }

    #[test]
    fn test_speed_lookup() {
        let table = WindTable::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(table.speed(1, 2), Some(6.0));
        assert_eq!(table.speed(2, 0), None);
        assert!(table.ensure_shape(2, 3).is_ok());
        assert!(table.ensure_shape(2, 4).is_err());
    }

    #[test]
    fn test_load_wind_csv() {
        let test_data = "turbine,day,speed_kmh\n0,0,12.6\n0,1, 95.0\n1,1,40\n1,0,5.5\n";
        let temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(&temp_file, test_data).unwrap();

        let table = load_wind_table(temp_file.path(), 2, 2).unwrap();
        assert_eq!(table.speed(0, 0), Some(12.6));
        assert_eq!(table.speed(0, 1), Some(95.0));
        assert_eq!(table.speed(1, 0), Some(5.5));
        assert_eq!(table.speed(1, 1), Some(40.0));
    }

    #[test]
    fn test_load_wind_csv_fails_on_missing_day() {
        let test_data = "turbine,day,speed_kmh\n0,0,12.6\n";
        let temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::fs::write(&temp_file, test_data).unwrap();

        assert!(load_wind_table(temp_file.path(), 1, 2).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert!(load_wind_table(temp_file.path(), 1, 1).is_err());
    }
}

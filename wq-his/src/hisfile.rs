//! History-file container access.

use crate::error::{HisError, Result};
use crate::time::{decode_times, TimeEncoding};
use chrono::NaiveDateTime;
use log::debug;
use std::path::Path;

/// Name of the time axis variable.
const TIME_VAR: &str = "time";

/// Variables stored without a long name; they resolve to themselves.
const BARE_KEYS: [&str; 2] = ["salinity", "temperature"];

/// Open handle to a model history file.
pub struct HisFile {
    file: netcdf::File,
}

impl HisFile {
    /// Opens a history file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = netcdf::open(path)?;
        Ok(HisFile { file })
    }

    /// Decodes the time axis into calendar timestamps.
    ///
    /// The result has one entry per stored axis position. A missing
    /// time variable, a missing units attribute and an undecodable
    /// units string each fail with their own error.
    pub fn times(&self) -> Result<Vec<NaiveDateTime>> {
        let var = self
            .file
            .variable(TIME_VAR)
            .ok_or_else(|| HisError::MissingVariable(TIME_VAR.to_string()))?;
        let units = match var.attribute_value("units") {
            Some(value) => match value? {
                netcdf::AttributeValue::Str(s) => s,
                _ => {
                    return Err(HisError::MissingUnits(TIME_VAR.to_string()));
                }
            },
            None => return Err(HisError::MissingUnits(TIME_VAR.to_string())),
        };
        let encoding = TimeEncoding::parse(&units)?;
        let offsets: Vec<f64> = var.get_values(..)?;
        debug!("decoded {} axis positions ({})", offsets.len(), units);
        Ok(decode_times(&offsets, &encoding))
    }

    /// Resolves the stored variable name for a display name.
    ///
    /// Most water-quality variables are looked up through their
    /// `long_name` attribute. Salinity and temperature carry no long
    /// name and resolve to their own key.
    pub fn variable_key(&self, var_name: &str) -> Result<String> {
        if BARE_KEYS.contains(&var_name) {
            return if self.file.variable(var_name).is_some() {
                Ok(var_name.to_string())
            } else {
                Err(HisError::MissingVariable(var_name.to_string()))
            };
        }
        for var in self.file.variables() {
            if let Some(Ok(netcdf::AttributeValue::Str(long_name))) =
                var.attribute_value("long_name")
            {
                if long_name == var_name {
                    return Ok(var.name());
                }
            }
        }
        Err(HisError::MissingVariable(var_name.to_string()))
    }

    /// Reads the series of one station from a `(time, station)`
    /// variable, length-aligned with the time axis. A variable with a
    /// plain `(time)` shape is returned whole.
    pub fn station_series(&self, key: &str, station: usize) -> Result<Vec<f64>> {
        let var = self
            .file
            .variable(key)
            .ok_or_else(|| HisError::MissingVariable(key.to_string()))?;
        let dims = var.dimensions();
        match dims.len() {
            1 => Ok(var.get_values(..)?),
            2 => {
                let count = dims[1].len();
                if station >= count {
                    return Err(HisError::StationOutOfRange {
                        name: key.to_string(),
                        station,
                        count,
                    });
                }
                Ok(var.get_values((.., station))?)
            }
            rank => Err(HisError::UnsupportedShape {
                name: key.to_string(),
                rank,
            }),
        }
    }
}

/// Error types for history-file access
use thiserror::Error;

/// Main error type for history-file operations
#[derive(Debug, Error)]
pub enum HisError {
    /// NetCDF library error
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// Requested variable is not stored in the file
    #[error("Missing variable: {0}")]
    MissingVariable(String),

    /// Variable has no units attribute
    #[error("Variable {0} has no units attribute")]
    MissingUnits(String),

    /// Units attribute could not be decoded
    #[error("Undecodable time units {units:?}: {reason}")]
    UnitParse { units: String, reason: String },

    /// Station index beyond the station dimension
    #[error("Station index {station} out of range for {name} ({count} stations)")]
    StationOutOfRange {
        name: String,
        station: usize,
        count: usize,
    },

    /// Variable does not have the expected (time) or (time, station) shape
    #[error("Variable {name} has unsupported rank {rank}")]
    UnsupportedShape { name: String, rank: usize },
}

/// Type alias for Results using HisError
pub type Result<T> = std::result::Result<T, HisError>;

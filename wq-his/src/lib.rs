//! Reader for model history files.
//!
//! A history file is a NetCDF container holding time-indexed station
//! variables. This crate decodes the time axis into calendar
//! timestamps, resolves variables by their long name, and extracts
//! per-station series.

pub mod error;
pub mod hisfile;
pub mod time;

pub use error::{HisError, Result};
pub use hisfile::HisFile;
pub use time::{decode_times, TimeEncoding, TimeUnit};

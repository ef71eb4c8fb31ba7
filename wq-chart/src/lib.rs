//! Comparison charts of model output against observations.
//!
//! Both chart kinds consume already-fetched series plus a static
//! configuration and render to a file; no state is retained between
//! calls.

pub mod overlay;
pub mod timeseries;

pub use overlay::{plot_overlay, DotObs, GridCell, OverlayConfig};
pub use timeseries::{plot_timeseries, MapExtent, TimeSeriesConfig};

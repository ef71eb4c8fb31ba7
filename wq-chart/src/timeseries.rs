//! Station time-series chart with a locator map.
//!
//! Observations are drawn as grey dots, the model run as a red line,
//! with a small coordinate map on the right marking the station.

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::full_palette::GREY;
use std::path::Path;

/// Geographic bounds of the locator map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapExtent {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Default for MapExtent {
    // North Sea region, the default view of the source data
    fn default() -> Self {
        MapExtent {
            lon_min: -5.0,
            lon_max: 15.0,
            lat_min: 50.0,
            lat_max: 65.0,
        }
    }
}

/// Optional settings of the time-series chart.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesConfig {
    /// Caption over the locator map
    pub title: Option<String>,
    /// Bounds of the locator map; defaults to the North Sea view
    pub map_extent: Option<MapExtent>,
    /// Lower bound of the value axis
    pub min_value: f64,
}

/// Renders the chart to a bitmap file at `path`.
pub fn plot_timeseries(
    path: impl AsRef<Path>,
    station_name: &str,
    y_label: &str,
    obs: &[(NaiveDateTime, f64)],
    model: &[(NaiveDateTime, f64)],
    station_loc: (f64, f64),
    config: &TimeSeriesConfig,
) -> Result<()> {
    let path = path.as_ref();
    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    draw_timeseries(&root, station_name, y_label, obs, model, station_loc, config)?;
    root.present()
        .map_err(|e| anyhow!("failed to write chart: {e}"))?;
    info!("wrote time-series chart {}", path.display());
    Ok(())
}

/// Draws onto an existing drawing area. Split out so tests can render
/// into an in-memory SVG backend.
pub fn draw_timeseries<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    station_name: &str,
    y_label: &str,
    obs: &[(NaiveDateTime, f64)],
    model: &[(NaiveDateTime, f64)],
    station_loc: (f64, f64),
    config: &TimeSeriesConfig,
) -> Result<()> {
    root.fill(&WHITE)
        .map_err(|e| anyhow!("failed to fill chart background: {e}"))?;

    // timeseries on the left two thirds, locator map on the right
    let split_at = root.dim_in_pixel().0 as i32 * 2 / 3;
    let (left, right) = root.split_horizontally(split_at);

    let (t_min, t_max) = time_bounds(obs, model);
    let y_max = value_bound(obs, model, config.min_value);
    let x_range: RangedDateTime<NaiveDateTime> = (t_min..t_max).into();

    let mut chart = ChartBuilder::on(&left)
        .margin(20i32)
        .caption(station_name, ("sans-serif", 20))
        .x_label_area_size(30u32)
        .y_label_area_size(50u32)
        .build_cartesian_2d(x_range, config.min_value..y_max)
        .map_err(|e| anyhow!("failed to build time axis: {e}"))?;
    chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|t| t.format("%b%y").to_string())
        .y_desc(y_label)
        .draw()
        .map_err(|e| anyhow!("failed to draw chart mesh: {e}"))?;

    chart
        .draw_series(
            obs.iter()
                .map(|&(t, v)| Circle::new((t, v), 4, GREY.filled())),
        )
        .map_err(|e| anyhow!("failed to draw observations: {e}"))?
        .label("obs")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, GREY.filled()));

    chart
        .draw_series(LineSeries::new(model.iter().copied(), &RED))
        .map_err(|e| anyhow!("failed to draw model series: {e}"))?
        .label("sim")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| anyhow!("failed to draw legend: {e}"))?;

    let extent = config.map_extent.clone().unwrap_or_default();
    let mut map_builder = ChartBuilder::on(&right);
    map_builder
        .margin(20i32)
        .x_label_area_size(30u32)
        .y_label_area_size(40u32);
    if let Some(title) = &config.title {
        map_builder.caption(title, ("sans-serif", 20));
    }
    let mut map = map_builder
        .build_cartesian_2d(
            extent.lon_min..extent.lon_max,
            extent.lat_min..extent.lat_max,
        )
        .map_err(|e| anyhow!("failed to build locator map: {e}"))?;
    map.configure_mesh()
        .draw()
        .map_err(|e| anyhow!("failed to draw locator map mesh: {e}"))?;
    map.draw_series(std::iter::once(Circle::new(station_loc, 5, RED.filled())))
        .map_err(|e| anyhow!("failed to draw station marker: {e}"))?;

    Ok(())
}

fn time_bounds(
    obs: &[(NaiveDateTime, f64)],
    model: &[(NaiveDateTime, f64)],
) -> (NaiveDateTime, NaiveDateTime) {
    let mut times = obs.iter().chain(model.iter()).map(|&(t, _)| t);
    match times.next() {
        Some(first) => {
            let (min, max) = times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
            if min == max {
                // a single sample still needs a non-degenerate axis
                (min, max + chrono::Duration::days(1))
            } else {
                (min, max)
            }
        }
        None => {
            let epoch = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            (epoch, epoch + chrono::Duration::days(1))
        }
    }
}

fn value_bound(obs: &[(NaiveDateTime, f64)], model: &[(NaiveDateTime, f64)], floor: f64) -> f64 {
    let max = obs
        .iter()
        .chain(model.iter())
        .map(|&(_, v)| v)
        .fold(floor, f64::max);
    if max > floor {
        max * 1.05
    } else {
        floor + 1.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn sample(day: u32, value: f64) -> (NaiveDateTime, f64) {
        (
            NaiveDate::from_ymd_opt(2021, 6, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            value,
        )
    }

    #[test]
    fn test_draws_into_svg() {
        let obs = vec![sample(1, 0.4), sample(10, 0.6)];
        let model = vec![sample(1, 0.5), sample(5, 0.55), sample(10, 0.45)];
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (1200, 600)).into_drawing_area();
            draw_timeseries(
                &root,
                "NOORDWK2",
                "DIN [mg/l]",
                &obs,
                &model,
                (4.3, 52.2),
                &TimeSeriesConfig::default(),
            )
            .unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains("<svg"));
        assert!(svg.contains("circle"));
    }

    #[test]
    fn test_empty_series_still_renders() {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (1200, 600)).into_drawing_area();
            draw_timeseries(
                &root,
                "NOORDWK2",
                "DIN [mg/l]",
                &[],
                &[],
                (4.3, 52.2),
                &TimeSeriesConfig {
                    title: Some("winter mean".to_string()),
                    map_extent: Some(MapExtent {
                        lon_min: 0.0,
                        lon_max: 10.0,
                        lat_min: 50.0,
                        lat_max: 55.0,
                    }),
                    min_value: 0.0,
                },
            )
            .unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_time_bounds_of_single_sample_are_widened() {
        let obs = vec![sample(1, 0.4)];
        let (lo, hi) = time_bounds(&obs, &[]);
        assert!(lo < hi);
    }
}

//! Map of gridded model output with observations overlaid as dots.
//!
//! Model cells are filled polygons and observations small outlined
//! dots, both colored on the same scale so that disagreement between
//! the two is visible directly.

use anyhow::{anyhow, bail, Result};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};
use std::path::Path;

/// One model grid cell: its corner coordinates and cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub vertices: Vec<(f64, f64)>,
    pub value: f64,
}

/// One observation drawn on top of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotObs {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Optional settings of the overlay map.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    /// Caption over the map
    pub title: Option<String>,
    /// Longitude axis limits; derived from the data when unset
    pub lon: Option<(f64, f64)>,
    /// Latitude axis limits; derived from the data when unset
    pub lat: Option<(f64, f64)>,
}

/// Renders the overlay map to a bitmap file at `path`.
pub fn plot_overlay(
    path: impl AsRef<Path>,
    label: &str,
    clim: (f64, f64),
    cells: &[GridCell],
    obs: &[DotObs],
    config: &OverlayConfig,
) -> Result<()> {
    let path = path.as_ref();
    let root = BitMapBackend::new(path, (900, 900)).into_drawing_area();
    draw_overlay(&root, label, clim, cells, obs, config)?;
    root.present()
        .map_err(|e| anyhow!("failed to write chart: {e}"))?;
    info!("wrote overlay map {}", path.display());
    Ok(())
}

/// Draws onto an existing drawing area. Split out so tests can render
/// into an in-memory SVG backend.
pub fn draw_overlay<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    label: &str,
    clim: (f64, f64),
    cells: &[GridCell],
    obs: &[DotObs],
    config: &OverlayConfig,
) -> Result<()> {
    let (c_min, c_max) = clim;
    if !(c_max > c_min) {
        bail!("color limits must be increasing: {c_min} >= {c_max}");
    }
    root.fill(&WHITE)
        .map_err(|e| anyhow!("failed to fill chart background: {e}"))?;

    // map above, horizontal colorbar below
    let bar_height = 70i32;
    let split_at = root.dim_in_pixel().1 as i32 - bar_height;
    let (upper, lower) = root.split_vertically(split_at);

    let (lon, lat) = extent(cells, obs, config);
    let mut map_builder = ChartBuilder::on(&upper);
    map_builder
        .margin(20i32)
        .x_label_area_size(30u32)
        .y_label_area_size(50u32);
    if let Some(title) = &config.title {
        map_builder.caption(title, ("sans-serif", 22));
    }
    let mut map = map_builder
        .build_cartesian_2d(lon.0..lon.1, lat.0..lat.1)
        .map_err(|e| anyhow!("failed to build map axes: {e}"))?;
    map.configure_mesh()
        .draw()
        .map_err(|e| anyhow!("failed to draw map mesh: {e}"))?;

    map.draw_series(cells.iter().map(|cell| {
        let color = ViridisRGB.get_color_normalized(cell.value.clamp(c_min, c_max), c_min, c_max);
        Polygon::new(cell.vertices.clone(), color.filled())
    }))
    .map_err(|e| anyhow!("failed to draw model cells: {e}"))?;

    // dots share the cell color scale, with a thin outline to stand out
    map.draw_series(obs.iter().map(|o| {
        let color = ViridisRGB.get_color_normalized(o.value.clamp(c_min, c_max), c_min, c_max);
        Circle::new((o.x, o.y), 3, color.filled())
    }))
    .map_err(|e| anyhow!("failed to draw observation dots: {e}"))?;
    map.draw_series(
        obs.iter()
            .map(|o| Circle::new((o.x, o.y), 3, BLACK.stroke_width(1))),
    )
    .map_err(|e| anyhow!("failed to draw dot outlines: {e}"))?;

    draw_colorbar(&lower, label, clim)
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    label: &str,
    (c_min, c_max): (f64, f64),
) -> Result<()> {
    let mut bar = ChartBuilder::on(area)
        .margin_left(70i32)
        .margin_right(30i32)
        .margin_bottom(5i32)
        .x_label_area_size(35u32)
        .build_cartesian_2d(c_min..c_max, 0.0..1.0)
        .map_err(|e| anyhow!("failed to build colorbar axes: {e}"))?;
    bar.configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_desc(label)
        .draw()
        .map_err(|e| anyhow!("failed to draw colorbar axis: {e}"))?;

    let steps = 100;
    let width = (c_max - c_min) / steps as f64;
    bar.draw_series((0..steps).map(|i| {
        let v0 = c_min + width * i as f64;
        let color = ViridisRGB.get_color_normalized(v0, c_min, c_max);
        Rectangle::new([(v0, 0.0), (v0 + width, 1.0)], color.filled())
    }))
    .map_err(|e| anyhow!("failed to draw colorbar gradient: {e}"))?;
    Ok(())
}

/// Axis limits from the configuration, or bounds of the drawn data.
fn extent(
    cells: &[GridCell],
    obs: &[DotObs],
    config: &OverlayConfig,
) -> ((f64, f64), (f64, f64)) {
    let points = cells
        .iter()
        .flat_map(|c| c.vertices.iter().copied())
        .chain(obs.iter().map(|o| (o.x, o.y)));

    let mut bounds: Option<((f64, f64), (f64, f64))> = None;
    for (x, y) in points {
        bounds = Some(match bounds {
            None => ((x, x), (y, y)),
            Some(((x_lo, x_hi), (y_lo, y_hi))) => {
                ((x_lo.min(x), x_hi.max(x)), (y_lo.min(y), y_hi.max(y)))
            }
        });
    }
    let ((x_lo, x_hi), (y_lo, y_hi)) = bounds.unwrap_or(((0.0, 1.0), (0.0, 1.0)));
    let lon = config.lon.unwrap_or(if x_lo < x_hi {
        (x_lo, x_hi)
    } else {
        (x_lo - 0.5, x_lo + 0.5)
    });
    let lat = config.lat.unwrap_or(if y_lo < y_hi {
        (y_lo, y_hi)
    } else {
        (y_lo - 0.5, y_lo + 0.5)
    });
    (lon, lat)
}

#[cfg(test)]
mod test {
    use super::*;

    fn square(x: f64, y: f64, value: f64) -> GridCell {
        GridCell {
            vertices: vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0)],
            value,
        }
    }

    #[test]
    fn test_draws_cells_and_dots() {
        let cells = vec![square(4.0, 52.0, 0.2), square(5.0, 52.0, 0.8)];
        let obs = vec![DotObs {
            x: 4.5,
            y: 52.5,
            value: 0.4,
        }];
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (900, 900)).into_drawing_area();
            draw_overlay(
                &root,
                "DIN [mg/l]",
                (0.0, 1.0),
                &cells,
                &obs,
                &OverlayConfig {
                    title: Some("2021".to_string()),
                    lon: Some((3.0, 7.0)),
                    lat: Some((51.0, 54.0)),
                },
            )
            .unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polygon"));
    }

    #[test]
    fn test_rejects_degenerate_color_limits() {
        let mut svg = String::new();
        let root = SVGBackend::with_string(&mut svg, (900, 900)).into_drawing_area();
        let result = draw_overlay(&root, "DIN", (1.0, 1.0), &[], &[], &OverlayConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_extent_derived_from_data_when_unset() {
        let cells = vec![square(4.0, 52.0, 0.2)];
        let (lon, lat) = extent(&cells, &[], &OverlayConfig::default());
        assert_eq!(lon, (4.0, 5.0));
        assert_eq!(lat, (52.0, 53.0));
    }
}

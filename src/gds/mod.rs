use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gds21::GdsLibrary;
use log::{debug, info};
use plotters::prelude::*;

use error::{GdsSvgError, Result};
pub use flatten::{find_cell, flatten, Polygon, Transform};

pub mod error;
pub mod flatten;

/// Default number of pixels per user unit (typically one micron).
pub const DEFAULT_SCALE: f64 = 50.0;

/// Largest side of a generated image, in pixels.
pub const MAX_SIDE: u32 = 8192;

/// Reads a GDSII file, mapping reader errors into [`GdsSvgError::Gds`].
pub fn read_gds(path: impl AsRef<Path>) -> Result<GdsLibrary> {
    GdsLibrary::open(path).map_err(|e| GdsSvgError::Gds(e.to_string()))
}

/// Default output path for an SVG of `cell`.
pub fn default_output(cell: &str) -> PathBuf {
    PathBuf::from(format!("{cell}.svg"))
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Bbox {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Bbox {
    fn of(polygons: &[Polygon]) -> Option<Self> {
        polygons
            .iter()
            .flat_map(|p| p.points.iter())
            .fold(None, |acc, &(x, y)| {
                Some(match acc {
                    None => Bbox {
                        x0: x,
                        y0: y,
                        x1: x,
                        y1: y,
                    },
                    Some(b) => Bbox {
                        x0: b.x0.min(x),
                        y0: b.y0.min(y),
                        x1: b.x1.max(x),
                        y1: b.y1.max(y),
                    },
                })
            })
    }

    fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Pixels per database unit, given the requested pixels per user unit.
///
/// Shrinks the scale so that neither side of the image exceeds [`MAX_SIDE`].
fn pixel_scale(bbox: &Bbox, user_per_db: f64, scale: f64) -> f64 {
    let px_per_db = scale * user_per_db;
    let longest = bbox.width().max(bbox.height()) * px_per_db;
    if longest > MAX_SIDE as f64 {
        px_per_db * MAX_SIDE as f64 / longest
    } else {
        px_per_db
    }
}

/// Writes polygons to an SVG, one palette color per layer.
///
/// Returns the image size in pixels.
pub fn write_svg(
    polygons: &[Polygon],
    user_per_db: f64,
    scale: f64,
    output: impl AsRef<Path>,
) -> Result<(u32, u32)> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GdsSvgError::Scale(scale));
    }
    let bbox = Bbox::of(polygons).ok_or_else(|| GdsSvgError::EmptyCell(String::new()))?;
    let k = pixel_scale(&bbox, user_per_db, scale);
    let size = (
        ((bbox.width() * k).ceil() as u32).clamp(1, MAX_SIDE),
        ((bbox.height() * k).ceil() as u32).clamp(1, MAX_SIDE),
    );

    let mut layers: BTreeMap<(i16, i16), Vec<&Polygon>> = BTreeMap::new();
    for polygon in polygons {
        layers
            .entry((polygon.layer, polygon.datatype))
            .or_default()
            .push(polygon);
    }

    let draw_err = |e: plotters::drawing::DrawingAreaErrorKind<_>| GdsSvgError::Draw(e.to_string());
    let root = SVGBackend::new(output.as_ref(), size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    for (i, ((layer, datatype), polys)) in layers.into_iter().enumerate() {
        debug!("drawing {} polygons on {layer}/{datatype}", polys.len());
        let style = Palette99::pick(i).mix(0.6).filled();
        for polygon in polys {
            let points = polygon
                .points
                .iter()
                .map(|&(x, y)| {
                    (
                        ((x - bbox.x0) * k).round() as i32,
                        ((bbox.y1 - y) * k).round() as i32,
                    )
                })
                .collect::<Vec<_>>();
            root.draw(&plotters::element::Polygon::new(points, style))
                .map_err(draw_err)?;
        }
    }
    root.present().map_err(draw_err)?;
    Ok(size)
}

/// Converts `cell` of the GDSII file `input` to an SVG at `output`.
///
/// `scale` is in pixels per user unit.
pub fn gds2svg(
    input: impl AsRef<Path>,
    cell: &str,
    output: impl AsRef<Path>,
    scale: f64,
) -> Result<PathBuf> {
    let input = input.as_ref();
    let output = output.as_ref();
    info!("gds2svg {:?} > {:?}", input, output);

    let lib = read_gds(input)?;
    let polygons = flatten(&lib, cell)?;
    if polygons.is_empty() {
        return Err(GdsSvgError::EmptyCell(cell.to_string()));
    }
    let (w, h) = write_svg(&polygons, lib.units.0, scale, output)?;
    info!("wrote {w}x{h} image of `{cell}`");
    Ok(output.to_owned())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use gds21::{GdsBoundary, GdsElement, GdsPoint, GdsStruct, GdsStructRef};

    use super::*;

    fn library() -> GdsLibrary {
        let mut lib = GdsLibrary::new("sram22");
        let mut cell = GdsStruct::new("sram_sp_cell");
        cell.elems.push(GdsElement::GdsBoundary(GdsBoundary {
            layer: 66,
            datatype: 20,
            xy: vec![
                GdsPoint::new(0, 0),
                GdsPoint::new(1200, 0),
                GdsPoint::new(1200, 1580),
                GdsPoint::new(0, 1580),
                GdsPoint::new(0, 0),
            ],
            ..Default::default()
        }));
        let mut array = GdsStruct::new("array");
        array.elems.push(GdsElement::GdsStructRef(GdsStructRef {
            name: "sram_sp_cell".to_string(),
            ..Default::default()
        }));
        lib.structs.push(cell);
        lib.structs.push(array);
        lib.structs.push(GdsStruct::new("empty"));
        lib
    }

    #[test]
    fn test_pixel_scale_clamped() {
        let bbox = Bbox {
            x0: 0.0,
            y0: 0.0,
            x1: 1e6,
            y1: 10.0,
        };
        let k = pixel_scale(&bbox, 1e-3, 50.0);
        assert_eq!((bbox.width() * k).round() as u32, MAX_SIDE);
        assert_relative_eq!(pixel_scale(&bbox, 1e-3, 0.001), 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn test_gds2svg() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("cells.gds");
        library()
            .save(&input)
            .map_err(|e| GdsSvgError::Gds(e.to_string()))?;

        let output = dir.path().join("array.svg");
        let path = gds2svg(&input, "array", &output, DEFAULT_SCALE)?;
        assert_eq!(path, output);
        let svg = std::fs::read_to_string(&output)?;
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polygon"));
        Ok(())
    }

    #[test]
    fn test_gds2svg_errors() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("cells.gds");
        library()
            .save(&input)
            .map_err(|e| GdsSvgError::Gds(e.to_string()))?;
        let output = dir.path().join("out.svg");

        assert!(matches!(
            gds2svg(&input, "empty", &output, DEFAULT_SCALE),
            Err(GdsSvgError::EmptyCell(_))
        ));
        assert!(matches!(
            gds2svg(&input, "bitcell", &output, DEFAULT_SCALE),
            Err(GdsSvgError::UnknownCell(_))
        ));
        assert!(matches!(
            gds2svg(&input, "array", &output, -1.0),
            Err(GdsSvgError::Scale(_))
        ));
        assert!(matches!(
            gds2svg(dir.path().join("missing.gds"), "array", &output, DEFAULT_SCALE),
            Err(GdsSvgError::Gds(_))
        ));
        Ok(())
    }
}

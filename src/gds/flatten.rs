use std::collections::HashMap;

use gds21::{GdsArrayRef, GdsElement, GdsLibrary, GdsPath, GdsPoint, GdsStrans, GdsStruct};
use log::debug;

use super::error::{GdsSvgError, Result};

/// Maximum depth of cell references followed while flattening.
pub const MAX_DEPTH: usize = 64;

/// A polygon on a single layer, in database units of the top cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub layer: i16,
    pub datatype: i16,
    pub points: Vec<(f64, f64)>,
}

/// An affine transform `p' = M p + t`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    tx: f64,
    ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Placement of a reference at `origin`.
    ///
    /// Reflection about the x axis is applied first, then magnification,
    /// then counter-clockwise rotation, then translation.
    pub fn from_strans(origin: (f64, f64), strans: Option<&GdsStrans>) -> Self {
        let (reflected, mag, angle) = match strans {
            Some(s) => (s.reflected, s.mag.unwrap_or(1.0), s.angle.unwrap_or(0.0)),
            None => (false, 1.0, 0.0),
        };
        let r = if reflected { -1.0 } else { 1.0 };
        let (sin, cos) = angle.to_radians().sin_cos();
        Self {
            a: mag * cos,
            b: -mag * sin * r,
            c: mag * sin,
            d: mag * cos * r,
            tx: origin.0,
            ty: origin.1,
        }
    }

    #[inline]
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    /// Returns the transform that applies `inner` and then `self`.
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            a: self.a * inner.a + self.b * inner.c,
            b: self.a * inner.b + self.b * inner.d,
            c: self.c * inner.a + self.d * inner.c,
            d: self.c * inner.b + self.d * inner.d,
            tx: self.a * inner.tx + self.b * inner.ty + self.tx,
            ty: self.c * inner.tx + self.d * inner.ty + self.ty,
        }
    }
}

#[inline]
fn point(p: &GdsPoint) -> (f64, f64) {
    (p.x as f64, p.y as f64)
}

/// Finds the struct named `name`, logging each struct scanned.
pub fn find_cell<'a>(lib: &'a GdsLibrary, name: &str) -> Result<&'a GdsStruct> {
    for s in lib.structs.iter() {
        debug!("scanning cell `{}`", s.name);
        if s.name == name {
            return Ok(s);
        }
    }
    Err(GdsSvgError::UnknownCell(name.to_string()))
}

/// Collects every polygon drawn by `cell` and the cells it references.
///
/// Text elements and nodes carry no area and are skipped.
pub fn flatten(lib: &GdsLibrary, cell: &str) -> Result<Vec<Polygon>> {
    let top = find_cell(lib, cell)?;
    let structs = lib
        .structs
        .iter()
        .map(|s| (s.name.as_str(), s))
        .collect::<HashMap<_, _>>();

    let mut flattener = Flattener {
        structs,
        top: cell,
        polygons: Vec::new(),
    };
    flattener.visit(top, &Transform::identity(), 0)?;
    Ok(flattener.polygons)
}

struct Flattener<'a> {
    structs: HashMap<&'a str, &'a GdsStruct>,
    top: &'a str,
    polygons: Vec<Polygon>,
}

impl<'a> Flattener<'a> {
    fn lookup(&self, parent: &GdsStruct, name: &str) -> Result<&'a GdsStruct> {
        self.structs
            .get(name)
            .copied()
            .ok_or_else(|| GdsSvgError::UnknownReference {
                parent: parent.name.clone(),
                cell: name.to_string(),
            })
    }

    fn push(&mut self, layer: i16, datatype: i16, xf: &Transform, pts: &[GdsPoint]) {
        if pts.len() < 3 {
            return;
        }
        self.polygons.push(Polygon {
            layer,
            datatype,
            points: pts.iter().map(|p| xf.apply(point(p))).collect(),
        });
    }

    fn visit(&mut self, s: &GdsStruct, xf: &Transform, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(GdsSvgError::RecursionLimit(self.top.to_string()));
        }

        for elem in s.elems.iter() {
            match elem {
                GdsElement::GdsBoundary(b) => self.push(b.layer, b.datatype, xf, &b.xy),
                GdsElement::GdsBox(b) => self.push(b.layer, b.boxtype, xf, &b.xy),
                GdsElement::GdsPath(p) => {
                    for quad in expand_path(p) {
                        self.polygons.push(Polygon {
                            layer: p.layer,
                            datatype: p.datatype,
                            points: quad.iter().map(|&q| xf.apply(q)).collect(),
                        });
                    }
                }
                GdsElement::GdsStructRef(r) => {
                    let child = self.lookup(s, &r.name)?;
                    let placement = Transform::from_strans(point(&r.xy), r.strans.as_ref());
                    self.visit(child, &xf.then(&placement), depth + 1)?;
                }
                GdsElement::GdsArrayRef(r) => {
                    let child = self.lookup(s, &r.name)?;
                    for origin in array_origins(r) {
                        let placement = Transform::from_strans(origin, r.strans.as_ref());
                        self.visit(child, &xf.then(&placement), depth + 1)?;
                    }
                }
                GdsElement::GdsTextElem(_) | GdsElement::GdsNode(_) => {}
            }
        }
        Ok(())
    }
}

/// Origins of each instance of an array reference.
///
/// The second and third points of the reference sit `cols` column pitches
/// and `rows` row pitches away from the first.
fn array_origins(r: &GdsArrayRef) -> Vec<(f64, f64)> {
    let cols = r.cols.max(1) as usize;
    let rows = r.rows.max(1) as usize;
    let p0 = point(&r.xy[0]);
    let col_end = point(&r.xy[1]);
    let row_end = point(&r.xy[2]);
    let col_step = (
        (col_end.0 - p0.0) / cols as f64,
        (col_end.1 - p0.1) / cols as f64,
    );
    let row_step = (
        (row_end.0 - p0.0) / rows as f64,
        (row_end.1 - p0.1) / rows as f64,
    );

    let mut origins = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let (c, r) = (col as f64, row as f64);
            origins.push((
                p0.0 + c * col_step.0 + r * row_step.0,
                p0.1 + c * col_step.1 + r * row_step.1,
            ));
        }
    }
    origins
}

/// Expands a path into one quadrilateral per segment.
///
/// Interior joints are extended by half the width so that bends are
/// covered. Path type 2 extends both ends by half the width, and path
/// type 4 uses the explicit begin and end extensions. Round ends (type 1)
/// are drawn square.
fn expand_path(p: &GdsPath) -> Vec<[(f64, f64); 4]> {
    let width = p.width.unwrap_or(0).unsigned_abs() as f64;
    if width == 0.0 || p.xy.len() < 2 {
        return Vec::new();
    }
    let hw = width / 2.0;
    let (begin, end) = match p.path_type.unwrap_or(0) {
        1 | 2 => (hw, hw),
        4 => (
            p.begin_extn.unwrap_or(0) as f64,
            p.end_extn.unwrap_or(0) as f64,
        ),
        _ => (0.0, 0.0),
    };

    let n = p.xy.len() - 1;
    let mut quads = Vec::with_capacity(n);
    for (i, seg) in p.xy.windows(2).enumerate() {
        let (x0, y0) = point(&seg[0]);
        let (x1, y1) = point(&seg[1]);
        let len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        if len == 0.0 {
            continue;
        }
        let (ux, uy) = ((x1 - x0) / len, (y1 - y0) / len);
        let ext0 = if i == 0 { begin } else { hw };
        let ext1 = if i == n - 1 { end } else { hw };

        let (sx, sy) = (x0 - ux * ext0, y0 - uy * ext0);
        let (ex, ey) = (x1 + ux * ext1, y1 + uy * ext1);
        let (nx, ny) = (-uy * hw, ux * hw);
        quads.push([
            (sx + nx, sy + ny),
            (ex + nx, ey + ny),
            (ex - nx, ey - ny),
            (sx - nx, sy - ny),
        ]);
    }
    quads
}

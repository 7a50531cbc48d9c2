//! Point location on the horizontal projection of a triangulated surface
//!
//! A point is located by its barycentric coordinates against each triangle's
//! (x, z) footprint. The linear scan is the reference behavior; `GridIndex`
//! narrows the scan to triangles whose footprint overlaps the point's cell
//! while keeping the same "first triangle in enumeration order" answer.

use glam::{Vec2, Vec3};

use super::bounds::Bounds;

/// Cells per axis never exceed this, whatever the triangle count
const MAX_GRID_CELLS: usize = 256;

/// Barycentric coordinates `(u, v, w)` of `pt` relative to triangle `(p1, p2, p3)`
///
/// `u` weights `p1`, `v` weights `p2`, `w` weights `p3`. The three always sum
/// to 1 for a non-degenerate triangle, whichever way it is wound. A zero-area
/// triangle yields NaN weights; use [`is_inside`] rather than comparing
/// components directly.
pub fn barycentric(p1: Vec2, p2: Vec2, p3: Vec2, pt: Vec2) -> Vec3 {
    let area = (p2 - p1).perp_dot(p3 - p1);
    if area == 0.0 {
        return Vec3::NAN;
    }

    let u = (p2 - pt).perp_dot(p3 - pt) / area;
    let v = (p3 - pt).perp_dot(p1 - pt) / area;
    let w = (p1 - pt).perp_dot(p2 - pt) / area;
    Vec3::new(u, v, w)
}

/// Whether barycentric weights place the point on or inside the triangle
///
/// Non-finite weights (degenerate triangle) count as outside.
#[inline]
pub fn is_inside(weights: Vec3) -> bool {
    weights.is_finite() && weights.cmpge(Vec3::ZERO).all()
}

/// A successful point-location query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Triangle index (position in the triangle list divided by 3)
    pub triangle: usize,
    /// Barycentric weights of the query point in that triangle
    pub weights: Vec3,
}

/// Linear scan: first footprint in `footprints` containing `pt`
pub fn locate_linear<I>(footprints: I, pt: Vec2) -> Option<SurfaceHit>
where
    I: IntoIterator<Item = [Vec2; 3]>,
{
    footprints
        .into_iter()
        .enumerate()
        .find_map(|(triangle, [a, b, c])| {
            let weights = barycentric(a, b, c, pt);
            is_inside(weights).then_some(SurfaceHit { triangle, weights })
        })
}

/// Uniform grid over the surface bounds bucketing triangle footprints
///
/// Each cell lists, in ascending order, every triangle whose (slightly padded)
/// bounding box overlaps it.
#[derive(Debug, Clone)]
pub struct GridIndex {
    bounds: Bounds,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl GridIndex {
    /// Bucket `footprints` into a grid sized from the triangle count
    pub fn build(footprints: &[[Vec2; 3]], bounds: Bounds) -> Self {
        let side = (footprints.len() as f32).sqrt().ceil() as usize;
        let side = side.clamp(1, MAX_GRID_CELLS);
        let pad = bounds.extent().max_element().max(1.0) * 1e-4;
        let bounds = bounds.expanded(pad);

        let mut index = Self {
            bounds,
            cols: side,
            rows: side,
            cells: vec![Vec::new(); side * side],
        };

        for (i, tri) in footprints.iter().enumerate() {
            let min = tri[0].min(tri[1]).min(tri[2]) - Vec2::splat(pad);
            let max = tri[0].max(tri[1]).max(tri[2]) + Vec2::splat(pad);
            let (c0, r0) = index.cell_of(min);
            let (c1, r1) = index.cell_of(max);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    index.cells[row * index.cols + col].push(i as u32);
                }
            }
        }

        index
    }

    /// Triangles worth testing for `pt`, in ascending order
    pub fn candidates(&self, pt: Vec2) -> &[u32] {
        if !self.bounds.contains(pt) {
            return &[];
        }
        let (col, row) = self.cell_of(pt);
        &self.cells[row * self.cols + col]
    }

    /// Number of cells along x and z
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let extent = self.bounds.extent();
        let rel = p - self.bounds.min;
        (
            axis_cell(rel.x, extent.x, self.cols),
            axis_cell(rel.y, extent.y, self.rows),
        )
    }
}

fn axis_cell(offset: f32, extent: f32, cells: usize) -> usize {
    if extent <= 0.0 || !offset.is_finite() {
        return 0;
    }
    let cell = (offset / extent * cells as f32).floor();
    (cell.max(0.0) as usize).min(cells - 1)
}

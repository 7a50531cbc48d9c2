//! Triangulated height field
//!
//! Vertices are (x, y = height, z). Triangles are index triples into the
//! vertex list; winding is not assumed consistent, so normals are derived per
//! query from the stored edge order.

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::locate::{GridIndex, SurfaceHit, barycentric, is_inside, locate_linear};
use crate::error::{SimError, SimResult};
use crate::ground;

/// One facet of the surface, in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    /// Projection onto the horizontal (x, z) plane
    #[inline]
    pub fn footprint(&self) -> [Vec2; 3] {
        [ground(self.a), ground(self.b), ground(self.c)]
    }

    /// Unit normal from the edge order (not flipped to point up)
    ///
    /// Zero for a degenerate triangle.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalize_or_zero()
    }

    /// Interpolated height for barycentric weights over (a, b, c)
    #[inline]
    pub fn height_at(&self, weights: Vec3) -> f32 {
        weights.dot(Vec3::new(self.a.y, self.b.y, self.c.y))
    }
}

/// Raw vertex/triangle lists as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceData {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
}

/// Immutable triangulated surface with cached bounds and point-location index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SurfaceData", into = "SurfaceData")]
pub struct TriangulatedSurface {
    vertices: Vec<Vec3>,
    triangles: Vec<u32>,
    bounds: Bounds,
    index: GridIndex,
}

impl TryFrom<SurfaceData> for TriangulatedSurface {
    type Error = SimError;

    fn try_from(data: SurfaceData) -> SimResult<Self> {
        Self::new(data.vertices, data.triangles)
    }
}

impl From<TriangulatedSurface> for SurfaceData {
    fn from(surface: TriangulatedSurface) -> Self {
        Self {
            vertices: surface.vertices,
            triangles: surface.triangles,
        }
    }
}

impl TriangulatedSurface {
    /// Validate the lists and build bounds and index
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<u32>) -> SimResult<Self> {
        if vertices.is_empty() || triangles.is_empty() {
            return Err(SimError::EmptySurface);
        }
        if triangles.len() % 3 != 0 {
            return Err(SimError::TriangleListLength(triangles.len()));
        }
        if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(SimError::NonFiniteVertex(i));
        }
        if let Some(&index) = triangles.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(SimError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let bounds = Bounds::of_points(&vertices).ok_or(SimError::EmptySurface)?;
        let footprints: Vec<[Vec2; 3]> = triangles
            .chunks_exact(3)
            .map(|t| {
                [
                    ground(vertices[t[0] as usize]),
                    ground(vertices[t[1] as usize]),
                    ground(vertices[t[2] as usize]),
                ]
            })
            .collect();
        let index = GridIndex::build(&footprints, bounds);

        log::info!(
            "Surface built: {} vertices, {} triangles, x {}..{}, z {}..{}, grid {:?}",
            vertices.len(),
            footprints.len(),
            bounds.min.x,
            bounds.max.x,
            bounds.min.y,
            bounds.max.y,
            index.dimensions(),
        );

        Ok(Self {
            vertices,
            triangles,
            bounds,
            index,
        })
    }

    /// Read a `{ "vertices": [...], "triangles": [...] }` JSON file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let surface = serde_json::from_str(&json)?;
        Ok(surface)
    }

    /// Small four-facet test terrain, 0.8 x 0.4 footprint
    pub fn sample_terrain() -> Self {
        let vertices = vec![
            Vec3::new(0.0, 0.097, 0.0),
            Vec3::new(0.4, 0.005, 0.0),
            Vec3::new(0.0, 0.005, 0.4),
            Vec3::new(0.4, 0.075, 0.4),
            Vec3::new(0.8, 0.007, 0.4),
            Vec3::new(0.8, 0.039, 0.0),
        ];
        let triangles = vec![2, 1, 0, 2, 3, 1, 4, 1, 3, 1, 4, 5];
        // Fixed data, always valid
        Self::new(vertices, triangles).unwrap_or_else(|e| unreachable!("sample terrain: {e}"))
    }

    /// Regular height grid, two triangles per cell
    ///
    /// `heights` is row-major: `heights[row * cols + col]` sits at
    /// `origin + (col, row) * spacing` on the (x, z) plane.
    pub fn from_height_grid(
        origin: Vec2,
        spacing: f32,
        cols: usize,
        rows: usize,
        heights: &[f32],
    ) -> SimResult<Self> {
        if cols < 2 || rows < 2 {
            return Err(SimError::invalid_grid(format!(
                "{cols}x{rows} grid needs at least 2x2 points"
            )));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(SimError::invalid_grid(format!("spacing {spacing} must be > 0")));
        }
        if heights.len() != cols * rows {
            return Err(SimError::invalid_grid(format!(
                "{cols}x{rows} grid needs {} heights, got {}",
                cols * rows,
                heights.len()
            )));
        }

        let vertices = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let col = (i % cols) as f32;
                let row = (i / cols) as f32;
                Vec3::new(origin.x + col * spacing, h, origin.y + row * spacing)
            })
            .collect();

        let mut triangles = Vec::with_capacity((cols - 1) * (rows - 1) * 6);
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let i0 = (row * cols + col) as u32;
                let i1 = i0 + 1;
                let i2 = i0 + cols as u32;
                let i3 = i2 + 1;
                triangles.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        Self::new(vertices, triangles)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangle_indices(&self) -> &[u32] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Horizontal extent over all vertices, computed at construction
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Triangle `i` in world coordinates
    ///
    /// Panics if `i >= triangle_count()`.
    pub fn triangle(&self, i: usize) -> Triangle {
        let t = &self.triangles[i * 3..i * 3 + 3];
        Triangle {
            a: self.vertices[t[0] as usize],
            b: self.vertices[t[1] as usize],
            c: self.vertices[t[2] as usize],
        }
    }

    pub fn iter_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.triangle_count()).map(|i| self.triangle(i))
    }

    /// First triangle (in list order) whose footprint contains `p`
    pub fn locate(&self, p: Vec2) -> Option<SurfaceHit> {
        self.index.candidates(p).iter().find_map(|&i| {
            let [a, b, c] = self.triangle(i as usize).footprint();
            let weights = barycentric(a, b, c, p);
            is_inside(weights).then_some(SurfaceHit {
                triangle: i as usize,
                weights,
            })
        })
    }

    /// Same answer as [`locate`](Self::locate), scanning every triangle
    pub fn locate_linear(&self, p: Vec2) -> Option<SurfaceHit> {
        locate_linear(self.iter_triangles().map(|t| t.footprint()), p)
    }

    /// Surface height under `p`, or 0 when no triangle contains it
    pub fn height_at(&self, p: Vec2) -> f32 {
        self.locate(p)
            .map(|hit| self.triangle(hit.triangle).height_at(hit.weights))
            .unwrap_or(0.0)
    }
}

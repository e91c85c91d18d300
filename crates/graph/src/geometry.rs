use crate::graph::GraphError;

/// A flat rectangle in the XY plane, subdivided into a vertex grid.
///
/// Vertices are laid out row by row starting at the top edge (`+height / 2`),
/// left to right within a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            width,
            height,
            width_segments,
            height_segments,
        }
    }

    /// Segment counts with zero treated as one.
    pub fn segments(&self) -> (u32, u32) {
        (self.width_segments.max(1), self.height_segments.max(1))
    }

    /// Vertex count of the grid, saturating at `usize::MAX`.
    pub fn vertex_count(&self) -> usize {
        let (sx, sy) = self.segments();
        let count = (u64::from(sx) + 1).saturating_mul(u64::from(sy) + 1);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn positions(&self) -> Vec<[f32; 3]> {
        let (sx, sy) = self.segments();
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let seg_w = self.width / sx as f32;
        let seg_h = self.height / sy as f32;

        let mut out = Vec::with_capacity(self.vertex_count());
        for iy in 0..=sy {
            let y = iy as f32 * seg_h - half_h;
            for ix in 0..=sx {
                let x = ix as f32 * seg_w - half_w;
                out.push([x, -y, 0.0]);
            }
        }
        out
    }

    /// Positions plus grid-line indices, ready to draw as line segments.
    pub fn to_line_grid(&self) -> Result<BufferGeometry, GraphError> {
        let indices = to_grid(self)?;
        Ok(BufferGeometry::new(self.positions()).with_indices(indices))
    }
}

/// Line-list indices that draw a plane's vertex grid as a wireframe lattice.
///
/// Each row contributes its horizontal edges; vertical edges connect a vertex
/// to the one directly below it. The final vertex never starts a vertical edge.
/// Fails when the grid has more vertices than `u32` indices can address.
pub fn to_grid(plane: &PlaneGeometry) -> Result<Vec<u32>, GraphError> {
    let (sx, sy) = plane.segments();
    let row = u64::from(sx) + 1;
    let count = row
        .checked_mul(u64::from(sy) + 1)
        .filter(|&count| count <= u64::from(u32::MAX) + 1)
        .ok_or(GraphError::GridTooLarge {
            width_segments: sx,
            height_segments: sy,
        })?;
    let last = count - 1;

    // Every pushed index is at most `last`, which fits in u32.
    let mut indices = Vec::new();
    let mut edge = |a: u64, b: u64| indices.extend_from_slice(&[a as u32, b as u32]);
    for i in 0..=u64::from(sy) {
        let mut right = 0;
        for j in 0..u64::from(sx) {
            let left = row * i + j;
            right = left + 1;
            let below = left + row;
            edge(left, right);
            if below < last {
                edge(left, below);
            }
        }
        if right + row <= last {
            edge(right, right + row);
        }
    }
    Ok(indices)
}

/// Raw vertex data with optional per-vertex colors and an optional index list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferGeometry {
    pub positions: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
}

impl BufferGeometry {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            colors: None,
            indices: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Axis-aligned box centred on the origin, as a triangle list.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        #[rustfmt::skip]
        let positions = vec![
            [-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z],
            [-x, -y, -z], [ x, -y, -z], [ x,  y, -z], [-x,  y, -z],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0, // +Z
            5, 4, 7, 7, 6, 5, // -Z
            1, 5, 6, 6, 2, 1, // +X
            4, 0, 3, 3, 7, 4, // -X
            3, 2, 6, 6, 7, 3, // +Y
            4, 5, 1, 1, 0, 4, // -Y
        ];
        Self::new(positions).with_indices(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_grid_is_an_outline() {
        let plane = PlaneGeometry::new(1.0, 1.0, 1, 1);
        assert_eq!(to_grid(&plane).unwrap(), vec![0, 1, 0, 2, 1, 3, 2, 3]);
    }

    #[test]
    fn grid_indices_stay_in_bounds() {
        let plane = PlaneGeometry::new(15.0, 4.0, 288, 72);
        let indices = to_grid(&plane).unwrap();
        let count = plane.vertex_count() as u32;
        assert_eq!(indices.len() % 2, 0);
        assert!(indices.iter().all(|&i| i < count));
    }

    #[test]
    fn oversized_grid_is_rejected_without_overflow() {
        let wide = PlaneGeometry::new(1.0, 1.0, u32::MAX, 1);
        assert_eq!(wide.vertex_count(), (1usize << 32) * 2);
        assert_eq!(
            to_grid(&wide),
            Err(GraphError::GridTooLarge {
                width_segments: u32::MAX,
                height_segments: 1,
            })
        );

        let huge = PlaneGeometry::new(1.0, 1.0, u32::MAX, u32::MAX);
        assert_eq!(huge.vertex_count(), usize::MAX);
        assert!(to_grid(&huge).is_err());
        assert!(PlaneGeometry::new(1.0, 1.0, 70_000, 70_000).to_line_grid().is_err());
    }

    #[test]
    fn zero_segments_behave_as_one() {
        let zero = PlaneGeometry::new(2.0, 2.0, 0, 0);
        let one = PlaneGeometry::new(2.0, 2.0, 1, 1);
        assert_eq!(to_grid(&zero).unwrap(), to_grid(&one).unwrap());
        assert_eq!(zero.vertex_count(), 4);
    }

    #[test]
    fn plane_positions_start_top_left() {
        let plane = PlaneGeometry::new(2.0, 4.0, 2, 2);
        let positions = plane.positions();
        assert_eq!(positions.len(), 9);
        assert_eq!(positions[0], [-1.0, 2.0, 0.0]);
        assert_eq!(positions[8], [1.0, -2.0, 0.0]);
    }

    #[test]
    fn line_grid_carries_indices() {
        let grid = PlaneGeometry::new(1.0, 1.0, 3, 2).to_line_grid().unwrap();
        assert_eq!(grid.vertex_count(), 12);
        assert!(grid.indices.is_some());
    }

    #[test]
    fn cuboid_has_twelve_triangles() {
        let cube = BufferGeometry::cuboid(0.1, 0.1, 0.1);
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.indices.unwrap().len(), 36);
    }
}
